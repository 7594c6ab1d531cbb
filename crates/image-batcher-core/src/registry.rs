//! A reuse pool of controllers for concurrent traversal.
//!
//! Workers `acquire` a controller, use it for one item, and the guard resets
//! it and hands it back when dropped.

use crossbeam::queue::SegQueue;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::agent::ExecutionAgent;
use crate::controller::{Controller, SharedControllerInfo};

type Factory<A> = Box<dyn Fn() -> Controller<A> + Send + Sync>;

pub struct ControllerRegistry<A> {
    factory: Factory<A>,
    idle: SegQueue<Controller<A>>,
    created: AtomicUsize,
}

impl<A: ExecutionAgent + 'static> ControllerRegistry<A> {
    /// A registry whose controllers all share `shared`
    pub fn for_shared(shared: Arc<SharedControllerInfo<A>>) -> Self {
        Self::new(move || Controller::new(Arc::clone(&shared)))
    }
}

impl<A: ExecutionAgent> ControllerRegistry<A> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Controller<A> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            idle: SegQueue::new(),
            created: AtomicUsize::new(0),
        }
    }

    /// Take an idle controller, or build one if none is free
    pub fn acquire(&self) -> PooledController<'_, A> {
        let controller = self.idle.pop().unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            (self.factory)()
        });

        PooledController {
            registry: self,
            controller: Some(controller),
        }
    }

    /// Reset a controller and make it available again
    pub fn release(&self, mut controller: Controller<A>) {
        controller.reset();
        self.idle.push(controller);
    }

    /// How many controllers have been built so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// How many controllers are waiting to be reused
    pub fn idle(&self) -> usize {
        self.idle.len()
    }
}

/// A controller on loan from a registry; returned on drop
pub struct PooledController<'r, A: ExecutionAgent> {
    registry: &'r ControllerRegistry<A>,
    controller: Option<Controller<A>>,
}

impl<A: ExecutionAgent> Deref for PooledController<'_, A> {
    type Target = Controller<A>;

    fn deref(&self) -> &Self::Target {
        self.controller
            .as_ref()
            .expect("controller is only taken on drop")
    }
}

impl<A: ExecutionAgent> DerefMut for PooledController<'_, A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller
            .as_mut()
            .expect("controller is only taken on drop")
    }
}

impl<A: ExecutionAgent> Drop for PooledController<'_, A> {
    fn drop(&mut self) {
        if let Some(controller) = self.controller.take() {
            self.registry.release(controller);
        }
    }
}
