//! Named path shapes.
//!
//! A shape is an ordered list of placeholder tokens. [`expand`] substitutes
//! them from a [`Segments`] value, so every layout the engine produces is
//! visible here as plain data.

use std::path::{Path, PathBuf};

/// A placeholder within a path shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// The chosen base directory (an override, or the item's origin)
    To,
    /// The item's own directory
    Origin,
    /// Item parent relative to the traversal root
    SubPath,
    /// Exclusion tag keeping the engine out of its own artifacts
    DejaVu,
    /// Scheme/profile segments, or the adhoc label
    Supplement,
    /// The trash label
    Trash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub name: &'static str,
    pub tokens: &'static [Token],
}

/// Original moved aside into a sheltered, labelled folder
pub const RELOCATED_TRANSFER: Shape = Shape {
    name: "relocated-transfer",
    tokens: &[
        Token::To,
        Token::SubPath,
        Token::DejaVu,
        Token::Supplement,
        Token::Trash,
    ],
};

/// Original stays in its folder under a decorated name
pub const CUDDLED_TRANSFER: Shape = Shape {
    name: "cuddled-transfer",
    tokens: &[Token::Origin],
};

/// Result replaces the input in place
pub const IN_PLACE_RESULT: Shape = Shape {
    name: "in-place-result",
    tokens: &[Token::Origin],
};

/// Result nested under its scheme/profile
pub const NESTED_RESULT: Shape = Shape {
    name: "nested-result",
    tokens: &[Token::To, Token::Supplement, Token::SubPath],
};

/// Values substituted into a shape
#[derive(Debug, Clone, Copy)]
pub struct Segments<'a> {
    pub to: &'a Path,
    pub origin: &'a Path,
    pub sub_path: &'a Path,
    pub deja_vu: &'a str,
    pub supplement: &'a [&'a str],
    pub trash: &'a str,
}

/// Substitute the segments into the shape
pub fn expand(shape: &Shape, segments: &Segments<'_>) -> PathBuf {
    let mut path = PathBuf::new();
    for token in shape.tokens {
        match token {
            Token::To => path.push(segments.to),
            Token::Origin => path.push(segments.origin),
            Token::SubPath => {
                if !segments.sub_path.as_os_str().is_empty() {
                    path.push(segments.sub_path);
                }
            }
            Token::DejaVu => path.push(segments.deja_vu),
            Token::Supplement => segments.supplement.iter().for_each(|s| path.push(s)),
            Token::Trash => path.push(segments.trash),
        }
    }
    path
}
