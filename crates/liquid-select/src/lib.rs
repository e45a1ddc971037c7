//! Similarity resolution and backend selection for the dispatcher.

#![forbid(unsafe_code)]

mod selector;
mod similarity;

pub use selector::{SelectionMode, Selector};
pub use similarity::resolve;
