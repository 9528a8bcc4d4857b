//! Shared utilities.

pub mod paths;

pub use paths::{expand_tilde, expand_tilde_with, home_dir, PathError};
