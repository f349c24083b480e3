pub mod cli;
pub mod commands;
pub mod engine;
pub mod error;
pub mod geom;
pub mod ops;
pub mod ranges;
pub mod viewer;

pub mod test_utils;

pub use error::{Error, Result};
