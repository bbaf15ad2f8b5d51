//! Models Module
//!
//! Cached values and their persisted snapshot format.

pub mod snapshot;
mod value;

pub use value::{Opaque, Value};
