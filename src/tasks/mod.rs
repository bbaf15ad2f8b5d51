//! Background Tasks Module
//!
//! # Tasks
//! - Janitor: removes expired cache items at a configured interval

mod janitor;

pub use janitor::{Janitor, JanitorState, Sweep};
