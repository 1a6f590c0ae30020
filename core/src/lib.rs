//! Shared data model and target input for the httpget audit.

pub mod input;
pub mod models;

pub use input::{parse_target, InputError, LineFault, TargetReader};
pub use models::*;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
