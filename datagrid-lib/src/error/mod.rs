//! Error types
//!
//! Only export failures are meant to reach a user. Store and render errors are
//! recovered inside the engine and surface only in logs and counters.

mod export;
mod render;
mod store;

pub use export::*;
pub use render::*;
pub use store::*;
