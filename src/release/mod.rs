// src/release/mod.rs

//! Release lifecycle: version/draft resolution before the stage graph runs,
//! and the final publish step after it succeeds.
//!
//! - [`context`] holds the immutable run-scoped identifiers.
//! - [`resolver`] runs the resolver command once and parses its outputs.
//! - [`publisher`] flips the draft release to published, with credentials
//!   forwarded only to that one command.

pub mod context;
pub mod publisher;
pub mod resolver;

pub use context::RunContext;
pub use publisher::publish;
pub use resolver::resolve;
