//! Tool input models.
//!
//! Data API responses are passed through to the client as JSON, so only
//! inputs are modelled here.

mod inputs;
pub mod lenient;

pub use inputs::*;
