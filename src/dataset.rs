//! Data access: which sessions to analyze and what they contain.
//!
//! - [`filter`]: Typed restriction of the sessions (animal, task, stimulation protocol, ...)
//! - [`session`]: Session records with spike trains, behavioral and stimulation intervals
//! - [`store`]: The [`store::SessionSource`] interface and a JSON-file backed implementation
//! - [`synthetic`]: Synthetic sessions with rhythmic units
pub mod filter;
pub mod session;
pub mod store;
pub mod synthetic;
