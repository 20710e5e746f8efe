//! bpq - Blueprint queue administration
//!
//! Command-line front end for `bpq-core`. Queue changes are applied against
//! a data directory, or replayed from a stream of host triggers on stdin.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod notify;
pub mod state;

pub use error::{Error, Result};
