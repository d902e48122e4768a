//! Editorial - claim, release, check and publish content across channels
//!
//! Command-line surface over `editorial-core`. Agent identity and
//! configuration are resolved here and passed into the coordinator.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use error::{Error, Result};
