//! Builder module for `declarg`.
//! See [documentation root](https://docs.rs/declarg/latest/declarg/index.html) for full details.
#![deny(missing_docs)]
mod api;
mod constant;
pub mod convert;
mod matcher;
mod model;
mod parser;
#[allow(missing_docs)]
pub mod prelude;

pub use api::*;
pub use model::*;
pub use parser::{ConfigError, Parser};

/// The underlying argument parsing library, for its value parsers (ex: [`clap::value_parser!`]).
pub use clap;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
