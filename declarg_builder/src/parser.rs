mod base;
mod interface;
mod middleware;
mod printer;

pub use base::ConfigError;
pub(crate) use base::*;
pub(crate) use interface::*;
pub use middleware::Parser;
pub(crate) use printer::*;
