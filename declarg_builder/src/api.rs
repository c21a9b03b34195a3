mod capture;
mod core;
mod environment;
mod parameter;

pub use self::core::*;
pub use capture::*;
pub use environment::*;
pub use parameter::*;
