//! Traits which, typically, may be imported without concern: `use declarg::prelude::*`.

/// Behaviour for documenting choices on an `ArgSpec`.
// Needs to be imported in order to document choices.
pub trait Choices {
    fn choice(self, value: impl Into<String>, description: impl Into<String>) -> Self;
}
