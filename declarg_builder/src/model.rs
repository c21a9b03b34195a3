use clap::builder::ValueRange;
use clap::ArgAction;

/// The cardinality of inputs to match for an argument/option.
///
/// Inspired by argparse: <https://docs.python.org/3/library/argparse.html#nargs>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// `N`: Precisely `N` values.
    Precisely(u8),
    /// `*`: May be any number of values, including `0`.
    Any,
    /// `+`: At least one value must be specified.
    AtLeastOne,
    /// `?`: Either zero or one value.
    AtMostOne,
}

impl Nargs {
    pub(crate) fn allows_empty(&self) -> bool {
        matches!(self, Nargs::Any | Nargs::AtMostOne | Nargs::Precisely(0))
    }
}

impl std::fmt::Display for Nargs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<Nargs> for ValueRange {
    fn from(value: Nargs) -> Self {
        match value {
            Nargs::Precisely(n) => ValueRange::new(n as usize),
            Nargs::Any => ValueRange::new(0..),
            Nargs::AtLeastOne => ValueRange::new(1..),
            Nargs::AtMostOne => ValueRange::new(0..=1),
        }
    }
}

/// What the parser does with an argument/option when it is matched.
///
/// Inspired by argparse: <https://docs.python.org/3/library/argparse.html#action>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Store the value(s), overwriting any previous occurrence.
    #[default]
    Store,
    /// Store `true` when present (`false` otherwise).
    StoreTrue,
    /// Store `false` when present (`true` otherwise).
    StoreFalse,
    /// Append the value(s) of every occurrence.
    Append,
    /// Count the occurrences.
    Count,
}

impl Action {
    pub(crate) fn takes_value(&self) -> bool {
        matches!(self, Action::Store | Action::Append)
    }

    pub(crate) fn allows_positional(&self) -> bool {
        self.takes_value()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<Action> for ArgAction {
    fn from(value: Action) -> Self {
        match value {
            Action::Store => ArgAction::Set,
            Action::StoreTrue => ArgAction::SetTrue,
            Action::StoreFalse => ArgAction::SetFalse,
            Action::Append => ArgAction::Append,
            Action::Count => ArgAction::Count,
        }
    }
}
