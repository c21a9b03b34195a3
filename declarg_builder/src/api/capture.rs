use std::any::Any;

use clap::parser::MatchesError;
use clap::ArgMatches;

/// The function run for a sub-command, returning the process exit code.
pub type Handler = fn(&ParsedArgs) -> i32;

#[derive(Debug, Clone)]
struct Invocation {
    name: String,
    handler: Handler,
}

/// The result of parsing: values by destination, plus the selected sub-command and its handler.
///
/// Values are looked up across the selected sub-command and the root parser (in that order).
/// This gives a single namespace over both, so a handler may read the root options directly.
#[derive(Debug, Clone)]
pub struct ParsedArgs {
    matches: ArgMatches,
    invocation: Option<Invocation>,
    unknown: Vec<String>,
}

impl ParsedArgs {
    pub(crate) fn new(
        matches: ArgMatches,
        selected: Option<(String, Handler)>,
        unknown: Vec<String>,
    ) -> Self {
        Self {
            matches,
            invocation: selected.map(|(name, handler)| Invocation { name, handler }),
            unknown,
        }
    }

    fn sub_matches(&self) -> Option<&ArgMatches> {
        self.invocation
            .as_ref()
            .and_then(|invocation| self.matches.subcommand_matches(&invocation.name))
    }

    /// Get the value of the destination `dest`.
    ///
    /// Returns `Ok(None)` when the destination was not matched and has no default.
    /// Returns `Err` when `T` is not the type produced by the argument's value parser, or when `dest` is not declared.
    pub fn try_value<T>(&self, dest: &str) -> Result<Option<&T>, MatchesError>
    where
        T: Any + Clone + Send + Sync + 'static,
    {
        if let Some(sub_matches) = self.sub_matches() {
            match sub_matches.try_get_one::<T>(dest) {
                Ok(None) | Err(MatchesError::UnknownArgument { .. }) => {}
                result => return result,
            }
        }

        self.matches.try_get_one::<T>(dest)
    }

    /// Get the value of the destination `dest`.
    ///
    /// ### Panics
    /// If `T` is not the type produced by the argument's value parser (like [`ArgMatches::get_one`]).
    pub fn value<T>(&self, dest: &str) -> Option<&T>
    where
        T: Any + Clone + Send + Sync + 'static,
    {
        match self.try_value(dest) {
            Ok(value) => value,
            Err(MatchesError::UnknownArgument { .. }) => None,
            Err(error) => panic!("mismatch between definition and access of '{dest}': {error}"),
        }
    }

    /// Get all the values of the destination `dest` (for [`Action::Append`](crate::Action::Append) or [`Nargs`](crate::Nargs)).
    ///
    /// ### Panics
    /// If `T` is not the type produced by the argument's value parser (like [`ArgMatches::get_many`]).
    pub fn values<T>(&self, dest: &str) -> Option<Vec<&T>>
    where
        T: Any + Clone + Send + Sync + 'static,
    {
        self.sub_matches()
            .and_then(|sub_matches| many(sub_matches, dest))
            .or_else(|| many(&self.matches, dest))
    }

    /// Get the value of a [`Action::StoreTrue`](crate::Action::StoreTrue)/[`Action::StoreFalse`](crate::Action::StoreFalse) destination.
    pub fn flag(&self, dest: &str) -> bool {
        self.value::<bool>(dest).copied().unwrap_or(false)
    }

    /// Get the value of a [`Action::Count`](crate::Action::Count) destination.
    pub fn count(&self, dest: &str) -> u8 {
        self.value::<u8>(dest).copied().unwrap_or(0)
    }

    /// Get the raw (unconverted) values of the destination `dest`.
    pub fn raw(&self, dest: &str) -> Option<Vec<String>> {
        self.sub_matches()
            .and_then(|sub_matches| raw(sub_matches, dest))
            .or_else(|| raw(&self.matches, dest))
    }

    /// The name of the selected sub-command (aliases are resolved to the declared name).
    pub fn subcommand(&self) -> Option<&str> {
        self.invocation
            .as_ref()
            .map(|invocation| invocation.name.as_str())
    }

    /// The handler of the selected sub-command.
    pub fn handler(&self) -> Option<Handler> {
        self.invocation.as_ref().map(|invocation| invocation.handler)
    }

    /// Run the handler of the selected sub-command, returning its exit code.
    pub fn dispatch(&self) -> Option<i32> {
        self.handler().map(|handler| handler(self))
    }

    /// The option tokens that were set aside, when the `CliSpec` does not reject unknown arguments.
    pub fn unknown(&self) -> &[String] {
        &self.unknown
    }

    /// The underlying matches of the root parser.
    pub fn matches(&self) -> &ArgMatches {
        &self.matches
    }
}

fn many<'m, T>(matches: &'m ArgMatches, dest: &str) -> Option<Vec<&'m T>>
where
    T: Any + Clone + Send + Sync + 'static,
{
    match matches.try_get_many::<T>(dest) {
        Ok(values) => values.map(|values| values.collect()),
        Err(MatchesError::UnknownArgument { .. }) => None,
        Err(error) => panic!("mismatch between definition and access of '{dest}': {error}"),
    }
}

fn raw(matches: &ArgMatches, dest: &str) -> Option<Vec<String>> {
    match matches.try_get_raw(dest) {
        Ok(values) => values.map(|values| {
            values
                .map(|value| value.to_string_lossy().to_string())
                .collect()
        }),
        Err(_) => None,
    }
}
