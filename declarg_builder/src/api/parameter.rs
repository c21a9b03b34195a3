use std::ffi::OsStr;

use clap::builder::{
    FalseyValueParser, PossibleValue, PossibleValuesParser, TypedValueParser, ValueParser,
};
use clap::{Arg, ArgAction, Command};

use crate::api::{EnvVar, EnvironmentStore};
use crate::constant::*;
use crate::model::{Action, Nargs};
use crate::parser::{enhance, ConfigError, DeferredRequired, Shape};
use crate::prelude::Choices;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// The declaration of one argument (positional) or option (`-x`/`--xyz`).
///
/// An `ArgSpec` is made of *flags*, which are either:
/// * a single positional name (ex: `"item"`), or
/// * one or more option flags (ex: `"-n"`, `"--name"`).
///
/// The *destination* of the `ArgSpec` is the name under which its value is found after parsing.
/// Unless set explicitly via [`ArgSpec::dest`], the destination is derived from the flags:
/// the first long flag (`--max-count` becomes `max_count`), otherwise the first short flag (`-n` becomes `n`), otherwise the positional name.
///
/// ### Example
/// ```
/// # use declarg_builder as declarg;
/// use declarg::{clap::value_parser, ArgSpec, Action};
///
/// let verbose = ArgSpec::new(["-v", "--verbose"])
///     .action(Action::StoreTrue)
///     .help("Show more output.");
/// let count = ArgSpec::new(["--max-count"])
///     .value_parser(value_parser!(u32))
///     .default_value("10");
///
/// assert_eq!(verbose.destination().unwrap(), "verbose");
/// assert_eq!(count.destination().unwrap(), "max_count");
/// ```
#[derive(Debug, Clone)]
pub struct ArgSpec {
    flags: Vec<String>,
    help: Option<String>,
    required: bool,
    default: Option<String>,
    action: Action,
    nargs: Option<Nargs>,
    value_parser: Option<ValueParser>,
    metavar: Option<String>,
    dest: Option<String>,
    choices: Vec<(String, Option<String>)>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FlagKind {
    Positional(String),
    Option {
        longs: Vec<String>,
        shorts: Vec<char>,
    },
}

/// The result of compiling an `ArgSpec`.
#[derive(Debug)]
pub(crate) struct CompiledArg {
    pub(crate) arg: Arg,
    pub(crate) dest: String,
    pub(crate) shape: Shape,
    pub(crate) deferred: Option<DeferredRequired>,
    pub(crate) env_var: Option<EnvVar>,
}

impl ArgSpec {
    /// Declare an argument by its flags.
    ///
    /// Flags are validated when the owning `CliSpec` is compiled.
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(Into::into).collect(),
            help: None,
            required: false,
            default: None,
            action: Action::default(),
            nargs: None,
            value_parser: None,
            metavar: None,
            dest: None,
            choices: Vec::default(),
        }
    }

    /// Document the help message for this argument.
    /// If repeated, only the final help message will apply.
    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.help.replace(description.into());
        self
    }

    /// Mark this argument as required.
    ///
    /// The help message of a required argument is annotated with `(required)`.
    /// When the argument also has a default or an environment variable, its requirement is checked after parsing.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the default value, as it would be written on the command line.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default.replace(value.into());
        self
    }

    /// Set the [`Action`] (defaults to [`Action::Store`]).
    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Set the cardinality.
    pub fn nargs(mut self, nargs: Nargs) -> Self {
        self.nargs.replace(nargs);
        self
    }

    /// Set the type converter (ex: `value_parser!(u32)`).
    pub fn value_parser(mut self, parser: impl Into<ValueParser>) -> Self {
        self.value_parser.replace(parser.into());
        self
    }

    /// Set the name used for the value in the usage and help messages.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar.replace(metavar.into());
        self
    }

    /// Set the destination explicitly.
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest.replace(dest.into());
        self
    }

    /// Restrict the values to `values`, without documenting them.
    pub fn choices<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices
            .extend(values.into_iter().map(|value| (value.into(), None)));
        self
    }

    /// Whether this argument was declared required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The flags of this argument.
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// The destination of this argument (see [`ArgSpec`]).
    pub fn destination(&self) -> Result<String, ConfigError> {
        let kind = classify(&self.flags)?;
        Ok(self.derive_dest(&kind))
    }

    /// Resolve the environment variable of this argument under `prefix`.
    pub fn env_var(
        &self,
        prefix: &str,
        store: &(impl EnvironmentStore + ?Sized),
    ) -> Result<EnvVar, ConfigError> {
        Ok(EnvVar::resolve(prefix, &self.destination()?, store))
    }

    fn derive_dest(&self, kind: &FlagKind) -> String {
        if let Some(dest) = &self.dest {
            return dest.clone();
        }

        match kind {
            FlagKind::Positional(name) => name.clone(),
            FlagKind::Option { longs, shorts } => match (longs.first(), shorts.first()) {
                (Some(long), _) => long.replace('-', "_"),
                (None, Some(short)) => short.to_string(),
                (None, None) => unreachable!("internal error - options must have a flag"),
            },
        }
    }

    fn display(&self) -> String {
        self.flags.join(FLAG_SEPARATOR)
    }

    pub(crate) fn compile(
        &self,
        environment: Option<(&str, &dyn EnvironmentStore)>,
    ) -> Result<CompiledArg, ConfigError> {
        let kind = classify(&self.flags)?;
        let dest = self.derive_dest(&kind);

        if !self.choices.is_empty() && self.value_parser.is_some() {
            return Err(ConfigError::ChoicesWithParser(dest));
        }

        if let Some(nargs) = self.nargs {
            let positional = matches!(kind, FlagKind::Positional(_));

            if !self.action.takes_value() || (positional && nargs == Nargs::Precisely(0)) {
                return Err(ConfigError::InvalidNargs {
                    dest,
                    nargs: nargs.to_string(),
                    action: self.action.to_string(),
                });
            }
        }

        let env_var = environment.map(|(prefix, store)| EnvVar::resolve(prefix, &dest, store));
        let enhanced = enhance(
            self.help.as_deref(),
            self.required,
            self.default.as_deref(),
            env_var.as_ref(),
        );

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Compiling '{dest}' ({kind:?}) as {enhanced:?}.");
        }

        let mut arg = Arg::new(dest.clone()).action(ArgAction::from(self.action));
        let shape = match kind {
            FlagKind::Positional(_) => {
                if !self.action.allows_positional() {
                    return Err(ConfigError::InvalidAction {
                        dest,
                        action: self.action.to_string(),
                    });
                }

                let optional = enhanced.default.is_some()
                    || self.nargs.map(|n| n.allows_empty()).unwrap_or(false);
                arg = arg.required(enhanced.required || !(optional || enhanced.deferred));
                Shape::Positional
            }
            FlagKind::Option { longs, shorts } => {
                if let Some((first, rest)) = longs.split_first() {
                    arg = arg.long(first.clone()).visible_aliases(rest.to_vec());
                }

                if let Some((first, rest)) = shorts.split_first() {
                    arg = arg.short(*first).visible_short_aliases(rest.to_vec());
                }

                arg = arg.required(enhanced.required);
                Shape::Option {
                    longs,
                    shorts,
                    takes_value: self.action.takes_value()
                        && !self.nargs.map(|n| n.allows_empty()).unwrap_or(false),
                }
            }
        };

        if let Some(help) = enhanced.help {
            arg = arg.help(help);
        }

        if let Some(default) = enhanced.default {
            arg = match self.action {
                Action::StoreTrue | Action::StoreFalse => {
                    arg.default_value(switch_default(&default))
                }
                _ => arg.default_value(default),
            };
        }

        if let Some(nargs) = self.nargs {
            arg = arg.num_args(nargs);
        }

        if let Some(metavar) = &self.metavar {
            arg = arg.value_name(metavar.clone());
        }

        if let Some(value_parser) = &self.value_parser {
            arg = arg.value_parser(value_parser.clone());
        } else if !self.choices.is_empty() {
            arg = arg.value_parser(PossibleValuesParser::new(self.choices.iter().map(
                |(value, description)| {
                    let possible = PossibleValue::new(value.clone());
                    match description {
                        Some(description) => possible.help(description.clone()),
                        None => possible,
                    }
                },
            )));
        }

        let deferred = if enhanced.deferred {
            Some(DeferredRequired {
                dest: dest.clone(),
                display: self.display(),
            })
        } else {
            None
        };

        Ok(CompiledArg {
            arg,
            dest,
            shape,
            deferred,
            env_var,
        })
    }
}

impl Choices for ArgSpec {
    /// Restrict the values to the documented choices.
    ///
    /// ### Example
    /// ```
    /// # use declarg_builder as declarg;
    /// use declarg::{prelude::*, ArgSpec};
    ///
    /// ArgSpec::new(["--color"])
    ///     .choice("always", "Always use colour.")
    ///     .choice("never", "Never use colour.");
    /// ```
    fn choice(mut self, value: impl Into<String>, description: impl Into<String>) -> Self {
        self.choices
            .push((value.into(), Some(description.into())));
        self
    }
}

/// Normalize a switch's default onto `true`/`false`.
/// Empty and false-like values (`0`, `no`, `off`, ...) are `false`, anything else is `true`.
fn switch_default(value: &str) -> &'static str {
    let truthy = FalseyValueParser::new()
        .parse_ref(&Command::new("switch"), None, OsStr::new(value))
        .unwrap_or(true);

    if truthy {
        "true"
    } else {
        "false"
    }
}

/// Classify the flags into either a positional name, or option flags.
pub(crate) fn classify(flags: &[String]) -> Result<FlagKind, ConfigError> {
    if flags.is_empty() {
        return Err(ConfigError::EmptyFlags);
    }

    let mut positional: Option<String> = None;
    let mut longs = Vec::default();
    let mut shorts = Vec::default();

    for flag in flags {
        if let Some(long) = flag.strip_prefix("--") {
            if long.is_empty()
                || long.starts_with('-')
                || long.contains('=')
                || long.contains(char::is_whitespace)
            {
                return Err(ConfigError::InvalidFlag(flag.clone()));
            }

            longs.push(long.to_string());
        } else if let Some(short) = flag.strip_prefix('-') {
            let mut chars = short.chars();

            match (chars.next(), chars.next()) {
                (Some(c), None) if c != '=' && !c.is_whitespace() => shorts.push(c),
                _ => return Err(ConfigError::InvalidFlag(flag.clone())),
            }
        } else {
            if flag.is_empty() || flag.contains(char::is_whitespace) || positional.is_some() {
                return Err(ConfigError::InvalidFlag(flag.clone()));
            }

            positional.replace(flag.clone());
        }
    }

    match positional {
        Some(name) if longs.is_empty() && shorts.is_empty() => Ok(FlagKind::Positional(name)),
        Some(_) => Err(ConfigError::MixedFlags(flags.join(FLAG_SEPARATOR))),
        None => Ok(FlagKind::Option { longs, shorts }),
    }
}
