use std::collections::HashSet;

use clap::ArgMatches;
use thiserror::Error;

use crate::constant::*;

/// A malformed declaration, detected while compiling a `CliSpec`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An argument was declared without any flag or name.
    #[error("argument must declare at least one flag or name.")]
    EmptyFlags,

    /// A flag string that is neither a valid option flag nor a positional name.
    #[error("invalid flag '{0}'.")]
    InvalidFlag(String),

    /// An argument mixes a positional name with option flags.
    #[error("argument '{0}' mixes positional names and option flags.")]
    MixedFlags(String),

    /// Two arguments of the same parser share an option flag.
    #[error("conflicting option string '{flag}' in '{program}'.")]
    ConflictingFlag {
        /// The parser (program or sub-command) in which the conflict occurs.
        program: String,
        /// The repeated flag.
        flag: String,
    },

    /// Two arguments of the same parser share a destination.
    #[error("conflicting destination '{dest}' in '{program}'.")]
    ConflictingDest {
        /// The parser (program or sub-command) in which the conflict occurs.
        program: String,
        /// The repeated destination.
        dest: String,
    },

    /// A sub-command name (or alias) is repeated within its group.
    #[error("duplicate sub-command '{0}'.")]
    DuplicateSubcommand(String),

    /// An action that takes no value was given to a positional argument.
    #[error("positional argument '{dest}' cannot use action {action}.")]
    InvalidAction {
        /// The positional argument.
        dest: String,
        /// The action name.
        action: String,
    },

    /// A cardinality that the argument's action (or positional kind) cannot take.
    #[error("argument '{dest}' cannot use nargs {nargs} with action {action}.")]
    InvalidNargs {
        /// The argument.
        dest: String,
        /// The cardinality.
        nargs: String,
        /// The action name.
        action: String,
    },

    /// Choices and a value parser were both given to one argument.
    #[error("argument '{0}' cannot combine choices with a value parser.")]
    ChoicesWithParser(String),

    /// The environment variable prefix is empty or contains '='.
    #[error("invalid environment variable prefix '{0}'.")]
    InvalidPrefix(String),
}

/// A required argument whose requirement is checked after parsing, since a default or the environment may satisfy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeferredRequired {
    pub(crate) dest: String,
    pub(crate) display: String,
}

/// The post-parse bookkeeping for one parser (the root, or a single sub-command).
#[derive(Debug, Default)]
pub(crate) struct Scope {
    deferred: Vec<DeferredRequired>,
}

impl Scope {
    pub(crate) fn defer(&mut self, deferred: DeferredRequired) {
        self.deferred.push(deferred);
    }

    pub(crate) fn missing<'s>(&'s self, matches: &'s ArgMatches) -> impl Iterator<Item = &'s str> {
        self.deferred
            .iter()
            .filter(|deferred| !matches.contains_id(&deferred.dest))
            .map(|deferred| deferred.display.as_str())
    }
}

/// The flag shape of a compiled argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Shape {
    Positional,
    Option {
        longs: Vec<String>,
        shorts: Vec<char>,
        takes_value: bool,
    },
}

/// Detects conflicting flags and destinations within a single parser.
#[derive(Debug)]
pub(crate) struct FlagRegistry {
    program: String,
    longs: HashSet<String>,
    shorts: HashSet<char>,
    dests: HashSet<String>,
}

impl FlagRegistry {
    pub(crate) fn new(program: impl Into<String>, with_version: bool) -> Self {
        let mut registry = Self {
            program: program.into(),
            longs: HashSet::default(),
            shorts: HashSet::default(),
            dests: HashSet::default(),
        };
        registry.reserve(HELP_NAME, HELP_SHORT);

        if with_version {
            registry.reserve(VERSION_NAME, VERSION_SHORT);
        }

        registry
    }

    fn reserve(&mut self, name: &str, short: char) {
        self.longs.insert(name.to_string());
        self.shorts.insert(short);
        self.dests.insert(name.to_string());
    }

    pub(crate) fn register(&mut self, dest: &str, shape: &Shape) -> Result<(), ConfigError> {
        if !self.dests.insert(dest.to_string()) {
            return Err(ConfigError::ConflictingDest {
                program: self.program.clone(),
                dest: dest.to_string(),
            });
        }

        if let Shape::Option { longs, shorts, .. } = shape {
            for long in longs {
                if !self.longs.insert(long.clone()) {
                    return Err(ConfigError::ConflictingFlag {
                        program: self.program.clone(),
                        flag: format!("--{long}"),
                    });
                }
            }

            for short in shorts {
                if !self.shorts.insert(*short) {
                    return Err(ConfigError::ConflictingFlag {
                        program: self.program.clone(),
                        flag: format!("-{short}"),
                    });
                }
            }
        }

        Ok(())
    }
}
