use std::collections::HashMap;
use std::env;
use std::fmt;

use clap::error::ErrorKind;
use clap::Command;

use crate::api::{EnvVar, Handler, ParsedArgs};
use crate::matcher::TokenPartitioner;
use crate::parser::base::Scope;
use crate::parser::interface::UserInterface;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// The compiled command line parser.
/// Built via [`CliSpec::compile`](crate::CliSpec::compile) or [`CliSpec::build`](crate::CliSpec::build).
pub struct Parser {
    command: Command,
    root: Scope,
    commands: HashMap<String, (Handler, Scope)>,
    partitioner: Option<TokenPartitioner>,
    env_vars: Vec<EnvVar>,
    user_interface: Box<dyn UserInterface>,
}

impl Parser {
    pub(crate) fn new(
        command: Command,
        root: Scope,
        commands: HashMap<String, (Handler, Scope)>,
        partitioner: Option<TokenPartitioner>,
        env_vars: Vec<EnvVar>,
        user_interface: Box<dyn UserInterface>,
    ) -> Self {
        Self {
            command,
            root,
            commands,
            partitioner,
            env_vars,
            user_interface,
        }
    }

    /// Run the command line parser against the input tokens (excluding the program name).
    ///
    /// Parsing happens in two phases:
    /// 1. The tokens are parsed against the declared arguments and sub-commands.
    /// 2. Required arguments that could have been supplied by the environment are checked for a value.
    ///
    /// If at any point the parser encounters an error (ex: missing argument, invalid value, etc), it will print the error and return with `Err(2)`.
    ///
    /// If the help switch (`-h` or `--help`) or the version switch is encountered, the parser will display the message and return with `Err(0)`.
    pub fn parse_tokens(&self, tokens: &[&str]) -> Result<ParsedArgs, i32> {
        let (known, unknown) = match &self.partitioner {
            Some(partitioner) => partitioner.partition(tokens),
            None => (
                tokens.iter().map(|token| token.to_string()).collect(),
                Vec::default(),
            ),
        };

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Parsing known tokens {known:?}, unknown tokens {unknown:?}.");
        }

        let program = self.command.get_name().to_string();
        let matches = self
            .command
            .clone()
            .try_get_matches_from(std::iter::once(program).chain(known))
            .map_err(|error| self.report(error))?;

        let mut missing: Vec<&str> = self.root.missing(&matches).collect();
        let selected = match matches.subcommand() {
            Some((name, sub_matches)) => {
                let (handler, scope) = self.commands.get(name).unwrap_or_else(|| {
                    unreachable!("internal error - sub-command '{name}' must be compiled.")
                });
                missing.extend(scope.missing(sub_matches));
                Some((name.to_string(), *handler))
            }
            None => None,
        };

        if !missing.is_empty() {
            let error = self.command.clone().error(
                ErrorKind::MissingRequiredArgument,
                format!(
                    "the following arguments are required: {}",
                    missing.join(", ")
                ),
            );
            return Err(self.report(error));
        }

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Parsed with sub-command {:?}.", selected.as_ref().map(|(name, _)| name));
        }

        Ok(ParsedArgs::new(matches, selected, unknown))
    }

    /// Run the command line parser against the Cli [`env::args`].
    ///
    /// If at any point the parser encounters an error, it will exit with error code `2` (via [`std::process::exit`]).
    ///
    /// If the help switch (`-h` or `--help`) is encountered, the parser will display the help message and exit with error code `0`.
    pub fn parse(&self) -> ParsedArgs {
        let command_input: Vec<String> = env::args().skip(1).collect();

        match self.parse_tokens(
            command_input
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .as_slice(),
        ) {
            Ok(args) => args,
            Err(exit_code) => std::process::exit(exit_code),
        }
    }

    /// Parse the Cli [`env::args`] and dispatch to the chosen sub-command's handler.
    ///
    /// Returns the handler's exit code, or `0` when no sub-command was chosen.
    pub fn run(&self) -> i32 {
        self.parse().dispatch().unwrap_or(0)
    }

    /// The environment variables resolved during compilation, for the root and all sub-commands.
    /// Empty when no environment variable prefix is set.
    pub fn env_vars(&self) -> &[EnvVar] {
        &self.env_vars
    }

    /// The help message.
    pub fn help(&self) -> String {
        self.command.clone().render_help().to_string()
    }

    /// The usage message.
    pub fn usage(&self) -> String {
        self.command.clone().render_usage().to_string()
    }

    fn report(&self, error: clap::Error) -> i32 {
        let message = error.render().to_string();

        match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                self.user_interface.print(message)
            }
            _ => self.user_interface.print_error(message),
        }

        error.exit_code()
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("command", &self.command)
            .field("root", &self.root)
            .field("sub_commands", &self.commands.keys().collect::<Vec<_>>())
            .field("partitioner", &self.partitioner)
            .field("env_vars", &self.env_vars)
            .finish_non_exhaustive()
    }
}
