use std::collections::{HashMap, HashSet};

use clap::Command;

use crate::api::environment::validate_prefix;
use crate::api::{ArgSpec, EnvVar, EnvironmentStore, Handler, ParsedArgs, ProcessEnvironment};
use crate::constant::*;
use crate::matcher::TokenPartitioner;
use crate::parser::{
    help_width, ConfigError, ConsoleInterface, FlagRegistry, Parser, Scope, UserInterface,
};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// The root declaration of a command line program.
///
/// ### Example
/// ```
/// # use declarg_builder as declarg;
/// use declarg::{ArgSpec, CliSpec, ParsedArgs, SubcmdGroup, SubcmdSpec};
///
/// fn greet(args: &ParsedArgs) -> i32 {
///     println!("Hello, {}!", args.value::<String>("name").unwrap());
///     0
/// }
///
/// let spec = CliSpec::new("program")
///     .about("My program that does awesome stuff.")
///     .envvar_prefix("PROGRAM")
///     .arg(ArgSpec::new(["-v", "--verbose"]).action(declarg::Action::StoreTrue))
///     .subcommands(SubcmdGroup::new([
///         SubcmdSpec::new("greet", greet)
///             .arg(ArgSpec::new(["--name"]).default_value("world").help("Who to greet.")),
///     ]));
///
/// let parser = spec.compile().unwrap();
/// let args = parser.parse_tokens(&["greet", "--name", "you"]).unwrap();
/// assert_eq!(args.subcommand(), Some("greet"));
/// assert_eq!(args.dispatch(), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct CliSpec {
    program: String,
    about: Option<String>,
    epilog: Option<String>,
    version: Option<String>,
    width: Option<usize>,
    argspecs: Vec<ArgSpec>,
    subcmdgroup: Option<SubcmdGroup>,
    envvar_prefix: Option<String>,
    reject_unknown_args: bool,
}

impl CliSpec {
    /// Declare a command line program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            about: None,
            epilog: None,
            version: None,
            width: None,
            argspecs: Vec::default(),
            subcmdgroup: None,
            envvar_prefix: None,
            reject_unknown_args: true,
        }
    }

    /// Document the about message, shown at the top of the help message.
    /// If repeated, only the final about message will apply.
    pub fn about(mut self, description: impl Into<String>) -> Self {
        self.about.replace(description.into());
        self
    }

    /// Document the epilog, shown at the bottom of the help message.
    pub fn epilog(mut self, epilog: impl Into<String>) -> Self {
        self.epilog.replace(epilog.into());
        self
    }

    /// Set the version, which adds the `-V/--version` option.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version.replace(version.into());
        self
    }

    /// Set the width at which the help message is wrapped.
    /// By default, this is the width of the terminal.
    pub fn width(mut self, width: usize) -> Self {
        self.width.replace(width);
        self
    }

    /// Add an argument.
    ///
    /// The order of positional arguments corresponds to their order during parsing.
    pub fn arg(mut self, argspec: ArgSpec) -> Self {
        self.argspecs.push(argspec);
        self
    }

    /// Add several arguments (see [`CliSpec::arg`]).
    pub fn args(mut self, argspecs: impl IntoIterator<Item = ArgSpec>) -> Self {
        self.argspecs.extend(argspecs);
        self
    }

    /// Set the sub-command group.
    /// If repeated, only the final group will apply.
    pub fn subcommands(mut self, subcmdgroup: SubcmdGroup) -> Self {
        self.subcmdgroup.replace(subcmdgroup);
        self
    }

    /// Set the environment variable prefix.
    ///
    /// With prefix `P`, the destination `xyz` falls back onto the environment variable `P_XYZ` when absent from the command line.
    /// This applies to the arguments of sub-commands as well.
    pub fn envvar_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.envvar_prefix.replace(prefix.into());
        self
    }

    /// Whether to reject undeclared options (defaults to `true`).
    ///
    /// When `false`, undeclared options are set aside and made available via [`ParsedArgs::unknown`].
    pub fn reject_unknown_args(mut self, reject: bool) -> Self {
        self.reject_unknown_args = reject;
        self
    }

    /// The destinations of the root arguments.
    pub fn arg_names(&self) -> Result<Vec<String>, ConfigError> {
        self.argspecs.iter().map(ArgSpec::destination).collect()
    }

    /// The raw values of the root arguments, by destination.
    pub fn name_value_pairs(
        &self,
        args: &ParsedArgs,
    ) -> Result<Vec<(String, Option<Vec<String>>)>, ConfigError> {
        Ok(self
            .arg_names()?
            .into_iter()
            .map(|name| {
                let value = args.raw(&name);
                (name, value)
            })
            .collect())
    }

    /// The environment variables of the root arguments, read from the process environment.
    ///
    /// Filtered to required (`Some(true)`), optional (`Some(false)`), or all (`None`) arguments.
    /// Empty when no environment variable prefix is set.
    pub fn env_vars(&self, required: Option<bool>) -> Result<Vec<EnvVar>, ConfigError> {
        self.env_vars_with(required, &ProcessEnvironment)
    }

    /// The environment variables of the root arguments (see [`CliSpec::env_vars`]), read from `store`.
    pub fn env_vars_with(
        &self,
        required: Option<bool>,
        store: &(impl EnvironmentStore + ?Sized),
    ) -> Result<Vec<EnvVar>, ConfigError> {
        match &self.envvar_prefix {
            Some(prefix) => self
                .argspecs
                .iter()
                .filter(|argspec| required.map_or(true, |r| argspec.is_required() == r))
                .map(|argspec| argspec.env_var(prefix, store))
                .collect(),
            None => Ok(Vec::default()),
        }
    }

    /// Compile into a parser, using the process environment for fallbacks.
    /// This checks the declaration for errors (ex: a repeated sub-command name).
    pub fn compile(&self) -> Result<Parser, ConfigError> {
        self.compile_with(&ProcessEnvironment)
    }

    /// Compile into a parser, using `store` for environment variable fallbacks.
    pub fn compile_with(
        &self,
        store: &(impl EnvironmentStore + ?Sized),
    ) -> Result<Parser, ConfigError> {
        self.compile_with_interface(store, Box::new(ConsoleInterface::default()))
    }

    pub(crate) fn compile_with_interface<E>(
        &self,
        store: &E,
        user_interface: Box<dyn UserInterface>,
    ) -> Result<Parser, ConfigError>
    where
        E: EnvironmentStore + ?Sized,
    {
        let environment = match &self.envvar_prefix {
            Some(prefix) => {
                validate_prefix(prefix)?;
                Some((prefix.as_str(), DynStore(store)))
            }
            None => None,
        };
        let environment = environment
            .as_ref()
            .map(|(prefix, store)| (*prefix, store as &dyn EnvironmentStore));

        let with_version = self.version.is_some();
        let mut partitioner = TokenPartitioner::new(with_version);
        let mut command = Command::new(self.program.clone()).disable_help_subcommand(true);

        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }

        if let Some(epilog) = &self.epilog {
            command = command.after_help(epilog.clone());
        }

        if let Some(version) = &self.version {
            command = command.version(version.clone());
        }

        if let Some(width) = help_width(self.width) {
            command = command.term_width(width);
        }

        let mut root = Scope::default();
        let mut registry = FlagRegistry::new(self.program.clone(), with_version);
        let mut env_vars = Vec::default();

        for argspec in &self.argspecs {
            let compiled = argspec.compile(environment)?;
            registry.register(&compiled.dest, &compiled.shape)?;
            partitioner.register(&compiled.shape);
            env_vars.extend(compiled.env_var);

            if let Some(deferred) = compiled.deferred {
                root.defer(deferred);
            }

            command = command.arg(compiled.arg);
        }

        let mut commands = HashMap::default();

        if let Some(subcmdgroup) = &self.subcmdgroup {
            command = subcmdgroup.apply(command);
            let mut names = HashSet::new();

            for subcmdspec in &subcmdgroup.subcmdspecs {
                for name in std::iter::once(&subcmdspec.name).chain(subcmdspec.aliases.iter()) {
                    if !names.insert(name.clone()) {
                        return Err(ConfigError::DuplicateSubcommand(name.clone()));
                    }
                }

                let (sub_command, scope) =
                    subcmdspec.compile(environment, &mut partitioner, &mut env_vars)?;
                commands.insert(subcmdspec.name.clone(), (subcmdspec.handler, scope));
                command = command.subcommand(sub_command);
            }
        }

        #[cfg(feature = "tracing_debug")]
        {
            debug!(
                "Compiled '{}' with {} argument(s) and {} sub-command(s).",
                self.program,
                self.argspecs.len(),
                commands.len()
            );
        }

        let partitioner = if self.reject_unknown_args {
            None
        } else {
            Some(partitioner)
        };

        Ok(Parser::new(
            command,
            root,
            commands,
            partitioner,
            env_vars,
            user_interface,
        ))
    }

    /// Compile into a parser.
    /// If the declaration is malformed, exits with error code `1` (via [`std::process::exit`]).
    pub fn build(&self) -> Parser {
        match self.compile() {
            Ok(parser) => parser,
            Err(e) => {
                eprintln!("Config error: {e}");
                std::process::exit(CONFIG_ERROR_EXIT);
            }
        }
    }

    /// Compile and parse the process arguments (see [`Parser::parse`]).
    pub fn parse_args(&self) -> ParsedArgs {
        self.build().parse()
    }

    /// The help message of the compiled parser.
    pub fn format_help(&self) -> Result<String, ConfigError> {
        Ok(self.compile()?.help())
    }
}

// Adapts a possibly unsized store into a sized value, so it may be viewed as a `dyn EnvironmentStore`.
struct DynStore<'s, E: ?Sized>(&'s E);

impl<'s, E: EnvironmentStore + ?Sized> EnvironmentStore for DynStore<'s, E> {
    fn var(&self, name: &str) -> Option<String> {
        self.0.var(name)
    }
}

/// A group of sub-commands.
///
/// Exactly one sub-command of the group may be chosen on the command line.
#[derive(Debug, Clone)]
pub struct SubcmdGroup {
    subcmdspecs: Vec<SubcmdSpec>,
    help: Option<String>,
    metavar: Option<String>,
    required: bool,
}

impl SubcmdGroup {
    /// Declare a group of sub-commands.
    pub fn new(subcmdspecs: impl IntoIterator<Item = SubcmdSpec>) -> Self {
        Self {
            subcmdspecs: subcmdspecs.into_iter().collect(),
            help: None,
            metavar: None,
            required: false,
        }
    }

    /// Document the group; shown as the heading above the sub-commands in the help message.
    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.help.replace(description.into());
        self
    }

    /// Set the name used for the sub-command in the usage message.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar.replace(metavar.into());
        self
    }

    /// Whether a sub-command must be chosen (defaults to `false`).
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    fn apply(&self, mut command: Command) -> Command {
        command = command.subcommand_required(self.required);

        if let Some(help) = &self.help {
            command = command.subcommand_help_heading(help.clone());
        }

        if let Some(metavar) = &self.metavar {
            command = command.subcommand_value_name(metavar.clone());
        }

        command
    }
}

/// A sub-command: its name, its handler, and its own arguments.
#[derive(Debug, Clone)]
pub struct SubcmdSpec {
    name: String,
    handler: Handler,
    about: Option<String>,
    aliases: Vec<String>,
    argspecs: Vec<ArgSpec>,
}

impl SubcmdSpec {
    /// Declare a sub-command.
    ///
    /// When chosen, `handler` is recorded on the [`ParsedArgs`] (see [`ParsedArgs::handler`] and [`ParsedArgs::dispatch`]).
    pub fn new(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            handler,
            about: None,
            aliases: Vec::default(),
            argspecs: Vec::default(),
        }
    }

    /// Document the sub-command.
    /// If repeated, only the final help message will apply.
    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.about.replace(description.into());
        self
    }

    /// Add an alternative name for the sub-command.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Add an argument to the sub-command.
    pub fn arg(mut self, argspec: ArgSpec) -> Self {
        self.argspecs.push(argspec);
        self
    }

    /// Add several arguments to the sub-command.
    pub fn args(mut self, argspecs: impl IntoIterator<Item = ArgSpec>) -> Self {
        self.argspecs.extend(argspecs);
        self
    }

    /// The name of the sub-command.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn compile(
        &self,
        environment: Option<(&str, &dyn EnvironmentStore)>,
        partitioner: &mut TokenPartitioner,
        env_vars: &mut Vec<EnvVar>,
    ) -> Result<(Command, Scope), ConfigError> {
        let mut command = Command::new(self.name.clone()).visible_aliases(self.aliases.clone());

        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }

        let mut scope = Scope::default();
        let mut registry = FlagRegistry::new(self.name.clone(), false);

        for argspec in &self.argspecs {
            let compiled = argspec.compile(environment)?;
            registry.register(&compiled.dest, &compiled.shape)?;
            partitioner.register(&compiled.shape);
            env_vars.extend(compiled.env_var);

            if let Some(deferred) = compiled.deferred {
                scope.defer(deferred);
            }

            command = command.arg(compiled.arg);
        }

        Ok((command, scope))
    }

    /// *Available using 'unit_test' crate feature only.*</br></br>
    /// Compile only this sub-command's arguments into a stand-alone [`Parser`], for use in testing.
    ///
    /// ### Example
    /// ```
    /// # use declarg_builder as declarg;
    /// use declarg::{ArgSpec, ParsedArgs, SubcmdSpec};
    ///
    /// fn handler(_: &ParsedArgs) -> i32 {
    ///     0
    /// }
    ///
    /// let sub = SubcmdSpec::new("sub", handler).arg(ArgSpec::new(["value"]));
    /// let parser = sub.test_parser().unwrap();
    /// let args = parser.parse_tokens(&["2"]).unwrap();
    /// assert_eq!(args.value::<String>("value").unwrap(), "2");
    /// ```
    #[cfg(feature = "unit_test")]
    pub fn test_parser(&self) -> Result<Parser, ConfigError> {
        let mut spec = CliSpec::new(self.name.clone()).args(self.argspecs.clone());
        spec.about = self.about.clone();
        spec.compile_with(&HashMap::<String, String>::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, Nargs};
    use crate::parser::util::InMemoryInterface;
    use crate::test::assert_contains;
    use clap::value_parser;
    use rstest::rstest;

    fn handler_a(_: &ParsedArgs) -> i32 {
        11
    }

    fn handler_b(_: &ParsedArgs) -> i32 {
        22
    }

    fn no_environment() -> HashMap<String, String> {
        HashMap::default()
    }

    fn compile(spec: &CliSpec, store: &HashMap<String, String>) -> (Parser, InMemoryInterface) {
        let interface = InMemoryInterface::default();
        let parser = spec
            .compile_with_interface(store, Box::new(interface.clone()))
            .unwrap();
        (parser, interface)
    }

    fn pqr_stu() -> CliSpec {
        CliSpec::new("program")
            .width(100)
            .subcommands(SubcmdGroup::new([
                SubcmdSpec::new("pqr", handler_a).help("The pqr sub-command."),
                SubcmdSpec::new("stu", handler_b).help("The stu sub-command."),
            ]))
    }

    #[test]
    fn empty_compile() {
        // Setup
        let spec = CliSpec::new("program");

        // Execute
        let (parser, interface) = compile(&spec, &no_environment());

        // Verify
        let args = parser.parse_tokens(&[]).unwrap();
        assert_eq!(args.subcommand(), None);
        assert_eq!(args.dispatch(), None);
        assert_eq!(interface.consume(), (None, None));
    }

    #[rstest]
    #[case(vec!["pqr"], "pqr", 11)]
    #[case(vec!["stu"], "stu", 22)]
    fn dispatch(#[case] tokens: Vec<&str>, #[case] expected_name: &str, #[case] expected_code: i32) {
        // Setup
        let (parser, _) = compile(&pqr_stu(), &no_environment());

        // Execute
        let args = parser.parse_tokens(tokens.as_slice()).unwrap();

        // Verify
        assert_eq!(args.subcommand(), Some(expected_name));
        let handler = args.handler().unwrap();
        assert_eq!(handler(&args), expected_code);
        assert_eq!(args.dispatch(), Some(expected_code));
    }

    #[test]
    fn dispatch_alias() {
        // Setup
        let spec = CliSpec::new("program").subcommands(SubcmdGroup::new([
            SubcmdSpec::new("pqr", handler_a).alias("p"),
            SubcmdSpec::new("stu", handler_b).alias("s"),
        ]));
        let (parser, _) = compile(&spec, &no_environment());

        // Execute
        let args = parser.parse_tokens(&["s"]).unwrap();

        // Verify
        assert_eq!(args.subcommand(), Some("stu"));
        assert_eq!(args.dispatch(), Some(22));
    }

    #[test]
    fn sub_command_optional() {
        // Setup
        let (parser, interface) = compile(&pqr_stu(), &no_environment());

        // Execute
        let args = parser.parse_tokens(&[]).unwrap();

        // Verify
        assert!(args.handler().is_none());
        assert_eq!(interface.consume(), (None, None));
    }

    #[test]
    fn sub_command_required() {
        // Setup
        let spec = CliSpec::new("program").subcommands(
            SubcmdGroup::new([SubcmdSpec::new("pqr", handler_a)]).required(true),
        );
        let (parser, interface) = compile(&spec, &no_environment());

        // Execute
        let exit_code = parser.parse_tokens(&[]).unwrap_err();

        // Verify
        assert_eq!(exit_code, 2);
        let error = interface.consume_error();
        assert_contains!(error, "error:");
        assert_contains!(error, "Usage: program");
    }

    #[rstest]
    #[case(vec![
        SubcmdSpec::new("pqr", handler_a),
        SubcmdSpec::new("pqr", handler_b),
    ], "pqr")]
    #[case(vec![
        SubcmdSpec::new("pqr", handler_a).alias("stu"),
        SubcmdSpec::new("stu", handler_b),
    ], "stu")]
    #[case(vec![
        SubcmdSpec::new("pqr", handler_a).alias("x"),
        SubcmdSpec::new("stu", handler_b).alias("x"),
    ], "x")]
    fn duplicate_sub_command(#[case] subcmdspecs: Vec<SubcmdSpec>, #[case] expected: &str) {
        // Setup
        let spec = CliSpec::new("program").subcommands(SubcmdGroup::new(subcmdspecs));

        // Execute
        let result = spec.compile_with(&no_environment()).unwrap_err();

        // Verify
        assert_eq!(result, ConfigError::DuplicateSubcommand(expected.to_string()));
    }

    #[rstest]
    #[case(CliSpec::new("program")
        .arg(ArgSpec::new(["--name"]))
        .arg(ArgSpec::new(["--name"]).dest("other")), "program", "--name")]
    #[case(CliSpec::new("program")
        .arg(ArgSpec::new(["-n", "--name"]))
        .arg(ArgSpec::new(["-n", "--nom"])), "program", "-n")]
    #[case(CliSpec::new("program").arg(ArgSpec::new(["-h", "--host"])), "program", "-h")]
    #[case(CliSpec::new("program").version("1.0").arg(ArgSpec::new(["--version"]).dest("v")), "program", "--version")]
    #[case(CliSpec::new("program").subcommands(SubcmdGroup::new([
        SubcmdSpec::new("pqr", handler_a)
            .arg(ArgSpec::new(["--name"]))
            .arg(ArgSpec::new(["--name"]).dest("other")),
    ])), "pqr", "--name")]
    fn conflicting_flag(#[case] spec: CliSpec, #[case] program: &str, #[case] flag: &str) {
        // Execute
        let result = spec.compile_with(&no_environment()).unwrap_err();

        // Verify
        assert_eq!(
            result,
            ConfigError::ConflictingFlag {
                program: program.to_string(),
                flag: flag.to_string(),
            }
        );
    }

    #[test]
    fn conflicting_dest() {
        // Setup
        let spec = CliSpec::new("program")
            .arg(ArgSpec::new(["name"]))
            .arg(ArgSpec::new(["--name"]));

        // Execute
        let result = spec.compile_with(&no_environment()).unwrap_err();

        // Verify
        assert_matches!(result, ConfigError::ConflictingDest { dest, .. } => {
            assert_eq!(dest, "name");
        });
    }

    #[test]
    fn same_flag_across_sub_commands() {
        // Setup
        let spec = CliSpec::new("program")
            .arg(ArgSpec::new(["--name"]))
            .subcommands(SubcmdGroup::new([
                SubcmdSpec::new("pqr", handler_a).arg(ArgSpec::new(["--name"])),
                SubcmdSpec::new("stu", handler_b).arg(ArgSpec::new(["--name"])),
            ]));

        // Execute & verify
        spec.compile_with(&no_environment()).unwrap();
    }

    #[rstest]
    #[case("")]
    #[case("A=B")]
    fn invalid_prefix(#[case] prefix: &str) {
        // Setup
        let spec = CliSpec::new("program").envvar_prefix(prefix);

        // Execute
        let result = spec.compile_with(&no_environment()).unwrap_err();

        // Verify
        assert_eq!(result, ConfigError::InvalidPrefix(prefix.to_string()));
    }

    #[rstest]
    #[case(vec![], None, Some(5))]
    #[case(vec!["--level", "7"], Some("3"), Some(7))]
    #[case(vec![], Some("3"), Some(3))]
    fn environment_fallback(
        #[case] tokens: Vec<&str>,
        #[case] env_value: Option<&str>,
        #[case] expected: Option<u32>,
    ) {
        // Setup
        let mut store = no_environment();
        if let Some(value) = env_value {
            store.insert("APP_LEVEL".to_string(), value.to_string());
        }
        let spec = CliSpec::new("program").envvar_prefix("APP").arg(
            ArgSpec::new(["--level"])
                .value_parser(value_parser!(u32))
                .default_value("5"),
        );
        let (parser, _) = compile(&spec, &store);

        // Execute
        let args = parser.parse_tokens(tokens.as_slice()).unwrap();

        // Verify
        assert_eq!(args.value::<u32>("level").copied(), expected);
    }

    #[rstest]
    #[case(vec![], "1", true)]
    #[case(vec![], "yes", true)]
    #[case(vec![], "0", false)]
    #[case(vec!["-v"], "0", true)]
    fn environment_switch(
        #[case] tokens: Vec<&str>,
        #[case] env_value: &str,
        #[case] expected: bool,
    ) {
        // Setup
        let store = HashMap::from([("APP_VERBOSE".to_string(), env_value.to_string())]);
        let spec = CliSpec::new("program")
            .envvar_prefix("APP")
            .arg(ArgSpec::new(["-v", "--verbose"]).action(Action::StoreTrue));
        let (parser, interface) = compile(&spec, &store);

        // Execute
        let args = parser.parse_tokens(tokens.as_slice()).unwrap();

        // Verify
        assert_eq!(args.flag("verbose"), expected);
        assert_eq!(interface.consume(), (None, None));
    }

    #[test]
    fn invalid_nargs() {
        // Setup
        let pqr = SubcmdSpec::new("pqr", handler_a)
            .arg(ArgSpec::new(["item"]).nargs(Nargs::Precisely(0)));
        let spec = CliSpec::new("program").subcommands(SubcmdGroup::new([pqr]));

        // Execute
        let result = spec.compile_with(&no_environment()).unwrap_err();

        // Verify
        assert_matches!(result, ConfigError::InvalidNargs { dest, .. } => {
            assert_eq!(dest, "item");
        });
    }

    #[rstest]
    #[case(vec!["stu"], None, None)]
    #[case(vec!["stu"], Some("abc"), Some("abc"))]
    #[case(vec!["stu", "--name", "def"], Some("abc"), Some("def"))]
    fn environment_fallback_sub_command(
        #[case] tokens: Vec<&str>,
        #[case] env_value: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        // Setup
        let mut store = no_environment();
        if let Some(value) = env_value {
            store.insert("APP_NAME".to_string(), value.to_string());
        }
        let spec = CliSpec::new("program")
            .envvar_prefix("APP")
            .subcommands(SubcmdGroup::new([
                SubcmdSpec::new("stu", handler_b).arg(ArgSpec::new(["--name"])),
            ]));
        let (parser, _) = compile(&spec, &store);

        // Execute
        let args = parser.parse_tokens(tokens.as_slice()).unwrap();

        // Verify
        assert_eq!(args.value::<String>("name").map(String::as_str), expected);
    }

    #[rstest]
    #[case(vec![], Some("abc"), Ok("abc"))]
    #[case(vec!["--name", "def"], None, Ok("def"))]
    #[case(vec![], None, Err(2))]
    fn required_environment(
        #[case] tokens: Vec<&str>,
        #[case] env_value: Option<&str>,
        #[case] expected: Result<&str, i32>,
    ) {
        // Setup
        let mut store = no_environment();
        if let Some(value) = env_value {
            store.insert("APP_NAME".to_string(), value.to_string());
        }
        let spec = CliSpec::new("program")
            .envvar_prefix("APP")
            .arg(ArgSpec::new(["-n", "--name"]).required(true).help("The name."));
        let (parser, interface) = compile(&spec, &store);

        // Execute
        let result = parser.parse_tokens(tokens.as_slice());

        // Verify
        match expected {
            Ok(value) => {
                let args = result.unwrap();
                assert_eq!(args.value::<String>("name").unwrap(), value);
                assert_eq!(interface.consume(), (None, None));
            }
            Err(exit_code) => {
                assert_eq!(result.unwrap_err(), exit_code);
                let error = interface.consume_error();
                assert_contains!(error, "the following arguments are required: -n/--name");
            }
        }
    }

    #[test]
    fn required_environment_sub_command() {
        // Setup
        let spec = CliSpec::new("program")
            .envvar_prefix("APP")
            .subcommands(SubcmdGroup::new([SubcmdSpec::new("pqr", handler_a)
                .arg(ArgSpec::new(["--token"]).required(true))]));
        let (parser, interface) = compile(&spec, &no_environment());

        // Execute
        let exit_code = parser.parse_tokens(&["pqr"]).unwrap_err();

        // Verify
        assert_eq!(exit_code, 2);
        assert_contains!(
            interface.consume_error(),
            "the following arguments are required: --token"
        );
    }

    #[test]
    fn required_without_environment() {
        // Setup
        let spec = CliSpec::new("program").arg(ArgSpec::new(["--name"]).required(true));
        let (parser, interface) = compile(&spec, &no_environment());

        // Execute
        let exit_code = parser.parse_tokens(&[]).unwrap_err();

        // Verify
        assert_eq!(exit_code, 2);
        assert_contains!(interface.consume_error(), "--name");
    }

    #[test]
    fn help_annotations() {
        // Setup
        let store = HashMap::from([("APP_LEVEL".to_string(), "3".to_string())]);
        let spec = CliSpec::new("program")
            .width(200)
            .about("abc def")
            .envvar_prefix("APP")
            .arg(ArgSpec::new(["-n", "--name"]).required(true).help("The name."))
            .arg(ArgSpec::new(["--level"]).help("The level (0-9)"))
            .arg(ArgSpec::new(["--quiet"]).action(Action::StoreTrue));
        let (parser, interface) = compile(&spec, &store);

        // Execute
        let exit_code = parser.parse_tokens(&["--help"]).unwrap_err();

        // Verify
        assert_eq!(exit_code, 0);
        let message = interface.consume_message();
        assert_contains!(message, "abc def");
        assert_contains!(message, "Usage: program [OPTIONS]");
        assert_contains!(message, "The name. (required, environment variable: APP_NAME)");
        assert_contains!(
            message,
            "The level (0-9, environment variable: APP_LEVEL) [default: 3]"
        );
        assert_contains!(message, "--quiet");
    }

    #[test]
    fn help_sub_command() {
        // Setup
        let spec = CliSpec::new("program")
            .width(100)
            .envvar_prefix("APP")
            .subcommands(
                SubcmdGroup::new([
                    SubcmdSpec::new("pqr", handler_a).help("The pqr sub-command."),
                    SubcmdSpec::new("stu", handler_b)
                        .help("The stu sub-command.")
                        .arg(ArgSpec::new(["item"]).nargs(Nargs::Any).help("The items.")),
                ])
                .help("Actions")
                .metavar("ACTION"),
            );
        let (parser, interface) = compile(&spec, &no_environment());

        // Execute
        let root_exit_code = parser.parse_tokens(&["--help"]).unwrap_err();
        let root_message = interface.consume_message();
        let sub_exit_code = parser.parse_tokens(&["stu", "--help"]).unwrap_err();
        let sub_message = interface.consume_message();

        // Verify
        assert_eq!(root_exit_code, 0);
        assert_contains!(root_message, "Usage: program [ACTION]");
        assert_contains!(root_message, "Actions:");
        assert_contains!(root_message, "The pqr sub-command.");
        assert_contains!(root_message, "The stu sub-command.");
        assert_eq!(sub_exit_code, 0);
        assert_contains!(sub_message, "The stu sub-command.");
        assert_contains!(sub_message, "The items. (environment variable: APP_ITEM)");
    }

    #[test]
    fn help_twice_identical() {
        // Setup
        let spec = pqr_stu()
            .envvar_prefix("APP")
            .arg(ArgSpec::new(["--name"]).required(true).help("The name."));

        // Execute
        let first = spec.compile_with(&no_environment()).unwrap().help();
        let second = spec.compile_with(&no_environment()).unwrap().help();

        // Verify
        assert_eq!(first, second);
    }

    #[test]
    fn version() {
        // Setup
        let spec = CliSpec::new("program").version("1.2.3");
        let (parser, interface) = compile(&spec, &no_environment());

        // Execute
        let exit_code = parser.parse_tokens(&["--version"]).unwrap_err();

        // Verify
        assert_eq!(exit_code, 0);
        assert_contains!(interface.consume_message(), "program 1.2.3");
    }

    #[test]
    fn epilog() {
        // Setup
        let spec = CliSpec::new("program").epilog("See the manual.");

        // Execute
        let help = spec.compile_with(&no_environment()).unwrap().help();

        // Verify
        assert_contains!(help, "See the manual.");
    }

    #[rstest]
    #[case(vec!["--other", "-x"], vec!["--other", "-x"], None)]
    #[case(vec!["--name", "abc", "--other"], vec!["--other"], Some("abc"))]
    #[case(vec!["stu", "--other=1", "--name", "abc"], vec!["--other=1"], Some("abc"))]
    fn unknown_args(
        #[case] tokens: Vec<&str>,
        #[case] expected_unknown: Vec<&str>,
        #[case] expected_name: Option<&str>,
    ) {
        // Setup
        let spec = CliSpec::new("program")
            .reject_unknown_args(false)
            .arg(ArgSpec::new(["--name"]))
            .subcommands(SubcmdGroup::new([SubcmdSpec::new("stu", handler_b)
                .arg(ArgSpec::new(["--name"]).dest("sub_name"))]));
        let (parser, _) = compile(&spec, &no_environment());

        // Execute
        let args = parser.parse_tokens(tokens.as_slice()).unwrap();

        // Verify
        assert_eq!(args.unknown(), expected_unknown.as_slice());
        let name = args
            .value::<String>("name")
            .or_else(|| args.value::<String>("sub_name"));
        assert_eq!(name.map(String::as_str), expected_name);
    }

    #[test]
    fn unknown_args_rejected() {
        // Setup
        let spec = CliSpec::new("program").arg(ArgSpec::new(["--name"]));
        let (parser, interface) = compile(&spec, &no_environment());

        // Execute
        let exit_code = parser.parse_tokens(&["--other"]).unwrap_err();

        // Verify
        assert_eq!(exit_code, 2);
        assert_contains!(interface.consume_error(), "--other");
    }

    #[test]
    fn introspection() {
        // Setup
        let store = HashMap::from([("APP_NAME".to_string(), "abc".to_string())]);
        let spec = CliSpec::new("program")
            .envvar_prefix("APP")
            .arg(ArgSpec::new(["-n", "--name"]).required(true))
            .arg(ArgSpec::new(["--max-count"]))
            .arg(ArgSpec::new(["item"]).nargs(Nargs::Any));
        let (parser, _) = compile(&spec, &store);
        let args = parser.parse_tokens(&["--max-count", "3"]).unwrap();

        // Execute & verify
        assert_eq!(spec.arg_names().unwrap(), vec!["name", "max_count", "item"]);
        assert_eq!(
            spec.name_value_pairs(&args).unwrap(),
            vec![
                ("name".to_string(), Some(vec!["abc".to_string()])),
                ("max_count".to_string(), Some(vec!["3".to_string()])),
                ("item".to_string(), None),
            ]
        );

        let required: Vec<String> = spec
            .env_vars_with(Some(true), &store)
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(required, vec!["APP_NAME"]);

        let all = spec.env_vars_with(None, &store).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].value(), Some("abc"));
        assert_eq!(all[1].name(), "APP_MAX_COUNT");
        assert_eq!(all[1].value(), None);

        let optional = spec.env_vars_with(Some(false), &store).unwrap();
        assert_eq!(optional.len(), 2);
    }

    #[test]
    fn parser_env_vars() {
        // Setup
        let store = HashMap::from([("APP_TOKEN".to_string(), "abc".to_string())]);
        let spec = CliSpec::new("program")
            .envvar_prefix("APP")
            .arg(ArgSpec::new(["--name"]))
            .subcommands(SubcmdGroup::new([
                SubcmdSpec::new("pqr", handler_a).arg(ArgSpec::new(["--token"])),
            ]));

        // Execute
        let (parser, _) = compile(&spec, &store);

        // Verify
        assert_eq!(
            parser.env_vars(),
            &[
                EnvVar::new("APP_NAME", None),
                EnvVar::new("APP_TOKEN", Some("abc".to_string())),
            ]
        );
    }

    #[test]
    fn introspection_without_prefix() {
        let spec = CliSpec::new("program").arg(ArgSpec::new(["--name"]));
        assert_eq!(spec.env_vars_with(None, &no_environment()).unwrap(), vec![]);
    }

    #[test]
    #[cfg(feature = "unit_test")]
    fn test_parser() {
        // Setup
        let sub = SubcmdSpec::new("pqr", handler_a)
            .arg(ArgSpec::new(["value"]).value_parser(value_parser!(u32)));
        let parser = sub.test_parser().unwrap();

        // Execute
        let args = parser.parse_tokens(&["2"]).unwrap();

        // Verify
        assert_eq!(args.value::<u32>("value"), Some(&2));
    }
}
