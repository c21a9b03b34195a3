//! `declarg` turns a declarative command line description into a [`clap`] parser.
//!
//! Rather than building parsers imperatively, describe the program as data:
//! * A [`CliSpec`] holds the program's top level arguments ([`ArgSpec`]).
//! * An optional [`SubcmdGroup`] holds the sub-commands ([`SubcmdSpec`]), each with its own arguments and handler function.
//! * An optional environment variable prefix lets every argument fall back onto the environment when absent from the command line.
//!
//! Compiling the description checks it for mistakes (ex: a repeated sub-command name), and produces a [`Parser`].
//! The help message is annotated to show which arguments are required, and which environment variable backs each argument.
//!
//! # Usage
//! ```no_run
#![doc = include_str!("../demos/subcommands.rs")]
//! ```
//!
//! ```console
//! $ calc -h
//! A small calculator, organized into sub-commands.
//!
//! Usage: calc [OPTIONS] <COMMAND>
//!
//! Operations:
//!   sum   Sum the items. [aliases: add]
//!   echo  Repeat the words.
//!
//! Options:
//!   -v, --verbose  Explain what is happening.
//!   -h, --help     Print help
//!   -V, --version  Print version
//!
//! $ calc add 1 2 3
//! Sum: 6
//! ```
//!
//! # Arguments
//! An [`ArgSpec`] is declared by its flags, either a single positional name (ex: `item`) or one or more option flags (ex: `-v`, `--verbose`).
//! Its *destination*, under which the parsed value is looked up, is derived from the flags:
//! the first long flag with `-` replaced by `_` (ex: `--max-count` becomes `max_count`), otherwise the first short flag, otherwise the positional name.
//!
//! Values are converted via `clap` value parsers (see [`clap::value_parser!`], and [`convert`] for additional converters).
//! Look the values up on the [`ParsedArgs`] by destination.
//!
//! # Environment variables
//! With the prefix `P`, the argument with destination `xyz` falls back onto the environment variable `P_XYZ`.
//! When set, the variable's value replaces the declared default.
//! A required argument may be satisfied by its environment variable; its requirement is checked after parsing.
//!
//! ```no_run
#![doc = include_str!("../demos/environment.rs")]
//! ```
//!
//! ```console
//! $ deploy -h
//! Deploy the service.
//!
//! Usage: deploy [OPTIONS]
//!
//! Options:
//!       --token <token>            The access token. (required, environment variable: DEPLOY_TOKEN)
//!   -r, --region <region>          The target region. (environment variable: DEPLOY_REGION) [default: us]
//! <truncated>
//!
//! $ deploy
//! error: the following arguments are required: --token
//! ```
//!
//! # Unknown arguments
//! By default, options that are not declared are rejected.
//! With [`CliSpec::reject_unknown_args`] set to `false`, they are instead set aside and made available via [`ParsedArgs::unknown`].
//!
//! # Features
//! * `unit_test`: exposes [`SubcmdSpec::test_parser`](./struct.SubcmdSpec.html#method.test_parser), for testing a sub-command's declaration in isolation.
//! * `tracing_debug`: emits `tracing` debug events during compilation and parsing.
pub use declarg_builder::*;
