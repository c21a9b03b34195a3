use std::sync::OnceLock;

use regex::Regex;
use terminal_size::{terminal_size, Width};

use crate::api::EnvVar;
use crate::constant::*;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// The help/requirement/default of an argument, after accounting for its requirement and environment variable.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Enhanced {
    pub(crate) help: Option<String>,
    pub(crate) required: bool,
    pub(crate) deferred: bool,
    pub(crate) default: Option<String>,
}

/// Enhance the declared help/requirement/default of an argument.
///
/// * A required argument that also has a default (or environment variable) is not required by the parser.
/// Supplying it is not necessary, so the requirement is `deferred` until after parsing.
/// * The help of a required argument is annotated with `required`.
/// * The help of an argument with an environment variable is annotated with the variable's name.
/// * When the environment variable is set, its value replaces the default.
pub(crate) fn enhance(
    help: Option<&str>,
    required: bool,
    default: Option<&str>,
    env_var: Option<&EnvVar>,
) -> Enhanced {
    let deferred = required && (default.is_some() || env_var.is_some());
    let mut help = help.map(str::to_string);

    if required {
        help = help.map(|h| annotate(&h, REQUIRED_ANNOTATION));
    }

    if let Some(env_var) = env_var {
        help = help.map(|h| {
            annotate(
                &h,
                &format!("{ENVIRONMENT_ANNOTATION}: {name}", name = env_var.name()),
            )
        });
    }

    let default = match env_var.and_then(EnvVar::value) {
        Some(value) => {
            #[cfg(feature = "tracing_debug")]
            {
                debug!(
                    "Environment variable '{}' replaces the default.",
                    env_var.map(EnvVar::name).unwrap_or_default()
                );
            }

            Some(value.to_string())
        }
        None => default.map(str::to_string),
    };

    Enhanced {
        help,
        required: required && !deferred,
        deferred,
        default,
    }
}

/// Add a parenthesized annotation to a help message.
///
/// When the help message already ends with a parenthesized group, the annotation joins that group.
pub(crate) fn annotate(help: &str, annotation: &str) -> String {
    match trailing_group().captures(help) {
        Some(captures) => {
            let start = captures.get(0).map(|m| m.start()).unwrap_or(help.len());
            let inner = captures.get(1).map(|m| m.as_str()).unwrap_or_default();

            if inner.is_empty() {
                format!("{}({annotation})", &help[..start])
            } else {
                format!("{}({inner}{ANNOTATION_SEPARATOR}{annotation})", &help[..start])
            }
        }
        None => format!("{help} ({annotation})"),
    }
}

fn trailing_group() -> &'static Regex {
    static TRAILING_GROUP: OnceLock<Regex> = OnceLock::new();
    TRAILING_GROUP.get_or_init(|| {
        Regex::new(r"\(([^()]*)\)$").expect("internal error - trailing group pattern must compile")
    })
}

/// Select the help width: the explicit width, otherwise the width of the terminal (if there is one).
pub(crate) fn help_width(explicit: Option<usize>) -> Option<usize> {
    let width = explicit.or_else(|| {
        if let Some((Width(terminal_width), _)) = terminal_size() {
            Some(terminal_width as usize)
        } else {
            None
        }
    });

    #[cfg(feature = "tracing_debug")]
    {
        debug!("Selecting help width: {width:?}.");
    }

    width
}
