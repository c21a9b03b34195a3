use std::collections::HashMap;

use crate::constant::*;
use crate::parser::Shape;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

#[derive(Debug, PartialEq, Eq)]
enum Token {
    // A declared option; `expects_value` when the value follows as the next token.
    Known { expects_value: bool },
    Unknown,
    Plain,
}

/// Separates the option tokens which are not declared anywhere in a `CliSpec`.
///
/// Only option-like tokens (`-x`, `--xyz`, `--xyz=value`) are candidates.
/// Everything after the `--` terminator is left for the parser.
#[derive(Debug)]
pub(crate) struct TokenPartitioner {
    longs: HashMap<String, bool>,
    shorts: HashMap<char, bool>,
}

impl TokenPartitioner {
    pub(crate) fn new(with_version: bool) -> Self {
        let mut partitioner = Self {
            longs: HashMap::default(),
            shorts: HashMap::default(),
        };
        partitioner.longs.insert(HELP_NAME.to_string(), false);
        partitioner.shorts.insert(HELP_SHORT, false);

        if with_version {
            partitioner.longs.insert(VERSION_NAME.to_string(), false);
            partitioner.shorts.insert(VERSION_SHORT, false);
        }

        partitioner
    }

    pub(crate) fn register(&mut self, shape: &Shape) {
        if let Shape::Option {
            longs,
            shorts,
            takes_value,
        } = shape
        {
            for long in longs {
                *self.longs.entry(long.clone()).or_default() |= *takes_value;
            }

            for short in shorts {
                *self.shorts.entry(*short).or_default() |= *takes_value;
            }
        }
    }

    /// Partition the tokens into `(known, unknown)`, preserving their relative order.
    pub(crate) fn partition(&self, tokens: &[&str]) -> (Vec<String>, Vec<String>) {
        let mut known = Vec::default();
        let mut unknown = Vec::default();
        let mut iter = tokens.iter();

        while let Some(token) = iter.next() {
            if *token == "--" {
                known.push(token.to_string());
                known.extend(iter.by_ref().map(|t| t.to_string()));
                break;
            }

            match self.classify(token) {
                Token::Known { expects_value } => {
                    known.push(token.to_string());

                    if expects_value {
                        if let Some(value) = iter.next() {
                            known.push(value.to_string());
                        }
                    }
                }
                Token::Unknown => {
                    #[cfg(feature = "tracing_debug")]
                    {
                        debug!("Setting aside unknown token '{token}'.");
                    }

                    unknown.push(token.to_string());
                }
                Token::Plain => known.push(token.to_string()),
            }
        }

        (known, unknown)
    }

    fn classify(&self, token: &str) -> Token {
        if let Some(long) = token.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };

            match self.longs.get(name) {
                Some(takes_value) => Token::Known {
                    expects_value: *takes_value && inline.is_none(),
                },
                None => Token::Unknown,
            }
        } else if let Some(cluster) = token.strip_prefix('-') {
            if cluster.is_empty() || token.parse::<f64>().is_ok() {
                return Token::Plain;
            }

            let mut chars = cluster.chars();
            let short = chars.next().expect("internal error - cluster must not be empty");

            match self.shorts.get(&short) {
                Some(takes_value) => Token::Known {
                    expects_value: *takes_value && chars.next().is_none(),
                },
                None => Token::Unknown,
            }
        } else {
            Token::Plain
        }
    }
}
