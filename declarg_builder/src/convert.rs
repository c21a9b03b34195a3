//! Value converters for use with [`ArgSpec::value_parser`](crate::ArgSpec::value_parser).
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

/// Parse an ISO 8601 date-time with an explicit UTC offset, such as `2024-03-01T12:30:00+01:00`.
///
/// The offset may be written with or without the colon (`+01:00` or `+0100`).
///
/// ### Example
/// ```
/// # use declarg_builder as declarg;
/// use declarg::{convert, ArgSpec, CliSpec};
/// use chrono::{DateTime, FixedOffset};
///
/// let parser = CliSpec::new("program")
///     .arg(ArgSpec::new(["--since"]).value_parser(convert::iso_datetime))
///     .compile()
///     .unwrap();
/// let args = parser.parse_tokens(&["--since", "2024-03-01T12:30:00+01:00"]).unwrap();
/// let since: &DateTime<FixedOffset> = args.value("since").unwrap();
/// assert_eq!(since.to_rfc3339(), "2024-03-01T12:30:00+01:00");
/// ```
pub fn iso_datetime(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    let normalized = offset_colon().replace(value, "$1$2");
    DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%z")
}

fn offset_colon() -> &'static Regex {
    static OFFSET_COLON: OnceLock<Regex> = OnceLock::new();
    OFFSET_COLON.get_or_init(|| {
        Regex::new(r"([+-]\d\d):(\d\d)$").expect("internal error - offset pattern must compile")
    })
}
