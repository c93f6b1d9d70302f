//! `-v` / `CREDO_LOG_LEVEL`: how chatty the server is.
//!
//! The flag counts (`-vvv`), the env var takes either the same count or a
//! level name. Both end up as an index into [`LEVELS`].

use clap::{builder::ValueParser, Arg, ArgAction, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order; index 0 is the default.
pub const LEVELS: [(&str, Level); 5] = [
    ("error", Level::ERROR),
    ("warn", Level::WARN),
    ("info", Level::INFO),
    ("debug", Level::DEBUG),
    ("trace", Level::TRACE),
];

/// Parse a verbosity given as a count (`0`..`4`) or a level name.
///
/// # Errors
/// Returns a message listing the accepted names.
pub fn parse_verbosity(value: &str) -> Result<u8, String> {
    let value = value.trim();

    let index = match value.parse::<usize>() {
        Ok(count) if count < LEVELS.len() => Some(count),
        Ok(_) => None,
        Err(_) => LEVELS
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(value)),
    };

    index.and_then(|i| u8::try_from(i).ok()).ok_or_else(|| {
        let names: Vec<&str> = LEVELS.iter().map(|(name, _)| *name).collect();
        format!(
            "invalid log level {value:?}, expected 0-{} or one of: {}",
            LEVELS.len() - 1,
            names.join(", ")
        )
    })
}

/// Tracing level for a verbosity index. `None` keeps the subscriber default
/// (errors only); counts past the table saturate at `TRACE`.
#[must_use]
pub fn tracing_level(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        n => LEVELS
            .get(usize::from(n))
            .map_or(Some(Level::TRACE), |(_, level)| Some(*level)),
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("CREDO_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_verbosity)),
    )
}
