use crate::store::{password, Backend};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_USERS_FILE: &str = "users-file";
pub const ARG_DSN: &str = "dsn";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub backend: Backend,
    pub bcrypt_cost: u32,
}

impl Options {
    /// Parse storage arguments from matches. A `--dsn` takes precedence over
    /// `--users-file`.
    ///
    /// # Errors
    /// Returns an error if the DSN is not a `sqlite:` URL.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let backend = match matches
            .get_one::<String>(ARG_DSN)
            .filter(|v| !v.trim().is_empty())
        {
            Some(dsn) if dsn.starts_with("sqlite:") => Backend::Sqlite(dsn.clone()),
            Some(_) => {
                return Err(anyhow::anyhow!(
                    "unsupported --{ARG_DSN}: only sqlite: URLs are supported"
                ))
            }
            None => Backend::File(
                matches
                    .get_one::<PathBuf>(ARG_USERS_FILE)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_USERS_FILE}"))?,
            ),
        };

        Ok(Self {
            backend,
            bcrypt_cost: matches
                .get_one::<u32>(ARG_BCRYPT_COST)
                .copied()
                .unwrap_or(password::DEFAULT_COST),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_USERS_FILE)
                .short('f')
                .long(ARG_USERS_FILE)
                .help("Path to the credential file")
                .default_value("users.csv")
                .env("CREDO_USERS_FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("SQLite connection string, example: sqlite://credo.db")
                .long_help(
                    "SQLite connection string. When set, credentials are stored in SQLite instead of the credential file.",
                )
                .env("CREDO_DSN"),
        )
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt cost factor (4-31)")
                .default_value("12")
                .env("CREDO_BCRYPT_COST")
                .value_parser(clap::value_parser!(u32).range(4..=31)),
        )
}
