//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action to run, such as starting the
//! HTTP server with its storage configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{storage, ARG_LISTEN, ARG_PORT};
use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv6Addr};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(3000);
    let listen = matches
        .get_one::<IpAddr>(ARG_LISTEN)
        .copied()
        .unwrap_or(IpAddr::V6(Ipv6Addr::UNSPECIFIED));

    let storage_opts = storage::Options::parse(matches).context("invalid storage options")?;

    Ok(Action::Server(Args {
        port,
        listen,
        backend: storage_opts.backend,
        bcrypt_cost: storage_opts.bcrypt_cost,
    }))
}
