pub mod logging;
pub mod storage;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};
use std::net::IpAddr;

pub const ARG_PORT: &str = "port";
pub const ARG_LISTEN: &str = "listen";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("credo")
        .about("Username and password authentication service")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("3000")
                .env("CREDO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_LISTEN)
                .long(ARG_LISTEN)
                .help("Address to bind to")
                .default_value("::")
                .env("CREDO_LISTEN")
                .value_parser(clap::value_parser!(IpAddr)),
        );

    let command = storage::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "credo");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Username and password authentication service".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("CREDO_PORT", None::<&str>),
                ("CREDO_LISTEN", None),
                ("CREDO_USERS_FILE", None),
                ("CREDO_DSN", None),
                ("CREDO_BCRYPT_COST", None),
                ("CREDO_LOG_LEVEL", None),
            ],
            || {
                let matches = new().get_matches_from(vec!["credo"]);

                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(3000));
                assert_eq!(
                    matches.get_one::<IpAddr>(ARG_LISTEN).map(ToString::to_string),
                    Some("::".to_string())
                );
                assert_eq!(
                    matches.get_one::<PathBuf>(storage::ARG_USERS_FILE).cloned(),
                    Some(PathBuf::from("users.csv"))
                );
                assert_eq!(matches.get_one::<String>(storage::ARG_DSN), None);
                assert_eq!(
                    matches.get_one::<u32>(storage::ARG_BCRYPT_COST).copied(),
                    Some(12)
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(0)
                );
            },
        );
    }

    #[test]
    fn test_check_args() {
        let matches = new().get_matches_from(vec![
            "credo",
            "--port",
            "8080",
            "--listen",
            "127.0.0.1",
            "--users-file",
            "/tmp/credo-users.csv",
            "--bcrypt-cost",
            "10",
        ]);

        assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
        assert_eq!(
            matches.get_one::<IpAddr>(ARG_LISTEN).map(ToString::to_string),
            Some("127.0.0.1".to_string())
        );
        assert_eq!(
            matches.get_one::<PathBuf>(storage::ARG_USERS_FILE).cloned(),
            Some(PathBuf::from("/tmp/credo-users.csv"))
        );
        assert_eq!(
            matches.get_one::<u32>(storage::ARG_BCRYPT_COST).copied(),
            Some(10)
        );
    }

    #[test]
    fn test_bcrypt_cost_out_of_range() {
        for cost in ["3", "32", "abc"] {
            let result = new().try_get_matches_from(vec!["credo", "--bcrypt-cost", cost]);
            assert!(result.is_err(), "cost {cost} should be rejected");
        }
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("CREDO_PORT", Some("443")),
                ("CREDO_LISTEN", Some("0.0.0.0")),
                ("CREDO_DSN", Some("sqlite://credo.db")),
                ("CREDO_BCRYPT_COST", Some("6")),
                ("CREDO_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["credo"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
                assert_eq!(
                    matches.get_one::<IpAddr>(ARG_LISTEN).map(ToString::to_string),
                    Some("0.0.0.0".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(storage::ARG_DSN).cloned(),
                    Some("sqlite://credo.db".to_string())
                );
                assert_eq!(
                    matches.get_one::<u32>(storage::ARG_BCRYPT_COST).copied(),
                    Some(6)
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("CREDO_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["credo"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5_usize {
            temp_env::with_vars([("CREDO_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["credo".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }
}
