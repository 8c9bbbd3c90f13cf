mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{parse_duration, parse_seed, Command, Session};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "mfvars",
    version,
    about = "Read and write simulator variables through MobiFlight client data areas"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Client name used when negotiating private channels.
    #[arg(
        long,
        value_name = "NAME",
        default_value = "mfvars",
        env = "MFVARS_CLIENT_NAME",
        global = true
    )]
    client_name: String,

    /// Register a private channel set instead of using the well-known one.
    #[arg(long, global = true)]
    negotiate: bool,

    /// Upper bound for the registration handshake (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "5s", global = true)]
    handshake_timeout: String,

    /// Seed a value in the emulated module (repeatable).
    #[arg(long = "seed", value_name = "NAME=VALUE", value_parser = parse_seed, global = true)]
    seeds: Vec<(String, f32)>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = parse_duration(&cli.handshake_timeout).and_then(|handshake_timeout| {
        let session = Session {
            client_name: cli.client_name,
            negotiate: cli.negotiate,
            handshake_timeout,
            seeds: cli.seeds,
        };
        cmd::run(cli.command, &session, format)
    });

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_get_with_seeds() {
        let cli = Cli::try_parse_from([
            "mfvars",
            "--seed",
            "(A:PLANE ALTITUDE,Feet)=1234.5",
            "get",
            "(A:PLANE ALTITUDE,Feet)",
            "(L:A32NX_AUTOPILOT_HEADING_SELECTED)",
        ])
        .expect("get args should parse");

        assert_eq!(cli.seeds.len(), 1);
        assert!(matches!(cli.command, Command::Get(ref args) if args.exprs.len() == 2));
    }

    #[test]
    fn get_requires_an_expression() {
        let err = Cli::try_parse_from(["mfvars", "get"]).expect_err("missing expr should fail");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn rejects_malformed_seed() {
        let err = Cli::try_parse_from(["mfvars", "--seed", "(L:A)", "get", "(L:A)"])
            .expect_err("seed without value should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "mfvars",
            "watch",
            "(L:A)",
            "--count",
            "3",
            "--negotiate",
            "--client-name",
            "Panel",
        ])
        .expect("watch args should parse");

        assert!(cli.negotiate);
        assert_eq!(cli.client_name, "Panel");
        assert!(matches!(cli.command, Command::Watch(ref args) if args.count == Some(3)));
    }
}
