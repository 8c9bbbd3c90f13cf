use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use mfvars_client::{
    FixedChannels, HandshakeConfig, NegotiatedChannels, RequestConfig, VariableRequests,
};
use mfvars_transport::LoopbackTransport;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::{OutputFormat, VariableRow};

pub mod get;
pub mod set;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read variables once and print them.
    Get(GetArgs),
    /// Execute a write expression.
    Set(SetArgs),
    /// Read variables repeatedly until interrupted.
    Watch(WatchArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, session: &Session, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Get(args) => get::run(args, session, format),
        Command::Set(args) => set::run(args, session, format),
        Command::Watch(args) => watch::run(args, session, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Variable expressions, e.g. "(A:PLANE ALTITUDE,Feet)".
    #[arg(required = true, value_name = "EXPR")]
    pub exprs: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Write expression, e.g. "1 (>L:A32NX_COCKPIT_DOOR_LOCKED)".
    #[arg(value_name = "EXPR")]
    pub expr: String,
    /// Read these variables after the write and print them.
    #[arg(long, value_name = "EXPR")]
    pub read: Vec<String>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Variable expressions to poll.
    #[arg(required = true, value_name = "EXPR")]
    pub exprs: Vec<String>,
    /// Pause between two readings (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Exit after N readings.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Connection settings shared by every subcommand that talks to the module.
#[derive(Debug, Clone)]
pub struct Session {
    pub client_name: String,
    pub negotiate: bool,
    pub handshake_timeout: Duration,
    pub seeds: Vec<(String, f32)>,
}

impl Session {
    /// Build the loopback module and connect an engine to it.
    pub fn connect(
        &self,
        cancel: CancellationToken,
    ) -> CliResult<VariableRequests<LoopbackTransport>> {
        let transport = self
            .seeds
            .iter()
            .fold(LoopbackTransport::new(), |transport, (name, value)| {
                transport.with_value(name, *value)
            });
        let transport = Arc::new(transport);

        let result = if self.negotiate {
            let handshake = HandshakeConfig {
                timeout: Some(self.handshake_timeout),
                cancel,
                ..HandshakeConfig::new(self.client_name.as_str())
            };
            VariableRequests::connect(
                transport,
                NegotiatedChannels::new(handshake),
                RequestConfig::default(),
            )
        } else {
            VariableRequests::connect(
                transport,
                FixedChannels::default(),
                RequestConfig::default(),
            )
        };
        result.map_err(|err| client_error("connect failed", err))
    }
}

/// Read every expression once, in order, and collect printable rows.
pub fn read_all(
    requests: &VariableRequests<LoopbackTransport>,
    exprs: &[String],
) -> CliResult<Vec<VariableRow>> {
    let mut rows: Vec<VariableRow> = Vec::with_capacity(exprs.len());
    for expr in exprs {
        if rows.iter().any(|row| &row.name == expr) {
            continue;
        }
        let value = requests
            .get(expr)
            .map_err(|err| client_error(&format!("get {expr} failed"), err))?;
        debug!(expr, %value, "read");
        if let Some(slot) = requests.slots().into_iter().find(|slot| &slot.name == expr) {
            rows.push(VariableRow::from(&slot));
        }
    }
    Ok(rows)
}

/// Parse `NAME=VALUE` for `--seed`.
pub fn parse_seed(input: &str) -> Result<(String, f32), String> {
    let (name, value) = input
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{input}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("seed name must not be empty".to_string());
    }
    let value: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid seed value: {value}"))?;
    Ok((name.to_string(), value))
}

/// Parse durations like `5s`, `250ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
