use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cmd::{parse_duration, read_all, Session, WatchArgs};
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_variables, OutputFormat};

const SLEEP_SLICE: Duration = Duration::from_millis(50);

pub fn run(args: WatchArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;

    // Ctrl-C stops the loop and also aborts a pending handshake.
    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let requests = session.connect(cancel.clone())?;

    let mut reading = 0u64;
    while !cancel.is_cancelled() {
        let rows = read_all(&requests, &args.exprs)?;
        reading = reading.saturating_add(1);
        print_variables(requests.channels(), Some(reading), &rows, format);

        if args.count.is_some_and(|count| reading >= count) {
            break;
        }
        sleep_unless_cancelled(interval, &cancel);
    }

    info!(readings = reading, "watch stopped");
    Ok(SUCCESS)
}

fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) {
    let deadline = Instant::now() + duration;
    loop {
        let now = Instant::now();
        if cancel.is_cancelled() || now >= deadline {
            return;
        }
        std::thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

fn install_ctrlc_handler(cancel: CancellationToken) -> CliResult<()> {
    ctrlc::set_handler(move || cancel.cancel()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })
}
