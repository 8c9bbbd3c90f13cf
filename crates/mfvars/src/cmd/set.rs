use tokio_util::sync::CancellationToken;

use crate::cmd::{read_all, Session, SetArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_sent, print_variables, OutputFormat};

pub fn run(args: SetArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let requests = session.connect(CancellationToken::new())?;
    requests
        .set(&args.expr)
        .map_err(|err| client_error("set failed", err))?;
    print_sent(requests.channels(), &args.expr, format);

    if !args.read.is_empty() {
        let rows = read_all(&requests, &args.read)?;
        print_variables(requests.channels(), None, &rows, format);
    }
    Ok(SUCCESS)
}
