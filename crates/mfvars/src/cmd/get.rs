use tokio_util::sync::CancellationToken;

use crate::cmd::{read_all, GetArgs, Session};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_variables, OutputFormat};

pub fn run(args: GetArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let requests = session.connect(CancellationToken::new())?;
    let rows = read_all(&requests, &args.exprs)?;
    print_variables(requests.channels(), None, &rows, format);
    Ok(SUCCESS)
}
