mod commands;
mod terminal;

use std::process::ExitCode;

use commands::CommandLine;
use terminal::logging::init_logging;
use terminal::print;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match CommandLine::try_parse_args() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // `--help` and `--version` are not failures.
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging();
    print::banner();

    let result = match cli.load_config() {
        Ok(config) => commands::scan::scan(config).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => {
            print::end_of_program();
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

/// Prints the error and each cause not already spelled out by its parent.
fn report_failure(err: &anyhow::Error) {
    let mut shown: String = err.to_string();
    error!("{shown}");
    for cause in err.chain().skip(1) {
        let text: String = cause.to_string();
        if !shown.contains(&text) {
            error!("  caused by: {text}");
        }
        shown = text;
    }
}
