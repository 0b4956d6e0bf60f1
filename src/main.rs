//! sandop - submit URLs to a sandbox scanner and collect the reports

use std::io;

use clap::{CommandFactory, Parser};
use env_logger::{Builder, Env, Target};

mod cli;
mod client;
mod config;
mod error;
mod models;
mod output;
mod scan;

use cli::args::GlobalOptions;
use cli::scan::SubmitOptions;
use cli::{Cli, Commands, ReportCommands, ScanCommands, ScreenshotCommands};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init => cli::init::run(&opts),
        Commands::Status => cli::status::run(&opts),
        Commands::Version => {
            println!("sandop version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Scan(ScanCommands::Submit {
            targets,
            concurrency,
            screenshot_dir,
            no_screenshot,
        }) => {
            let submit = SubmitOptions {
                concurrency: concurrency as usize,
                screenshot_dir,
                no_screenshot,
            };
            cli::scan::submit(&opts, targets, submit).await
        }
        Commands::Report(ReportCommands::Get { report_id }) => {
            cli::report::get(&opts, &report_id).await
        }
        Commands::Report(ReportCommands::Wait { report_id }) => {
            cli::report::wait(&opts, &report_id).await
        }
        Commands::Screenshot(ScreenshotCommands::Get { report_id, out }) => {
            cli::screenshot::get(&opts, &report_id, out).await
        }
        Commands::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "sandop", &mut io::stdout());
            Ok(())
        }
    }
}

/// Log to stderr so stdout stays clean for `--format json`.
///
/// `RUST_LOG` wins over `--debug`.
fn init_logging(debug: bool) {
    let default_filter = if debug { "sandop=debug" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .target(Target::Stderr)
        .format_timestamp(None)
        .init();
}
