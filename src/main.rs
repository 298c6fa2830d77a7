mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use cli::{
    Cli, EXIT_FAILURE, build_invocation, exit_status, init_config, print_usage, resolve_config,
    stdout_text,
};
use webos_remote::credential::FileCredentialStore;
use webos_remote::driver::{self, DriverConfig, RunResult};
use webos_remote::logging;
use webos_remote::ssap::Outcome;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if cli.init {
        return match init_config(cli.config_path()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{:#}", e);
                ExitCode::from(EXIT_FAILURE)
            }
        };
    }

    if cli.cmd.is_none() {
        print_usage();
    }

    let result = run(&cli).await;
    report(&result);
    if let Some(text) = stdout_text(&result) {
        println!("{}", text);
    }
    ExitCode::from(exit_status(&result))
}

async fn run(cli: &Cli) -> anyhow::Result<RunResult> {
    let invocation = build_invocation(cli)?;
    let config = resolve_config(cli)?;
    let store = FileCredentialStore::new(config.key_file());

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // no signal handler; only completion or failure ends the run
            std::future::pending::<()>().await;
        }
    };

    let result = driver::run(&DriverConfig::from(&config), invocation, store, shutdown).await?;
    Ok(result)
}

fn report(result: &anyhow::Result<RunResult>) {
    match result {
        Ok(RunResult::Completed(Outcome::Acknowledged { command })) => {
            info!("Command {} request sent/acknowledged.", command);
        }
        Ok(RunResult::Completed(Outcome::KeyInitialized)) => {
            info!("Key initialized and saved to file.");
        }
        Ok(RunResult::Completed(Outcome::Query { .. })) => {}
        Ok(RunResult::Interrupted) => info!("Interrupted"),
        Err(e) => error!("{:#}", e),
    }
}
