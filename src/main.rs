use std::process::ExitCode;

use clap::Parser;
use jira_roaster::Cli;
use log::error;

#[tokio::main]
async fn main() -> ExitCode {
    jira_roaster::init_logging();
    match jira_roaster::run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", jira_roaster::error_chain(&err));
            ExitCode::FAILURE
        }
    }
}
