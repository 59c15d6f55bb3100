use clap::Parser;
use dotenvy::dotenv;
use sm_cli::{Cli, CliError, execute};
use sm_common::{
    logging::{init_tracing_subscriber, install_tracing_panic_hook},
    run_id,
};

const APP_NAME: &str = "sm-match";

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing::debug!(run_id = run_id::get(), command = ?cli.command, "starting");
    let output = execute(cli).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing_subscriber(APP_NAME);
    install_tracing_panic_hook(APP_NAME);

    if let Err(err) = run().await {
        tracing::error!(error = %err, "sm-match failed");
        std::process::exit(1);
    }
}
