use clap::Parser;
use matchcore::application::engine::MatchEngine;
use matchcore::config::{EngineArgs, EngineConfig};
use matchcore::infrastructure::in_memory::InMemoryStore;
use matchcore::interfaces::csv::account_writer::AccountWriter;
use matchcore::interfaces::csv::command_reader::CommandReader;
use matchcore::interfaces::csv::runner::ScriptRunner;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command script CSV file (action,actor,target,detail)
    input: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let store = InMemoryStore::new();
    let engine = MatchEngine::with_shared_store(store.clone(), EngineConfig::from(cli.engine));
    let runner = ScriptRunner::new(engine, store);

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (index, command) in reader.commands().enumerate() {
        let command_no = index + 1;
        match command {
            Ok(command) => {
                let action = command.action;
                if let Err(err) = runner.apply(command).await {
                    warn!(command_no, ?action, error = %err, "command rejected");
                }
            }
            Err(err) => warn!(command_no, error = %err, "unreadable command"),
        }
    }

    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(runner.summaries().await).into_diagnostic()?;

    Ok(())
}
