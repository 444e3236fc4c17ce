use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use weave_core::config::EngineConfig;
use weave_core::model::{WorkflowRequest, WorkflowStatus};
use weave_server::AppState;

#[derive(Parser)]
#[command(name = "weave", version, about = "Weave workflow orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server.
    Runserver {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Accepted for forward compatibility; no file-watch dev-reload is implemented.
        #[arg(long)]
        reload: bool,
    },
    /// Print the registered agent types.
    ListAgents,
    /// Print the registered tools.
    ListTools,
    /// Load a WorkflowRequest from a JSON file, execute it, and print the result.
    RunWorkflow {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    weave_core::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Runserver { host, port, reload } => {
            if reload {
                tracing::info!("--reload requested; no dev-reload file watcher is implemented, ignoring");
            }
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid host/port '{host}:{port}'"))?;
            let state = AppState::with_builtins(EngineConfig::load_or_default());
            weave_server::serve(addr, state).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::ListAgents => {
            let state = AppState::with_builtins(EngineConfig::load_or_default());
            let mut agents = state.agents.list();
            agents.sort_by(|a, b| a.agent_type.cmp(&b.agent_type));
            println!("{:<20} {}", "AGENT TYPE", "DESCRIPTION");
            for agent in agents {
                println!("{:<20} {}", agent.agent_type, agent.description);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::ListTools => {
            let state = AppState::with_builtins(EngineConfig::load_or_default());
            let mut tools = state.tools.list();
            tools.sort_by(|a, b| a.name.cmp(&b.name));
            println!("{:<20} {}", "TOOL", "DESCRIPTION");
            for tool in tools {
                println!("{:<20} {}", tool.name, tool.description);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::RunWorkflow { config } => {
            let contents = std::fs::read_to_string(&config)
                .with_context(|| format!("failed to read {}", config.display()))?;
            let request: WorkflowRequest = serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse {} as a WorkflowRequest", config.display()))?;

            let state = AppState::with_builtins(EngineConfig::load_or_default());
            let result = state.engine.execute(request).await;
            println!("{}", serde_json::to_string_pretty(&result)?);

            Ok(if result.status == WorkflowStatus::Success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
