//! Tabletop Relay - correlated calls between the bot and the game master over a broadcast hub.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relay_config_and_utils::{init_logging, Config, Paths};

/// Tabletop relay command-line interface.
#[derive(Debug, Parser)]
#[command(name = "tabletop-relay")]
#[command(about = "Relay business actions between chat peers and the game master")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Overrides the config file
    #[arg(short, long, global = true, env = "TABLETOP_RELAY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Base directory for runtime files (socket, config). Defaults to ~/.tabletop-relay
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the broadcast hub
    Hub {
        /// Hub socket path
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Run the game master peer over a world file
    Gm {
        /// World file with the host entities
        #[arg(long)]
        world: PathBuf,
        /// Hub socket path
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Call an action through the game master and print the result
    Call {
        /// Action name, e.g. getCharacterStats
        action: String,
        /// JSON payload passed as the first argument
        #[arg(long)]
        payload: Option<String>,
        /// Deadline in seconds. Defaults to the configured call timeout
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_secs: Option<u64>,
        /// Hub socket path
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// List the actions the game master registers
    Actions,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    init_logging(
        cli.log_level
            .as_deref()
            .unwrap_or_else(|| config.effective_log_level()),
    );

    let socket_path =
        |socket: Option<PathBuf>| socket.unwrap_or_else(|| paths.hub_socket_file());

    match cli.command {
        Commands::Hub { socket } => {
            app::run_hub(socket_path(socket)).await?;
        }
        Commands::Gm { world, socket } => {
            app::run_gm(&config, &world, socket_path(socket)).await?;
        }
        Commands::Call {
            action,
            payload,
            timeout_secs,
            socket,
        } => {
            let request = app::CallRequest::new(action, payload.as_deref(), timeout_secs)?;
            let result = app::run_call(&config, request, socket_path(socket)).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Actions => {
            for name in app::action_names().await {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
