use anyhow::Result;
use clap::{Parser, Subcommand};
use rdx_execution::{CreateForm, ManageAction};

mod commands;

#[derive(Parser)]
#[command(name = "raindrop")]
#[command(about = "Raindrop escrow client", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> network -> local...)
    #[arg(
        long = "config",
        global = true,
        default_value = "config/defaults/base.yaml"
    )]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// List wallet connectors and connect the node account
    Account,

    /// Approve the escrow, then create a raindrop once the approval confirms
    Create {
        /// Raindrop id (opaque, non-empty)
        #[arg(long)]
        id: String,

        /// ERC-20 token address
        #[arg(long)]
        token: String,

        /// Decimal token amount, e.g. 1000 or 12.5
        #[arg(long)]
        amount: String,

        /// Scheduled date-time, e.g. 2025-01-01T00:00 (schedule.timezone or host zone)
        #[arg(long = "at")]
        scheduled_at: String,
    },

    /// Print the on-chain details of a raindrop
    Details {
        #[arg(long)]
        id: String,
    },

    /// Add participants to an open raindrop
    AddParticipants {
        #[arg(long)]
        id: String,

        /// Addresses separated by commas, spaces or newlines. Malformed entries are skipped.
        #[arg(long)]
        addresses: String,
    },

    /// Execute an open raindrop
    Execute {
        #[arg(long)]
        id: String,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => commands::config_hash(&paths),
        Commands::Account => commands::account(&cli.config_paths).await,
        Commands::Create {
            id,
            token,
            amount,
            scheduled_at,
        } => {
            let form = CreateForm {
                id,
                token,
                amount,
                scheduled_at,
            };
            commands::create::run(&cli.config_paths, form).await
        }
        Commands::Details { id } => commands::manage::details(&cli.config_paths, &id).await,
        Commands::AddParticipants { id, addresses } => {
            commands::manage::act(
                &cli.config_paths,
                &id,
                ManageAction::AddParticipants { addresses },
            )
            .await
        }
        Commands::Execute { id } => {
            commands::manage::act(&cli.config_paths, &id, ManageAction::Execute).await
        }
    }
}
