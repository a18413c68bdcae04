//! Tool runner: call the context agent tools by hand
//!
//! Reads the Nextcloud account from the environment (a `.env` file is loaded
//! first if present):
//!
//! ```bash
//! export NEXTCLOUD_URL=https://cloud.example.com
//! export NEXTCLOUD_USER=alice
//! export NEXTCLOUD_APP_PASSWORD=xxxxx-xxxxx-xxxxx-xxxxx-xxxxx
//!
//! cargo run -p tool-runner -- list
//! cargo run -p tool-runner -- run get_coordinates_for_address '{"address": "Berlin"}'
//! cargo run -p tool-runner -- run schedule_event '{...}' --allow-dangerous
//! ```
//!
//! Set `RUST_LOG=debug` to watch TaskProcessing polls.

use clap::{Parser, Subcommand};
use context_agent_nextcloud::NextcloudClient;
use context_agent_tools::{get_tools, ToolSafety, ToolsConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tool-runner")]
#[command(about = "Run context agent tools against a Nextcloud account")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all tools
    List,
    /// Print the input schema of a tool
    Schema {
        /// Tool name
        name: String,
    },
    /// Run a tool with JSON arguments
    Run {
        /// Tool name
        name: String,
        /// Arguments as a JSON object
        #[arg(default_value = "{}", value_name = "JSON")]
        input: String,
        /// Run tools that act on the user's behalf
        #[arg(long)]
        allow_dangerous: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let client = NextcloudClient::from_env()?;
    let registry = get_tools(&client, &ToolsConfig::from_env())?.into_registry();
    info!(tools = registry.count(), "Tools registered");

    match cli.command {
        Commands::List => {
            for tool in registry.get_tools() {
                let marker = match registry.safety(&tool.name) {
                    Some(ToolSafety::Dangerous) => " [dangerous]",
                    _ => "",
                };
                println!("{}{marker}\n    {}", tool.name, tool.description);
            }
        }
        Commands::Schema { name } => {
            let tool = registry
                .get_tool(&name)
                .ok_or_else(|| format!("Tool not found: {name}"))?;
            println!("{}", serde_json::to_string_pretty(&tool.input_schema)?);
        }
        Commands::Run {
            name,
            input,
            allow_dangerous,
        } => {
            if registry.safety(&name) == Some(ToolSafety::Dangerous) && !allow_dangerous {
                return Err(
                    format!("{name} acts on your behalf, pass --allow-dangerous to run it").into(),
                );
            }
            let output = registry.execute(&name, input).await?;
            println!("{output}");
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tool_runner=info,context_agent_nextcloud=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
