//! deskagent - natural language in, keyboard and mouse out
//!
//! ```bash
//! deskagent                          # serve the HTTP API on 0.0.0.0:5001
//! deskagent run "open notepad and type hello"
//! deskagent send "open calculator"   # talk to a running service
//! deskagent config
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deskagent::actions::SystemDesktop;
use deskagent::agent::Agent;
use deskagent::api::{self, DEFAULT_PORT};
use deskagent::cli::{print_banner, print_capabilities, print_config, print_error, print_info, print_reply, print_success};
use deskagent::client::{self, AgentClient};
use deskagent::core::config::DEFAULT_CONFIG_PATH;
use deskagent::core::AgentConfig;
use deskagent::logging::init_tracing;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "deskagent")]
#[command(author = "G-Tech SD")]
#[command(version)]
#[command(about = "Desktop automation agent - describe a task, watch it happen")]
#[command(long_about = r#"
deskagent turns plain-English desktop tasks into keyboard, mouse and
application-launch actions, planned by a local or hosted LLM.

Examples:
  deskagent serve --port 5001
  deskagent run "open notepad and type Hello World"
  deskagent send "open calculator"

Keyboard/mouse control and screen capture are opt-in build features:
  cargo build --features computer-use
"#)]
struct Args {
    /// Config file (JSON, or TOML with a .toml extension)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Run one task in this process
    Run {
        #[arg(trailing_var_arg = true, required = true)]
        task: Vec<String>,
    },

    /// Show the effective configuration
    Config,

    /// Send a task to a running service
    Send {
        #[arg(long, default_value_t = client::default_url())]
        url: String,

        #[arg(trailing_var_arg = true, required = true)]
        task: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.debug, args.json_logs);

    if let Err(e) = run(args).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let command = args.command.unwrap_or(Commands::Serve {
        host: IpAddr::from([0, 0, 0, 0]),
        port: DEFAULT_PORT,
    });

    match command {
        Commands::Serve { host, port } => {
            let config = AgentConfig::load(&args.config);
            print_banner();
            print_config(&config);
            let (input, vision) = SystemDesktop::new().capabilities();
            print_capabilities(input, vision);

            let addr = SocketAddr::new(host, port);
            print_info(&format!("Listening on http://{}", addr));

            let agent = Arc::new(Agent::from_config(config));
            api::serve(agent, addr)
                .await
                .with_context(|| format!("Failed to serve on {}", addr))?;
            print_success("Stopped");
        }
        Commands::Run { task } => {
            let config = AgentConfig::load(&args.config);
            let agent = Agent::from_config(config);
            let reply = agent.process(&task.join(" ")).await;
            print_reply(&reply);
            if !reply.success {
                std::process::exit(2);
            }
        }
        Commands::Config => {
            let config = AgentConfig::load(&args.config);
            print_config(&config);
        }
        Commands::Send { url, task } => {
            let client = AgentClient::new(&url);
            let reply = client
                .send(&task.join(" "))
                .await
                .context("Could not reach the agent service")?;
            print_reply(&reply);
            if !reply.success {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
