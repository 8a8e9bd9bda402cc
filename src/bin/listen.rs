//! deskagent-listen - wake-phrase front end for a running deskagent service
//!
//! Reads one transcribed utterance per line from stdin (pipe a speech-to-text
//! tool into it) and forwards commands that follow "hey agent" to `/agent`.
//!
//! ```bash
//! my-stt --stream | deskagent-listen --url http://localhost:5001
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use deskagent::cli::{print_info, print_warning};
use deskagent::client::{self, AgentClient};
use deskagent::logging::init_tracing;
use deskagent::voice::{describe_reply, Heard, WakeListener};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "deskagent-listen")]
#[command(author = "G-Tech SD")]
#[command(version)]
#[command(about = "Forward wake-phrase commands from a transcript stream to deskagent")]
struct Args {
    /// Agent service URL
    #[arg(long, default_value_t = client::default_url())]
    url: String,

    #[arg(long)]
    debug: bool,
}

fn say(text: &str) {
    println!("Agent: {}", text);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug, false);

    let client = AgentClient::new(&args.url);
    match client.health().await {
        Ok(health) => print_info(&format!(
            "Connected to {} ({} / {})",
            client.base_url(),
            health.provider,
            health.model
        )),
        Err(e) => print_warning(&format!("{}", e)),
    }

    say("Voice control active. Say hey agent to give commands");

    let mut listener = WakeListener::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        tracing::debug!(heard = %line, "Utterance");

        match listener.hear(&line) {
            Heard::Ignored => {}
            Heard::Prompt => say("Yes?"),
            Heard::Missed => say("I didn't catch that"),
            Heard::Command(command) => {
                print_info(&format!("Command: {}", command));
                say("On it");
                let result = client.send(&command).await;
                if let Err(ref e) = result {
                    tracing::warn!("Agent request failed: {}", e);
                }
                say(&describe_reply(&result));
            }
        }
    }

    print_info("Voice control stopped");
    Ok(())
}
