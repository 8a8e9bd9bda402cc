//! deskagent CLI
//!
//! Banner, colors and reply rendering for the terminal.

use crate::agent::AgentReply;
use crate::core::AgentConfig;
use console::style;

pub const BANNER_TEXT: &str = r#"
 ██████  ███████ ███████ ██   ██  █████   ██████  ███████ ███    ██ ████████
 ██   ██ ██      ██      ██  ██  ██   ██ ██       ██      ████   ██    ██
 ██   ██ █████   ███████ █████   ███████ ██   ███ █████   ██ ██  ██    ██
 ██   ██ ██           ██ ██  ██  ██   ██ ██    ██ ██      ██  ██ ██    ██
 ██████  ███████ ███████ ██   ██ ██   ██  ██████  ███████ ██   ████    ██
"#;

pub fn print_banner() {
    println!("{}", style(BANNER_TEXT).cyan().bold());
    println!(
        "{}",
        style("              ✦  S A Y   I T ,   S E E   I T   D O N E  ✦")
            .yellow()
            .bold()
    );
    println!(
        "{}",
        style(format!("                          Version {}", env!("CARGO_PKG_VERSION")))
            .dim()
    );
    println!();
}

pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").cyan(), msg);
}

pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn print_error(msg: &str) {
    println!("{} {}", style("✗").red().bold(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

fn rule() {
    println!(
        "{}",
        style("════════════════════════════════════════════════════════════").dim()
    );
}

/// Effective configuration, credential masked
pub fn print_config(config: &AgentConfig) {
    let safe = config.redacted();
    rule();
    println!("{}", style("CONFIGURATION").cyan().bold());
    println!("Provider:     {}", style(safe.provider).white().bold());
    println!("Model:        {}", safe.model);
    println!("Vision model: {}", safe.vision_model);
    println!(
        "API key:      {}",
        safe.api_key.as_deref().unwrap_or("(not set)")
    );
    if safe.provider.is_local() {
        println!("Ollama URL:   {}", safe.ollama_url);
    }
    rule();
}

/// Render a reply the way the desktop front end would: step lines colored
/// by their check marks, errors in red
pub fn print_reply(reply: &AgentReply) {
    if let Some(message) = &reply.message {
        for line in message.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('✓') {
                println!("{}", style(line).green());
            } else if trimmed.starts_with('✗') {
                println!("{}", style(line).red());
            } else if line.starts_with("Task:") {
                println!("{}", style(line).bold());
            } else {
                println!("{}", line);
            }
        }
    }

    match (&reply.error, reply.success) {
        (Some(error), _) => print_error(error),
        (None, true) => print_success("Done"),
        (None, false) => print_warning("Task did not complete"),
    }
}

/// Note which desktop capabilities this build carries
pub fn print_capabilities(input: bool, vision: bool) {
    if !input {
        print_warning("Built without keyboard/mouse control (rebuild with --features input)");
    }
    if !vision {
        print_warning("Built without screen capture (rebuild with --features vision)");
    }
}
