//! Generates one invention from the command line.
//!
//! ```bash
//! export GEMINI_API_KEY=your-key
//! cargo run --example generate_invention -- "tea party" --premium
//! RUST_LOG=contraption_rs=debug cargo run --example generate_invention
//! ```

use contraption_rs::Client;
use std::env;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Ok(api_key) = env::var("GEMINI_API_KEY") else {
        eprintln!("GEMINI_API_KEY environment variable not set");
        return ExitCode::FAILURE;
    };

    let mut premium = false;
    let mut theme_words = Vec::new();
    for arg in env::args().skip(1) {
        if arg == "--premium" {
            premium = true;
        } else {
            theme_words.push(arg);
        }
    }
    let theme = theme_words.join(" ");

    let client = match Client::builder(api_key).build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build client: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Forging a {} invention{}...\n",
        if premium { "premium" } else { "standard" },
        if theme.is_empty() {
            String::new()
        } else {
            format!(" about '{theme}'")
        }
    );

    match client.generate(Some(&theme), premium).await {
        Ok(invention) => {
            println!("{}", invention.name());
            println!("{}\n", invention.description());
            println!("Components:");
            for component in invention.components() {
                println!("  - {component}");
            }
            println!("\nHazard:    {}", invention.hazard_level());
            println!("Blueprint: {}", invention.code());
            if let Some(rarity) = invention.rarity() {
                println!("Rarity:    {rarity}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            eprintln!("Details: {e}");
            ExitCode::FAILURE
        }
    }
}
