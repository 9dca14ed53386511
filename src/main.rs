//! Command-line interface: one-shot queries or an interactive session.

use std::io::Write as _;
use std::process;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use deepagent::agent::AgentBuilder;
use deepagent::providers::OllamaProvider;
use deepagent::{Agent, AgentError, AgentEvent, Config};

#[derive(Parser, Debug)]
#[command(
    name = "deepagent",
    version,
    about = "Research assistant for local Ollama models, with web search, calculator and clock tools"
)]
struct Cli {
    /// One-shot query; omit to start an interactive session
    query: Option<String>,

    /// Override the model name (otherwise OLLAMA_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Override the Ollama server URL (otherwise OLLAMA_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Wait for complete responses instead of streaming tokens
    #[arg(long)]
    no_stream: bool,

    /// Print tool invocations and result previews
    #[arg(long)]
    show_tools: bool,

    /// Print the resolved configuration and exit
    #[arg(long)]
    config: bool,

    /// Check the configuration against the server and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> deepagent::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }

    if cli.config {
        println!("{config}");
        return Ok(());
    }
    if cli.validate {
        config.validate().await?;
        let provider = OllamaProvider::new(&config.ollama_base_url, &config.ollama_model)?;
        let models = provider.list_models().await?;
        let wanted = &config.ollama_model;
        if !models
            .iter()
            .any(|m| m == wanted || m.starts_with(&format!("{wanted}:")))
        {
            return Err(AgentError::Config(format!(
                "model '{wanted}' is not available on the server (try `ollama pull {wanted}`)"
            )));
        }
        println!("✅ Configuration is valid");
        return Ok(());
    }

    let agent = AgentBuilder::from_config(&config)?
        .show_tools(cli.show_tools)
        .build();

    match cli.query {
        Some(query) => answer(&agent, &query, cli.no_stream).await,
        None => interactive(&agent, &config, cli.no_stream).await,
    }
}

async fn answer(agent: &Agent, input: &str, no_stream: bool) -> deepagent::Result<()> {
    if no_stream {
        println!("{}", agent.chat(input).await?);
    } else {
        agent.run(input, print_event).await?;
        println!();
    }
    Ok(())
}

async fn interactive(agent: &Agent, config: &Config, no_stream: bool) -> deepagent::Result<()> {
    println!("🤖 Deep Agent CLI");
    println!("{}", "=".repeat(50));
    println!(
        "Model: {} @ {}",
        config.ollama_model, config.ollama_base_url
    );
    println!("Type 'help' for commands, 'quit' to exit.\n");

    let mut editor =
        DefaultEditor::new().map_err(|err| AgentError::Agent(format!("readline: {err}")))?;

    loop {
        match editor.readline("You: ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(input);

                match repl_command(input) {
                    Some(ReplCommand::Quit) => break,
                    Some(ReplCommand::Help) => {
                        print_help();
                        continue;
                    }
                    Some(ReplCommand::Config) => {
                        println!("{config}");
                        continue;
                    }
                    None => {}
                }

                print!("Agent: ");
                let _ = std::io::stdout().flush();

                let result = if no_stream {
                    agent.chat(input).await.map(|text| println!("{text}"))
                } else {
                    agent.run(input, print_event).await.map(|_| println!())
                };
                if let Err(err) = result {
                    println!("\nError: {err}");
                }
                println!();
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(AgentError::Agent(format!("readline: {err}"))),
        }
    }

    println!("Goodbye! 👋");
    Ok(())
}

#[derive(Debug, PartialEq)]
enum ReplCommand {
    Quit,
    Help,
    Config,
}

/// In-band commands are matched case-insensitively; anything else goes to
/// the agent with its original casing.
fn repl_command(input: &str) -> Option<ReplCommand> {
    match input.to_lowercase().as_str() {
        "quit" | "exit" | "q" => Some(ReplCommand::Quit),
        "help" => Some(ReplCommand::Help),
        "config" => Some(ReplCommand::Config),
        _ => None,
    }
}

fn print_event(event: AgentEvent) {
    match event {
        AgentEvent::TextDelta(text) => {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
        AgentEvent::ToolUse { name, args } => println!("\n🔧 Using {name}({args})"),
        AgentEvent::ToolResult { name, output } => println!("📤 {name}: {output}"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  help    show this message");
    println!("  config  print the active configuration");
    println!("  quit    exit (also: exit, q, Ctrl-C, Ctrl-D)");
    println!("Anything else is sent to the agent.\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_commands_ignore_case() {
        for input in ["quit", "Quit", "EXIT", "q", "Q"] {
            assert_eq!(repl_command(input), Some(ReplCommand::Quit), "input: {input}");
        }
        assert_eq!(repl_command("Help"), Some(ReplCommand::Help));
        assert_eq!(repl_command("CONFIG"), Some(ReplCommand::Config));
    }

    #[test]
    fn test_regular_input_is_not_a_command() {
        assert_eq!(repl_command("quit smoking tips"), None);
        assert_eq!(repl_command("what is q?"), None);
    }
}
