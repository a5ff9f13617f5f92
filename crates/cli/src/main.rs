use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use copilot_core::{ChatInput, PolicyStore};
use copilot_llm::GeminiClient;
use copilot_observability::{init_tracing, AppMetrics};
use copilot_pipeline::{ClassifierMode, CopilotAgent, PipelineConfig};
use copilot_retrieval::{KeywordRetriever, PolicyRetriever};
use copilot_storage::Store;

#[derive(Debug, Parser)]
#[command(name = "copilot")]
#[command(about = "HR Copilot CLI")]
struct Cli {
    #[arg(long, default_value = "kb")]
    kb_root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat session. `reset` clears the history, `exit` quits.
    Chat,
    /// List the built-in policy topics and their texts.
    Policies,
    Kb {
        #[command(subcommand)]
        command: KbCommand,
    },
}

#[derive(Debug, Subcommand)]
enum KbCommand {
    Search {
        query: String,
        #[arg(long, default_value_t = 4)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("copilot_cli");
    let cli = Cli::parse();

    let agent = build_agent(&cli.kb_root).await?;

    match cli.command {
        Command::Chat => run_chat(agent).await?,
        Command::Policies => {
            for (intent, text) in agent.policies().topics() {
                println!("## {}\n{}\n", intent.as_label(), text);
            }
        }
        Command::Kb { command } => match command {
            KbCommand::Search { query, limit } => {
                let hits = agent.kb_search(&query, limit);
                println!("{}", serde_json::to_string_pretty(&hits)?);
            }
        },
    }

    Ok(())
}

async fn run_chat(agent: CopilotAgent<Store, GeminiClient>) -> Result<()> {
    let mut session_id: Option<String> = None;

    println!("HR Copilot chat mode. 'reset' clears history, 'exit' quits.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        if message.eq_ignore_ascii_case("reset") {
            if let Some(id) = &session_id {
                agent.reset_history(id).await?;
                println!("history cleared\n");
            }
            continue;
        }

        let outcome = agent
            .submit(ChatInput {
                session_id: session_id.clone(),
                text: message.to_string(),
            })
            .await?;

        session_id = Some(outcome.session_id.clone());

        println!("\n[{}] {}\n", outcome.intent.as_label(), outcome.response);
        if let Some(action) = outcome.action {
            println!("action: {}\n", action.text);
        }
    }

    Ok(())
}

async fn build_agent(kb_root: &PathBuf) -> Result<CopilotAgent<Store, GeminiClient>> {
    let metrics = AppMetrics::shared();

    let retriever = Arc::new(
        KeywordRetriever::from_corpus_dir(kb_root)
            .with_context(|| format!("failed loading policy corpus from {}", kb_root.display()))?,
    ) as Arc<dyn PolicyRetriever>;

    let store = if let Ok(database_url) = env::var("COPILOT_DATABASE_URL") {
        Store::sqlite(&database_url).await?
    } else {
        Store::memory()
    };

    let model = GeminiClient::from_env();
    let mode = if model.is_some() {
        ClassifierMode::ModelAssisted
    } else {
        ClassifierMode::Rules
    };

    Ok(CopilotAgent::new(
        retriever,
        model,
        PolicyStore::default(),
        Arc::new(store),
        metrics,
        PipelineConfig {
            mode,
            ..PipelineConfig::default()
        },
    ))
}
