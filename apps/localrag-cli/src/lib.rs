//! `localrag` command line: build the index, ask one question, chat, list agents.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use localrag_agent::{AgentRegistry, AnswerAssembler, AnswerMode, OllamaCompletion, Router};
use localrag_core::chunker::Chunker;
use localrag_core::config::{Config, Settings};
use localrag_core::loader::TextLoader;
use localrag_core::types::QueryResult;
use localrag_embed::get_default_embedder;
use localrag_vector::{persist, EmbeddingIndex, Retriever};

#[derive(Parser, Debug)]
#[command(name = "localrag")]
#[command(about = "Local document assistant with role-specialized agents", long_about = None)]
pub struct Cli {
    /// Directory holding config.toml and config.<env>.toml; paths resolve against it
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk and embed the documents, then persist the index
    Build {
        /// Documents directory (defaults to paths.raw_documents)
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Answer a single question
    Ask {
        question: String,

        /// Agent id, or "auto" for keyword routing
        #[arg(long)]
        agent: Option<String>,

        /// Number of chunks to retrieve
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session
    Chat {
        #[arg(long)]
        agent: Option<String>,
    },
    /// List the available agents
    Agents,
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

pub async fn run(cli: Cli) -> Result<()> {
    let (settings, base) = load_settings(cli.config_dir.as_deref())?;
    match cli.command {
        Commands::Build { source } => build(&settings, &base, source).await,
        Commands::Ask { question, agent, top_k, json } => {
            let assembler = open_assembler(&settings, &base).await?;
            let k = top_k.unwrap_or(settings.retrieval.top_k);
            let result = assembler.ask_k(&question, agent.as_deref(), k).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&assembler, &result);
            }
            Ok(())
        }
        Commands::Chat { agent } => chat(&settings, &base, agent).await,
        Commands::Agents => {
            list_agents(&AgentRegistry::builtin(&settings));
            Ok(())
        }
    }
}

fn load_settings(config_dir: Option<&Path>) -> Result<(Settings, PathBuf)> {
    let config = match config_dir {
        Some(dir) => {
            let env_name = std::env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
            Config::load_from(dir, &env_name)?
        }
        None => Config::load()?,
    };
    let settings = config.settings().context("loading configuration")?;
    let base = config_dir.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    Ok((settings, base))
}

async fn build(settings: &Settings, base: &Path, source: Option<PathBuf>) -> Result<()> {
    let source = source.unwrap_or_else(|| settings.paths.raw_documents_dir(base));
    let store = settings.paths.vector_store_dir(base);
    println!("📂 Documents: {}", source.display());

    let chunker = Chunker::new(settings.processing.chunking())?;
    let documents = TextLoader::new().load_dir(&source)?;
    if documents.is_empty() {
        bail!("no supported documents found in {}", source.display());
    }
    let chunks = chunker.split(&documents);
    println!("✂️  {} documents → {} chunks", documents.len(), chunks.len());

    let embedder = get_default_embedder(settings)?;
    let engine = EmbeddingIndex::from_settings(embedder, &settings.embedding).with_progress(true);
    let index = engine.build(chunks).await?;
    persist(&index, &store).await?;

    println!("\n✅ Index built: {} chunks, model {}, dimension {}", index.len(), index.model(), index.dimension());
    println!("📊 Stored at {}", store.display());
    Ok(())
}

async fn open_assembler(settings: &Settings, base: &Path) -> Result<AnswerAssembler> {
    let embedder = get_default_embedder(settings)?;
    let engine = EmbeddingIndex::from_settings(embedder, &settings.embedding);
    let store = settings.paths.vector_store_dir(base);
    let retriever = Retriever::open(engine, &store).await?.with_top_k(settings.retrieval.top_k);

    let registry = Arc::new(AgentRegistry::builtin(settings));
    let router = Router::new(registry, &settings.router.default_agent)?;
    let backend = OllamaCompletion::new(&settings.ollama.base_url)?;
    let assembler = AnswerAssembler::new(router, retriever, Arc::new(backend), settings);
    if assembler.mode() == AnswerMode::Direct {
        tracing::warn!(location = %store.display(), "no index found; answering without documents (run `localrag build`)");
    }
    Ok(assembler)
}

async fn chat(settings: &Settings, base: &Path, agent: Option<String>) -> Result<()> {
    let assembler = open_assembler(settings, base).await?;
    let registry = assembler.router().registry();
    let mut current = agent.filter(|a| a != "auto");
    if let Some(id) = &current {
        if !registry.contains(id) {
            bail!("unknown agent '{id}'");
        }
    }

    println!("💬 localrag chat ({} indexed chunks)", assembler.retriever().total_chunks());
    println!("   /agents, /agent <id>, /auto, exit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n[{}] > ", current.as_deref().unwrap_or("auto"));
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let input = line.trim();
        match input {
            "" => continue,
            "exit" | "quit" | "salir" => break,
            "/agents" => list_agents(registry),
            "/auto" => {
                current = None;
                println!("🔀 Automatic agent selection");
            }
            _ if input.starts_with("/agent ") => {
                let id = input["/agent ".len()..].trim();
                if registry.contains(id) {
                    current = Some(id.to_string());
                    println!("🔀 Using {id}");
                } else {
                    println!("❌ Unknown agent '{id}'");
                }
            }
            question => match assembler.ask(question, current.as_deref()).await {
                Ok(result) => print_result(&assembler, &result),
                Err(e) => println!("❌ {e}"),
            },
        }
    }
    println!("👋 Bye");
    Ok(())
}

fn print_result(assembler: &AnswerAssembler, result: &QueryResult) {
    let name = assembler
        .router()
        .registry()
        .get(&result.agent_id)
        .map(|p| p.display_name.as_str())
        .unwrap_or(result.agent_id.as_str());
    if !result.success {
        println!("❌ [{name}] {}", result.answer);
        return;
    }
    println!("🤖 [{name}]\n{}", result.answer);
    if !result.sources.is_empty() {
        println!("\n📚 Sources:");
        for (i, source) in result.sources.iter().enumerate() {
            println!("  {}. {}", i + 1, source.source_id);
            println!("     {}", source.preview);
        }
    }
}

fn list_agents(registry: &AgentRegistry) {
    println!("Available agents:");
    for profile in registry.iter() {
        println!("  {:<20} {} ({})", profile.id, profile.display_name, profile.backend.model_name);
        println!("  {:<20} {}", "", profile.capabilities.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ask_with_options() {
        let cli = Cli::try_parse_from(["localrag", "ask", "what is rust?", "--agent", "coder", "--top-k", "2", "--json"])
            .expect("parse");
        match cli.command {
            Commands::Ask { question, agent, top_k, json } => {
                assert_eq!(question, "what is rust?");
                assert_eq!(agent.as_deref(), Some("coder"));
                assert_eq!(top_k, Some(2));
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn settings_load_from_config_dir() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("config.toml"), "[paths]\nvector_store = \"store\"\n").expect("write");
        let (settings, base) = load_settings(Some(tmp.path())).expect("settings");
        assert_eq!(settings.paths.vector_store_dir(&base), tmp.path().join("store"));
    }
}
