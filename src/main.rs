use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use docqa::agent::{DocumentQaTool, ReportAnalysisTool, ToolRegistry};
use docqa::compose::{AnswerComposer, ComposerConfig};
use docqa::core::config::AppConfig;
use docqa::core::logging;
use docqa::index::Indexer;
use docqa::llm::{LlmProvider, OpenAiCompatProvider};
use docqa::loader::loader_for;
use docqa::questions::QuestionGenerator;
use docqa::retrieve::Retriever;
use docqa::segment::{DocumentChunk, Segmenter};
use docqa::session::Conversation;
use docqa::store::MemoryVectorStore;
use docqa::summarize::{Summarizer, SummarizerConfig};
use docqa::Orchestrator;

/// Grounded Q&A over a local document.
#[derive(Debug, Parser)]
#[command(name = "docqa", version, about)]
struct Cli {
    /// Path to the source document (plain text, or extracted PDF text).
    #[arg(long)]
    document: PathBuf,

    /// Single question to answer.
    #[arg(long)]
    query: Option<String>,

    /// Write the answer or report to this path instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start an interactive chat session.
    #[arg(long)]
    interactive: bool,

    /// Generate the full analysis report for the document.
    #[arg(long)]
    report: bool,

    /// Generate study questions about this topic and answer each one from
    /// the document.
    #[arg(long, value_name = "TOPIC")]
    study: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init(&config.log_dir);

    // Missing credentials are the one failure allowed to halt startup.
    let api_key = config.api_key()?;
    let provider: Arc<dyn LlmProvider> =
        Arc::new(OpenAiCompatProvider::new(&config.provider, api_key)?);

    if !provider.health_check().await.unwrap_or(false) {
        tracing::warn!(
            base_url = %config.provider.base_url,
            "model endpoint did not answer the health check"
        );
    }

    let chunks = load_and_segment(&cli, &config)?;
    if chunks.is_empty() {
        bail!(
            "no indexable chunks found in {} (check section markers and size thresholds)",
            cli.document.display()
        );
    }
    tracing::info!(chunks = chunks.len(), "segmented document");

    let store = Arc::new(MemoryVectorStore::new(config.retrieval.similarity_threshold));
    let indexer = Indexer::new(provider.clone(), store.clone());
    let report = indexer.index(&chunks).await?;
    tracing::info!(indexed = report.indexed, skipped = report.skipped, "index ready");

    let retriever = Arc::new(Retriever::new(
        provider.clone(),
        store.clone(),
        config.retrieval.clone(),
    ));
    let composer = Arc::new(AnswerComposer::new(
        provider.clone(),
        ComposerConfig {
            temperature: config.provider.temperature,
        },
    ));
    let summarizer = Arc::new(Summarizer::new(
        provider.clone(),
        SummarizerConfig::default(),
    ));

    let shared_chunks = Arc::new(chunks);
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(DocumentQaTool::new(
        retriever.clone(),
        composer.clone(),
    )));
    registry.register(Arc::new(ReportAnalysisTool::new(
        summarizer.clone(),
        shared_chunks.clone(),
    )));

    let orchestrator = Orchestrator::new(
        provider.clone(),
        registry,
        store.clone(),
        config.orchestrator.clone(),
    );

    if cli.report {
        let report = summarizer.comprehensive_report(&shared_chunks).await;
        let source_id = shared_chunks
            .first()
            .map(|c| c.source_id.clone())
            .unwrap_or_default();
        emit(&cli.output, &report.to_markdown(&source_id))?;
        return Ok(());
    }

    if let Some(topic) = &cli.study {
        let generator = QuestionGenerator::new(provider.clone());
        let session = run_study_session(&generator, &retriever, &composer, topic).await;
        emit(&cli.output, &session)?;
        return Ok(());
    }

    if cli.interactive {
        run_interactive(&orchestrator).await?;
        return Ok(());
    }

    let Some(query) = cli.query else {
        bail!("provide --query, --interactive, --report, or --study");
    };

    let mut conversation = Conversation::new();
    let answer = orchestrator.run_turn(&mut conversation, &query).await;
    emit(&cli.output, &answer)?;

    Ok(())
}

fn load_and_segment(cli: &Cli, config: &AppConfig) -> anyhow::Result<Vec<DocumentChunk>> {
    let loader = loader_for(&cli.document);
    let document = loader.load(&cli.document)?;
    let segmenter = Segmenter::new(config.segmenter.clone());

    // Page-scoped sources are segmented per page so chunks never span pages.
    let chunks = match &document.pages {
        Some(pages) => {
            let mut all = Vec::new();
            for (page_index, page) in pages.iter().enumerate() {
                let page_source = format!("{}#page{}", document.source_id, page_index + 1);
                all.extend(segmenter.segment(page, &page_source));
            }
            all
        }
        None => segmenter.segment(&document.text, &document.source_id),
    };
    Ok(chunks)
}

/// Generate study questions for `topic` and answer each one against the
/// indexed document. Grounded retrieval runs directly here; the dispatch
/// loop adds nothing when the question list is already fixed.
async fn run_study_session(
    generator: &QuestionGenerator,
    retriever: &Retriever,
    composer: &AnswerComposer,
    topic: &str,
) -> String {
    let questions = generator.generate(topic).await;
    tracing::info!(topic, count = questions.len(), "generated study questions");

    let mut out = format!("# Study Session: {}\n", topic);
    for (index, question) in questions.iter().enumerate() {
        let answer = match retriever.retrieve_default(question).await {
            Ok(retrieved) => composer.compose(question, &retrieved).await.display(),
            Err(err) => {
                tracing::warn!(error = %err, question, "retrieval failed for study question");
                format!("Error processing query: {}", err)
            }
        };
        out.push_str(&format!("\n## Q{}: {}\n\n{}\n", index + 1, question, answer));
    }
    out
}

async fn run_interactive(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    let mut conversation = Conversation::new();
    let stdin = io::stdin();

    println!("Interactive mode. Type 'quit' to exit, 'clear' to reset the conversation.");
    loop {
        print!("\n> ");
        io::stdout().flush().context("flush prompt")?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("read input")? == 0 {
            break;
        }
        let query = line.trim();

        match query {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "clear" => {
                conversation.clear();
                println!("Conversation cleared.");
            }
            _ => {
                let answer = orchestrator.run_turn(&mut conversation, query).await;
                println!("{}", answer);
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn emit(output: &Option<PathBuf>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            std::fs::write(path, content).with_context(|| format!("write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => println!("{}", content),
    }
    Ok(())
}
