use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use home_intake::boundary::{PromptSink, TranscriptEvent, TranscriptSource};
use home_intake::catalog::Question;
use home_intake::config::Config;
use home_intake::error::{AppResult, FlowError};
use home_intake::flow::Derivation;
use home_intake::{AnswerStore, FlowCoordinator, SqliteBlobStore, StoreGateway};

#[derive(Parser)]
#[command(name = "home-intake", version, about = "Guided home setup intake")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the catalog (questions, answers, version) to a backup file
    Export { path: PathBuf },
    /// Replace the catalog wholesale from a backup file
    Import { path: PathBuf },
    /// Reset the catalog to the seeded defaults, discarding all answers
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Home intake starting..."
    );

    // Initialize storage
    let blobs = match SqliteBlobStore::new(&config.store).await {
        Ok(s) => {
            info!(path = %config.store.path.display(), "Store initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize store");
            return Err(e.into());
        }
    };

    let store = AnswerStore::new(Arc::new(blobs));
    let gateway = StoreGateway::connect(store).await?;

    match cli.command {
        Some(Command::Export { path }) => {
            let bytes = gateway.export().await?;
            tokio::fs::write(&path, bytes).await?;
            info!(path = %path.display(), "Catalog exported");
        }
        Some(Command::Import { path }) => {
            let bytes = tokio::fs::read(&path).await?;
            let catalog = gateway.import(&bytes).await?;
            info!(
                path = %path.display(),
                questions = catalog.questions.len(),
                notes = catalog.notes.len(),
                "Catalog imported"
            );
        }
        Some(Command::Reset) => {
            gateway.reset_to_defaults().await?;
            info!("Catalog reset to defaults");
        }
        None => run_intake(gateway).await?,
    }

    Ok(())
}

/// Drive the conversation over stdin/stdout until the questions run out or
/// the input does.
async fn run_intake(gateway: StoreGateway) -> anyhow::Result<()> {
    let mut flow = FlowCoordinator::new(gateway);
    let mut source = StdinSource::new();
    let sink = ConsoleSink;

    flow.load_next_question().await?;

    while let Some(question) = flow.current_question().cloned() {
        sink.present(&question).await?;

        loop {
            let event = match source.next_event().await? {
                Some(event) => event,
                None => {
                    info!("Input exhausted, ending session");
                    return Ok(());
                }
            };

            flow.session_mut().update_transcript(&event.text);
            if !event.is_final {
                continue;
            }

            let draft = flow.session().draft_text().to_string();
            match flow.save_answer(&draft, None).await {
                Ok(()) => {
                    if let Some(Derivation::Address { display_name, .. }) = flow.last_derivation()
                    {
                        println!("  (we'll call this place \"{}\")", display_name);
                    }
                    break;
                }
                Err(FlowError::EmptyAnswer) => {
                    // Same question stays displayed, draft kept for correction
                    sink.present_error("An answer can't be empty - please try again.")
                        .await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    if flow.has_completed_all_questions() {
        println!("All set - every required question is answered.");
    }

    Ok(())
}

/// Line-oriented transcript source over stdin; every line is a final
/// utterance.
struct StdinSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinSource {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait]
impl TranscriptSource for StdinSource {
    async fn next_event(&mut self) -> AppResult<Option<TranscriptEvent>> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Ok(Some(TranscriptEvent::final_text(line))),
            Ok(None) => Ok(None),
            Err(e) => Err(home_intake::AppError::Internal {
                message: format!("stdin read failed: {}", e),
            }),
        }
    }
}

/// Prompt sink that prints to stdout.
struct ConsoleSink;

#[async_trait]
impl PromptSink for ConsoleSink {
    async fn present(&self, question: &Question) -> AppResult<()> {
        println!();
        println!("{}", question.text);
        if let Some(hint) = &question.hint {
            println!("  ({})", hint);
        }
        Ok(())
    }

    async fn present_error(&self, message: &str) -> AppResult<()> {
        println!("  ! {}", message);
        Ok(())
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        home_intake::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        home_intake::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
