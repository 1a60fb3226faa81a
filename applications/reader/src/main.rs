/// Recital - read text aloud one sentence at a time
use anyhow::Context;
use clap::{Parser, Subcommand};
use recital_core::types::{DocumentId, ReaderState};
use recital_playback::{segment, ReaderEvent, SentenceList};
use recital_reader::{config::AppConfig, keys, render, KeyCommand};
use recital_session::{PacedEngine, ReaderSession, SessionHandle};
use recital_storage::SqlitePositionStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "recital")]
#[command(about = "Read text aloud one sentence at a time", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a text file interactively
    Read {
        /// Text file to read
        file: PathBuf,

        /// Document identity (defaults to a hash of the text)
        #[arg(long)]
        document: Option<String>,

        /// Speaking rate (0.1 - 2.0)
        #[arg(long)]
        rate: Option<f32>,

        /// Pitch (0.5 - 2.0)
        #[arg(long)]
        pitch: Option<f32>,

        /// Volume (0.0 - 1.0)
        #[arg(long)]
        volume: Option<f32>,

        /// Voice name
        #[arg(long)]
        voice: Option<String>,

        /// Language tag
        #[arg(long = "lang")]
        language: Option<String>,

        /// Pause between sentences in seconds
        #[arg(long)]
        meditation: Option<f64>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Database URL
        #[arg(long)]
        database: Option<String>,

        /// Show the remaining time
        #[arg(long)]
        eta: bool,
    },
    /// Print the sentences of a text file
    Segment {
        /// Text file to segment
        file: PathBuf,
    },
    /// Show saved reading positions
    Position {
        /// Document identity (lists every document when omitted)
        document: Option<String>,

        /// Text file of the document; gives the identity when none is named
        #[arg(long)]
        file: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Database URL
        #[arg(long)]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout belongs to the reader output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recital=info,recital_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Read {
            file,
            document,
            rate,
            pitch,
            volume,
            voice,
            language,
            meditation,
            config,
            database,
            eta,
        } => {
            let mut config = AppConfig::load(config.as_deref())?;
            if let Some(rate) = rate {
                config.voice.rate = rate;
            }
            if let Some(pitch) = pitch {
                config.voice.pitch = pitch;
            }
            if let Some(volume) = volume {
                config.voice.volume = volume;
            }
            if voice.is_some() {
                config.voice.voice = voice;
            }
            if language.is_some() {
                config.voice.language = language;
            }
            if let Some(secs) = meditation {
                config.playback.meditation_enabled = secs > 0.0;
                config.playback.meditation_pause_secs = secs;
            }
            if let Some(database) = database {
                config.storage.database_url = database;
            }
            config.validate()?;

            read(&file, document, &config, eta).await?;
        }
        Commands::Segment { file } => {
            let text = read_text(&file).await?;
            print!("{}", render::sentence_listing(&segment(&text)));
        }
        Commands::Position {
            document,
            file,
            config,
            database,
        } => {
            let mut config = AppConfig::load(config.as_deref())?;
            if let Some(database) = database {
                config.storage.database_url = database;
            }
            config.validate()?;

            show_positions(&config, document, file.as_deref()).await?;
        }
    }

    Ok(())
}

async fn read_text(file: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}

async fn read(
    file: &Path,
    document: Option<String>,
    config: &AppConfig,
    eta: bool,
) -> anyhow::Result<()> {
    let text = read_text(file).await?;
    let document = document.map_or_else(|| DocumentId::for_text(&text), DocumentId::new);

    let store = SqlitePositionStore::open(&config.storage.database_url).await?;
    tracing::info!("Positions stored in {}", config.storage.database_url);

    let (engine, engine_events) = PacedEngine::new(config.engine.chars_per_second);
    let (session, task) = ReaderSession::start(
        Box::new(engine),
        engine_events,
        Arc::new(store),
        config.controller_settings(),
        config.session_config(),
    );

    let printer = tokio::spawn(print_events(session.subscribe(), segment(&text)));

    println!("{}", keys::HELP);
    session.open(document, text)?;
    session.set_eta_requested(eta)?;

    let status = session.status().await?;
    if status.sentence_count == 0 {
        println!("Nothing to read.");
    } else if status.cursor > 0 {
        println!(
            "Resuming at sentence {} of {}",
            status.cursor + 1,
            status.sentence_count
        );
    }
    session.play()?;

    handle_keys(&session, eta).await?;

    session.close().await?;
    task.await?;
    printer.abort();

    Ok(())
}

/// Forward stdin keys to the session until quit, EOF or Ctrl-C
async fn handle_keys(session: &SessionHandle, mut eta: bool) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            return Ok(());
        };

        let Some(command) = KeyCommand::parse(&line) else {
            if !line.trim().is_empty() {
                println!("{}", keys::HELP);
            }
            continue;
        };

        match command {
            KeyCommand::TogglePlay => session.toggle_play()?,
            KeyCommand::Stop => session.stop()?,
            KeyCommand::Next => session.next()?,
            KeyCommand::Previous => session.previous()?,
            KeyCommand::Seek(index) => session.seek(index)?,
            KeyCommand::Reset => session.reset()?,
            KeyCommand::ToggleEta => {
                eta = !eta;
                session.set_eta_requested(eta)?;
            }
            KeyCommand::Quit => return Ok(()),
        }
    }
}

async fn print_events(mut events: broadcast::Receiver<ReaderEvent>, sentences: SentenceList) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = render::event_line(&event, &sentences) {
                    println!("{line}");
                }
                if matches!(
                    event,
                    ReaderEvent::StateChanged {
                        state: ReaderState::Finished,
                        ..
                    }
                ) {
                    println!("Done. Press q to quit, b or g <N> to go back.");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!("Output skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn show_positions(
    config: &AppConfig,
    document: Option<String>,
    file: Option<&Path>,
) -> anyhow::Result<()> {
    use recital_core::storage::PositionStore;

    let text = match file {
        Some(file) => Some(read_text(file).await?),
        None => None,
    };
    let sentence_count = text.as_deref().map(|text| segment(text).len());
    let document = document
        .map(DocumentId::new)
        .or_else(|| text.as_deref().map(DocumentId::for_text));

    let store = SqlitePositionStore::open(&config.storage.database_url).await?;

    match document {
        Some(document) => match store.load(&document).await? {
            Some(snapshot) => {
                println!("{}", render::snapshot_line(&snapshot, sentence_count));
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            None => println!("No saved position for {document}"),
        },
        None => {
            let snapshots = store.list().await?;
            if snapshots.is_empty() {
                println!("No saved positions");
            }
            for snapshot in &snapshots {
                println!("{}", render::snapshot_line(snapshot, None));
            }
        }
    }

    Ok(())
}
