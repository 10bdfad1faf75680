//! # whenline
//!
//! Command-line entry point: runs catch-up cycles against a content
//! repository's `SQLite` event log, renders the Markwhen timeline to stdout
//! and manages the projection's state file.

#![deny(unsafe_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use whenline_core::timestamp::parse_w3c;
use whenline_events::{AppendEvent, ConnectionConfig, EventStore};
use whenline_projection::{MarkwhenProjection, StateFile, render_markwhen};
use whenline_settings::WhenlineSettings;

/// File name of the event log inside a repository's data directory.
const EVENT_LOG_FILE_NAME: &str = "events.db";

/// Markwhen timelines from a content repository event log.
#[derive(Parser, Debug)]
#[command(
    name = "whenline",
    version,
    about = "Markwhen timelines from a content repository event log"
)]
struct Cli {
    /// Root directory for state files and event logs (overrides settings).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file (default: `~/.whenline/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Content repository to operate on (overrides settings).
    #[arg(long, global = true)]
    content_repository: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Markwhen timeline.
    Render,
    /// Run one catch-up cycle against the event log.
    CatchUp,
    /// Replace the state with an empty snapshot.
    Reset,
    /// Create the data directory and an empty snapshot.
    Setup,
    /// Print the bookmark, live content stream and node count.
    Status,
    /// Append one event to the event log.
    Append(AppendArgs),
}

#[derive(Args, Debug)]
struct AppendArgs {
    /// Event type, e.g. `NodePropertiesWereSet`.
    #[arg(long = "type", value_name = "TYPE")]
    event_type: String,

    /// Event payload as a JSON object.
    #[arg(long, value_name = "JSON")]
    payload: String,

    /// Stream to append to (default: derived from the payload).
    #[arg(long)]
    stream: Option<String>,

    /// RFC 3339 time stored as the event's initiating timestamp.
    #[arg(long, value_name = "RFC3339")]
    initiating_timestamp: Option<String>,
}

/// Filesystem locations of one content repository.
#[derive(Debug)]
struct Repository {
    id: String,
    dir: PathBuf,
}

impl Repository {
    fn resolve(cli: &Cli, settings: &WhenlineSettings) -> Result<Self> {
        let id = cli
            .content_repository
            .clone()
            .unwrap_or_else(|| settings.default_content_repository.clone());
        anyhow::ensure!(
            !id.trim().is_empty() && !id.contains(['/', '\\']) && id != "." && id != "..",
            "Invalid content repository id: {id:?}"
        );
        let data_dir = cli
            .data_dir
            .clone()
            .unwrap_or_else(|| settings.resolve_data_dir(&whenline_settings::whenline_home()));
        let dir = data_dir.join(&id);
        Ok(Self { id, dir })
    }

    fn state_file(&self) -> StateFile {
        StateFile::in_dir(&self.dir)
    }

    fn event_log(&self) -> PathBuf {
        self.dir.join(EVENT_LOG_FILE_NAME)
    }

    fn open_event_log(&self, config: &ConnectionConfig) -> Result<EventStore> {
        let path = self.event_log();
        ensure_parent_dir(&path)?;
        EventStore::open(&path, config)
            .with_context(|| format!("Failed to open event log: {}", path.display()))
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn connection_config(settings: &WhenlineSettings) -> ConnectionConfig {
    ConnectionConfig {
        pool_size: settings.event_store.pool_size,
        busy_timeout_ms: settings.event_store.busy_timeout_ms,
    }
}

/// Stream name for an appended event when none is given.
fn default_stream(event_type: &str, payload: &Value) -> String {
    if let Some(cs) = payload.get("contentStreamId").and_then(Value::as_str) {
        format!("ContentStream:{cs}")
    } else if let Some(ws) = payload.get("workspaceName").and_then(Value::as_str) {
        format!("Workspace:{ws}")
    } else {
        event_type.to_string()
    }
}

fn run(cli: Cli, settings: &WhenlineSettings, out: &mut dyn Write) -> Result<()> {
    let repo = Repository::resolve(&cli, settings)?;
    debug!(repository = %repo.id, dir = %repo.dir.display(), "resolved content repository");
    let config = connection_config(settings);

    match cli.command {
        Command::Render => {
            let projection = MarkwhenProjection::new(repo.state_file());
            let state = projection.state().context("Failed to load projection state")?;
            let rendered = render_markwhen(&state).context("Failed to render timeline")?;
            writeln!(out, "{rendered}")?;
        }
        Command::CatchUp => {
            let store = repo.open_event_log(&config)?;
            let projection = MarkwhenProjection::new(repo.state_file());
            let bookmark = projection
                .sequence_number()
                .context("Failed to read projection state")?;
            let pending = store.events_after(bookmark).context("Failed to read event log")?;
            if !projection.can_handle(&pending) {
                info!(%bookmark, pending = pending.len(), "nothing to project, skipping cycle");
                writeln!(out, "skipped: {} pending event(s), none projected", pending.len())?;
                return Ok(());
            }
            let state = projection.catch_up(&store).context("Catch-up failed")?;
            writeln!(out, "caught up to sequence number {}", state.sequence_number())?;
        }
        Command::Reset => {
            MarkwhenProjection::new(repo.state_file())
                .reset()
                .context("Failed to reset projection")?;
            writeln!(out, "reset {}", repo.id)?;
        }
        Command::Setup => {
            MarkwhenProjection::new(repo.state_file())
                .setup()
                .context("Failed to set up projection")?;
            writeln!(out, "set up {} in {}", repo.id, repo.dir.display())?;
        }
        Command::Status => {
            let projection = MarkwhenProjection::new(repo.state_file());
            let state = projection.state().context("Failed to load projection state")?;
            writeln!(out, "repository: {}", repo.id)?;
            writeln!(out, "sequence number: {}", state.sequence_number())?;
            match state.live_content_stream_id() {
                Some(cs) => writeln!(out, "live content stream: {cs}")?,
                None => writeln!(out, "live content stream: (none)")?,
            }
            writeln!(out, "nodes: {}", state.node_count())?;
            if repo.event_log().exists() {
                let last = repo
                    .open_event_log(&config)?
                    .last_sequence_number()
                    .context("Failed to read event log")?;
                writeln!(out, "event log: {last}")?;
            } else {
                writeln!(out, "event log: (missing)")?;
            }
        }
        Command::Append(args) => {
            let payload: Value =
                serde_json::from_str(&args.payload).context("Payload is not valid JSON")?;
            anyhow::ensure!(payload.is_object(), "Payload must be a JSON object");
            let stream = args
                .stream
                .unwrap_or_else(|| default_stream(&args.event_type, &payload));

            let mut event = AppendEvent::new(&stream, &args.event_type, payload);
            if let Some(ts) = args.initiating_timestamp.as_deref() {
                let _ = parse_w3c(ts)
                    .with_context(|| format!("Invalid initiating timestamp: {ts}"))?;
                event = event.with_initiating_timestamp(ts);
            }
            let stored = repo
                .open_event_log(&config)?
                .append(&event)
                .context("Failed to append event")?;
            info!(
                sequence_number = %stored.sequence_number,
                event_type = %stored.event_type,
                %stream,
                "appended event"
            );
            writeln!(out, "{}", stored.sequence_number)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Settings first: the log level comes from them
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(whenline_settings::settings_path);
    let settings = whenline_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings: {}", settings_path.display()))?;
    whenline_core::logging::init_subscriber(&settings.logging.level);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &settings, &mut out)?;
    out.flush()?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
