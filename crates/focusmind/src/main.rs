//! focusmind - focus mode, notes and text tools from the command line
//!
//! Usage:
//!   focusmind serve [--page FILE]     Serve JSON-lines requests on stdio
//!   focusmind send <JSON>             Send one raw request
//!   focusmind toggle                  Turn focus mode on or off
//!   focusmind status                  Show focus mode and blocked sites
//!   focusmind sites [TEXT]            Show or replace the blocked-site list
//!   focusmind note add|list|rm|clear  Manage saved notes
//!   focusmind stats [--reset]         Show or reset focus statistics
//!   focusmind menu <ITEM> <TEXT>      Run a selection context-menu entry

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use focusmind::browser::HeadlessBrowser;
use focusmind::menu::menu_items;
use focusmind::notes::Note;
use focusmind::rules::InMemoryRulePlatform;
use focusmind::stats::FocusStats;
use focusmind::store::JsonFileStore;
use focusmind::text::UnavailableProvider;
use focusmind::validation::sanitize_domain_list;
use focusmind::{Background, Collaborators, Server};
use focusmind_core::format::{ellipsize, minutes};
use focusmind_core::{Config, Paths};

/// FocusMind - focus-mode site blocking, notes and on-device text tools
#[derive(Parser)]
#[command(name = "focusmind")]
#[command(about = "Focus-mode site blocking, notes and on-device text tools")]
#[command(version)]
#[command(after_help = r#"EXAMPLES:
    focusmind toggle                        # Start blocking distracting sites
    focusmind sites "youtube.com, reddit.com"
    focusmind note add "Read the RFC"
    focusmind send '{"action":"getFocusStats"}'
    focusmind serve --page article.txt      # Serve requests; FILE is the active tab

STORAGE:
    State lives in <data dir>/focusmind/storage.json and configuration in
    <config dir>/focusmind/config.json. Use --home to keep both elsewhere.

LOGGING:
    Set RUST_LOG (e.g. RUST_LOG=focusmind=debug). Logs go to stderr.
"#)]
struct Cli {
    /// Keep data and config under this directory
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON-lines requests on stdin/stdout
    Serve {
        /// Text file standing in for the active tab
        #[arg(long, value_name = "FILE")]
        page: Option<PathBuf>,
    },

    /// Send one raw request and print the response
    Send {
        /// Request object, e.g. '{"action":"getNotes"}'
        request: String,

        /// Text file standing in for the active tab
        #[arg(long, value_name = "FILE")]
        page: Option<PathBuf>,
    },

    /// Turn focus mode on or off
    #[command(alias = "t")]
    Toggle,

    /// Show focus mode and blocked sites
    #[command(alias = "st")]
    Status,

    /// Show the blocked-site list, or replace it with TEXT
    Sites {
        /// Domains separated by newlines, commas or semicolons
        text: Option<String>,
    },

    /// Manage saved notes
    #[command(subcommand)]
    Note(NoteCommands),

    /// Show focus statistics
    Stats {
        /// Reset both counters to zero
        #[arg(long)]
        reset: bool,
    },

    /// Run a selection context-menu entry on TEXT
    Menu {
        /// summarize-selection, rewrite-selection or translate-selection
        item: String,
        text: String,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Save a note
    Add { content: String },
    /// List notes, newest first
    #[command(alias = "ls")]
    List,
    /// Delete a note by id
    Rm { id: String },
    /// Delete every note
    Clear,
}

// ANSI color codes
const GREEN: &str = "\x1b[0;32m";
const CYAN: &str = "\x1b[0;36m";
const MAGENTA: &str = "\x1b[0;35m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const NC: &str = "\x1b[0m";

/// Check if stdout is a TTY and colors should be used
fn use_colors() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stdout())
}

/// Conditionally apply color
fn color(code: &str, text: &str) -> String {
    if use_colors() {
        format!("{}{}{}", code, text, NC)
    } else {
        text.to_string()
    }
}

/// The background service plus the receiving end of its output channel
struct App {
    background: Background,
    outbox: mpsc::UnboundedSender<Value>,
    lines: mpsc::UnboundedReceiver<Value>,
}

async fn open(paths: &Paths, page: Option<PathBuf>) -> Result<App> {
    let config = Config::load(&paths.config_file())?;
    let (outbox, lines) = mpsc::unbounded_channel();

    let background = Background::new(
        Collaborators {
            store: Arc::new(JsonFileStore::new(&paths.storage_file())),
            platform: Arc::new(InMemoryRulePlatform::new()),
            provider: Arc::new(UnavailableProvider),
            browser: Arc::new(HeadlessBrowser::new(page, outbox.clone())),
        },
        &config,
    );
    background
        .start()
        .await
        .with_context(|| format!("Failed to open storage at {}", paths.storage_file().display()))?;

    Ok(App {
        background,
        outbox,
        lines,
    })
}

impl App {
    /// Dispatch through the router, turning `{ error }` into an Err
    async fn request(&self, request: Value) -> Result<Value> {
        let response = self.background.router.dispatch(&request).await;
        if let Some(message) = response.error_message() {
            bail!("{}", message);
        }
        Ok(response.into_value())
    }

    /// Print anything the browser emitted while handling a command
    fn flush_browser_output(&mut self) {
        while let Ok(line) = self.lines.try_recv() {
            println!("{}", line);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs to stderr; stdout carries responses
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = match cli.home {
        Some(home) => Paths::under(home),
        None => Paths::new(),
    };

    match cli.command {
        Some(Commands::Serve { page }) => cmd_serve(&paths, page).await,
        Some(Commands::Send { request, page }) => cmd_send(&paths, &request, page).await,
        Some(Commands::Toggle) => cmd_toggle(&open(&paths, None).await?).await,
        Some(Commands::Status) | None => cmd_status(&open(&paths, None).await?).await,
        Some(Commands::Sites { text }) => cmd_sites(&open(&paths, None).await?, text).await,
        Some(Commands::Note(command)) => cmd_note(&open(&paths, None).await?, command).await,
        Some(Commands::Stats { reset }) => cmd_stats(&open(&paths, None).await?, reset).await,
        Some(Commands::Menu { item, text }) => cmd_menu(open(&paths, None).await?, &item, &text).await,
    }
}

/// Serve requests until stdin closes
async fn cmd_serve(paths: &Paths, page: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting FocusMind server");
    let App {
        background,
        outbox,
        lines,
    } = open(paths, page).await?;

    let mut server = Server::new(background.router.clone(), outbox, lines);
    server.run().await
}

/// Send one raw request
async fn cmd_send(paths: &Paths, request: &str, page: Option<PathBuf>) -> Result<()> {
    let request: Value = serde_json::from_str(request).context("Request is not valid JSON")?;
    let mut app = open(paths, page).await?;

    let response = app.background.router.dispatch(&request).await;
    app.flush_browser_output();
    println!("{}", serde_json::to_string_pretty(&response.into_value())?);
    Ok(())
}

async fn cmd_toggle(app: &App) -> Result<()> {
    let response = app.request(json!({ "action": "toggleFocusMode" })).await?;
    if response["focusModeActive"].as_bool() == Some(true) {
        println!("{} Focus mode {}", color(GREEN, "[ok]"), color(&format!("{}{}", BOLD, MAGENTA), "ON"));
        println!("Distracting sites are blocked. Run 'focusmind toggle' again to stop.");
    } else {
        println!("{} Focus mode OFF", color(GREEN, "[ok]"));
    }
    Ok(())
}

async fn cmd_status(app: &App) -> Result<()> {
    let response = app.request(json!({ "action": "getFocusStatus" })).await?;
    let active = response["focusModeActive"].as_bool().unwrap_or(false);
    let sites: Vec<String> = serde_json::from_value(response["blockedSites"].clone())?;

    if active {
        println!("{}", color(&format!("{}{}", BOLD, MAGENTA), "FOCUS MODE ACTIVE"));
    } else {
        println!("Focus mode is off");
    }
    println!();
    print_sites(&sites);
    if !active {
        println!();
        println!("Start with: focusmind toggle");
    }
    Ok(())
}

fn print_sites(sites: &[String]) {
    if sites.is_empty() {
        println!("  {} none", color(CYAN, "Blocked sites:"));
        return;
    }
    println!("  {}", color(CYAN, "Blocked sites:"));
    for site in sites {
        println!("    {}", site);
    }
}

async fn cmd_sites(app: &App, text: Option<String>) -> Result<()> {
    let Some(text) = text else {
        let response = app.request(json!({ "action": "getFocusStatus" })).await?;
        let sites: Vec<String> = serde_json::from_value(response["blockedSites"].clone())?;
        print_sites(&sites);
        return Ok(());
    };

    let sites = sanitize_domain_list(&text);
    app.request(json!({ "action": "updateBlockedSites", "sites": sites })).await?;
    println!("{} Blocking {} site(s)", color(GREEN, "[ok]"), sites.len());
    Ok(())
}

async fn cmd_note(app: &App, command: NoteCommands) -> Result<()> {
    match command {
        NoteCommands::Add { content } => {
            app.request(json!({ "action": "saveNote", "content": content })).await?;
            println!("{} Note saved", color(GREEN, "[ok]"));
        }
        NoteCommands::List => {
            let response = app.request(json!({ "action": "getNotes" })).await?;
            let notes: Vec<Note> = serde_json::from_value(response["notes"].clone())?;
            if notes.is_empty() {
                println!("No notes saved yet.");
            }
            for note in notes {
                println!("{}  {}", color(CYAN, &note.id), color(DIM, &note.created_at));
                println!("  {}", ellipsize(&note.content.replace('\n', " "), 72));
            }
        }
        NoteCommands::Rm { id } => {
            app.request(json!({ "action": "deleteNote", "id": id })).await?;
            println!("{} Note deleted", color(GREEN, "[ok]"));
        }
        NoteCommands::Clear => {
            app.request(json!({ "action": "clearAllNotes" })).await?;
            println!("{} All notes cleared", color(GREEN, "[ok]"));
        }
    }
    Ok(())
}

async fn cmd_stats(app: &App, reset: bool) -> Result<()> {
    if reset {
        app.request(json!({ "action": "resetFocusStats" })).await?;
        println!("{} Statistics reset", color(GREEN, "[ok]"));
        return Ok(());
    }

    let response = app.request(json!({ "action": "getFocusStats" })).await?;
    let stats: FocusStats = serde_json::from_value(response["stats"].clone())?;
    let (hours, mins) = stats.total_time();

    println!("{}Focus Statistics{}", BOLD, NC);
    println!();
    println!(
        "  {}     {}h {}m ({})",
        color(CYAN, "Total Focus Time:"),
        hours,
        mins,
        minutes(stats.total_focus_time_ms as i64)
    );
    println!("  {}  {}", color(CYAN, "Distractions Blocked:"), stats.distractions_blocked);
    Ok(())
}

async fn cmd_menu(mut app: App, item: &str, text: &str) -> Result<()> {
    if !menu_items().iter().any(|entry| entry.id == item) {
        let ids: Vec<_> = menu_items().iter().map(|entry| entry.id).collect();
        bail!("Unknown menu item '{}'. Expected one of: {}", item, ids.join(", "));
    }

    let outcome = app
        .background
        .menu
        .on_click(item, text, Some(HeadlessBrowser::PAGE_TAB))
        .await;
    app.flush_browser_output();

    outcome?;
    Ok(())
}
