use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use mdnote::fs::LocalFileSystem;
use mdnote::settings::{JsonConfigService, MemoryConfigService, SettingsStore};
use mdnote::shell::{ShellBackend, ShellIntegration, SystemRunner};
use mdnote::store::FileStore;
use mdnote::{app, logging, markdown};

#[derive(Parser)]
#[command(name = "mdnote", version, about = "A terminal markdown note editor")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// File to open for editing (created empty if missing)
    file: Option<PathBuf>,

    /// Start a fresh note in DIR
    #[arg(long, value_name = "DIR", conflicts_with = "file")]
    new: Option<PathBuf>,

    /// Register the file association and "new note here" action, then exit
    #[arg(long, conflicts_with = "unregister")]
    register: bool,

    /// Remove the shell integration, then exit
    #[arg(long)]
    unregister: bool,

    /// Shell integration backend (defaults to the platform's own)
    #[arg(long, value_enum)]
    shell_backend: Option<ShellBackend>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export markdown to standalone, sanitized HTML
    Export {
        /// Markdown file to export
        file: PathBuf,
        /// Output path (defaults to same name with .html extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let log_guard = logging::init();

    if let Some(Commands::Export { file, output }) = cli.command {
        return handle_export(&file, output.as_deref());
    }

    let backend = cli.shell_backend.unwrap_or_default();
    if cli.register || cli.unregister {
        let code = handle_shell_flag(backend, cli.register);
        // exit() skips destructors; flush the log writer first
        drop(log_guard);
        std::process::exit(code);
    }

    ensure_registered(backend);

    let store = match open_initial_document(cli.file.as_deref(), cli.new.as_deref()) {
        Ok(store) => store,
        Err(msg) => {
            eprintln!("Error: {msg}");
            std::process::exit(1);
        }
    };

    let config: Box<dyn mdnote::settings::ConfigService> =
        match JsonConfigService::from_default_location() {
            Ok(config) => Box::new(config),
            Err(e) => {
                tracing::warn!(error = %e, "settings will not persist");
                Box::new(MemoryConfigService::new())
            }
        };
    let settings = SettingsStore::load(config);

    let result = run_editor(store, settings);
    drop(log_guard);
    result
}

/// Builds the file store for the requested launch mode.
fn open_initial_document(file: Option<&Path>, new_in: Option<&Path>) -> Result<FileStore, String> {
    if let Some(dir) = new_in {
        let mut store = FileStore::new(Box::new(LocalFileSystem::with_start_dir(dir)));
        let path = store.create_new_file_in(dir).map_err(|e| e.to_string())?;
        tracing::info!(path = %path.display(), "new note");
        return Ok(store);
    }

    let Some(file) = file else {
        return Ok(FileStore::new(Box::new(LocalFileSystem::new())));
    };

    if !file.exists() {
        std::fs::write(file, "").map_err(|e| format!("{}: {e}", file.display()))?;
    }
    let path = file
        .canonicalize()
        .map_err(|e| format!("{}: {e}", file.display()))?;
    let start_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut store = FileStore::new(Box::new(LocalFileSystem::with_start_dir(start_dir)));
    store.open_file(&path).map_err(|e| e.to_string())?;
    Ok(store)
}

/// Handles `mdnote export file.md` and exits.
fn handle_export(file: &Path, output: Option<&Path>) -> io::Result<()> {
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error: {}: {e}", file.display());
            std::process::exit(1);
        }
    };

    let target = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| markdown::html::export_path(file));
    let title = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match std::fs::write(&target, markdown::render_document(&title, &content)) {
        Ok(()) => {
            println!("Exported to {}", target.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("Export failed: {e}");
            std::process::exit(1);
        }
    }
}

fn shell_integration(backend: ShellBackend) -> Result<Box<dyn ShellIntegration>, String> {
    backend.check_host().map_err(|e| e.to_string())?;
    let exe = std::env::current_exe().map_err(|e| e.to_string())?;
    backend
        .integration(&exe, Box::new(SystemRunner))
        .map_err(|e| e.to_string())
}

/// `--register` / `--unregister`: silent, exit code only.
fn handle_shell_flag(backend: ShellBackend, register: bool) -> i32 {
    let integration = match shell_integration(backend) {
        Ok(integration) => integration,
        Err(e) => {
            tracing::error!(backend = backend.name(), error = %e, "shell integration unavailable");
            return 1;
        }
    };
    if register {
        match integration.register() {
            Ok(()) => {
                tracing::info!(backend = backend.name(), "shell integration registered");
                0
            }
            Err(e) => {
                tracing::error!(backend = backend.name(), error = %e, "registration failed");
                1
            }
        }
    } else {
        integration.unregister();
        tracing::info!(backend = backend.name(), "shell integration removed");
        0
    }
}

/// Registers at launch when missing. Failures never block startup.
fn ensure_registered(backend: ShellBackend) {
    let integration = match shell_integration(backend) {
        Ok(integration) => integration,
        Err(e) => {
            tracing::debug!(backend = backend.name(), error = %e, "skipping launch registration");
            return;
        }
    };
    if integration.is_registered() {
        return;
    }
    if let Err(e) = integration.register() {
        tracing::warn!(backend = backend.name(), error = %e, "launch registration failed");
    }
}

/// Sets up the terminal, runs the TUI editor, and restores the terminal on exit.
fn run_editor(store: FileStore, settings: SettingsStore) -> io::Result<()> {
    // Setup panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        tracing::error!(%info, "panic");
        original_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, store, settings);

    restore_terminal()?;

    if let Err(e) = result {
        tracing::error!(error = %e, "editor loop failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: FileStore,
    settings: SettingsStore,
) -> io::Result<()> {
    let mut app = app::App::new(store, settings);
    app.enable_file_watcher();
    tracing::info!(file = %app.store.display_name(), "editor started");

    loop {
        app.render_frame(terminal)?;

        // Block up to 100ms waiting for the first event; tick() runs ~10x/sec
        // for autosave, scroll sync and status expiry.
        if event::poll(Duration::from_millis(100))? {
            // Drain all queued events without blocking, then render immediately.
            loop {
                let ev = event::read()?;
                app.handle_event(ev);
                if app.should_quit {
                    break;
                }
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    tracing::info!("editor closed");
    Ok(())
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    Ok(())
}
