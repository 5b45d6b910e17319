use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use terrorgraph::app::App;
use terrorgraph::config::{Cli, DashboardConfig};
use terrorgraph::data::{DataSource, EventStore, EventTable};
use terrorgraph::map::{Basemap, MapRenderer};
use terrorgraph::ui;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = DashboardConfig::resolve(&cli).context("failed to load configuration")?;
    init_logging(&config.logging.file, &config.logging.level)?;
    config.log_summary();

    // Load before taking over the terminal so failures print normally.
    let store = EventStore::new(DataSource::from_config(&config.source));
    let table = match store.table() {
        Ok(table) => table,
        Err(e) => {
            error!(error = %e, "event load failed");
            return Err(e).context("could not load events");
        }
    };

    let basemap = Basemap::load(&config.basemap.data_dir);

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, table, basemap, &config);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    info!("dashboard closed");
    result
}

/// Log to a file; the terminal belongs to the UI. `RUST_LOG` wins over the
/// configured level.
fn init_logging(path: &Path, level: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn run(
    terminal: &mut DefaultTerminal,
    table: &EventTable,
    basemap: Basemap,
    config: &DashboardConfig,
) -> Result<()> {
    let mut app = App::new(table, MapRenderer::new(basemap), config.export.dir.clone());
    info!(groups = app.groups.len(), rows = table.len(), "dashboard ready");

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only key presses, not releases
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
