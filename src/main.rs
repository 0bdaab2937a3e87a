use std::fs::File;
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use ratatui::crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
};
use tracing::{info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod domain;
mod header;
mod inputter;
mod loader;
mod model;
mod record;
mod ui;
mod view_state;

use controller::Controller;
use domain::{DEFAULT_PAGE_SIZE, TableConfig, TableError};
use model::{Model, Status};
use record::{Field, service_columns};
use ui::TableUI;
use view_state::SortDirection;

/// Browse a service registry file as a sortable, paginated table.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// csv, parquet or arrow file with one column per service field
    path: String,

    /// Rows shown per page
    #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: NonZeroUsize,

    /// Field to sort by initially
    #[arg(short, long, default_value = "serviceDefinition")]
    sort_by: Field,

    /// Start with a descending sort
    #[arg(long)]
    descending: bool,

    /// Milliseconds to wait for terminal events between redraws
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Write logs to this file, filtered by RUST_LOG
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn expand(path: &str) -> Result<PathBuf, TableError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| TableError::LoadingFailed(format!("Cannot expand {path}: {e}")))
}

fn init_logging(log_file: &str) -> Result<(), TableError> {
    let file = File::create(expand(log_file)?)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(args: Args) -> Result<(), TableError> {
    if let Some(log_file) = &args.log_file {
        init_logging(log_file)?;
    }
    info!("Starting svctable with {:?}", args);

    let path = expand(&args.path)?;
    let records = loader::load_records(path.clone())?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();

    let direction = if args.descending {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    let cfg = TableConfig::default()
        .event_poll_time(args.poll_ms)
        .page_size(args.page_size)
        .sort_key(args.sort_by)
        .sort_direction(direction);

    let mut model = Model::init(name, records, service_columns(), &cfg);
    let mut ui = TableUI::new();
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    // Mouse capture lets a click on the header sort the table.
    let result = execute!(io::stdout(), EnableMouseCapture)
        .map_err(TableError::from)
        .and_then(|_| event_loop(&mut terminal, &mut model, &mut ui, &controller));
    if let Err(e) = execute!(io::stdout(), DisableMouseCapture) {
        warn!("Could not disable mouse capture: {e}");
    }
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &mut TableUI,
    controller: &Controller,
) -> Result<(), TableError> {
    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(model, ui)? {
            model.update(Some(message))?;
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let args = Args::try_parse_from(["svctable", "services.csv"]).unwrap();
        assert_eq!(args.path, "services.csv");
        assert_eq!(args.page_size.get(), 5);
        assert_eq!(args.sort_by, Field::ServiceDefinition);
        assert!(!args.descending);
        assert_eq!(args.poll_ms, 100);
        assert!(args.log_file.is_none());
    }

    #[test]
    fn parses_sort_and_page_flags() {
        let args = Args::try_parse_from([
            "svctable",
            "services.csv",
            "-n",
            "10",
            "--sort-by",
            "port",
            "--descending",
        ])
        .unwrap();
        assert_eq!(args.page_size.get(), 10);
        assert_eq!(args.sort_by, Field::Port);
        assert!(args.descending);
    }

    #[test]
    fn rejects_zero_page_size_and_unknown_field() {
        assert!(Args::try_parse_from(["svctable", "x.csv", "-n", "0"]).is_err());
        assert!(Args::try_parse_from(["svctable", "x.csv", "-s", "calories"]).is_err());
    }

    #[test]
    fn expands_environment_variables() {
        let home = std::env::var("HOME").unwrap_or_default();
        if !home.is_empty() {
            assert_eq!(expand("$HOME/data.csv").unwrap(), PathBuf::from(format!("{home}/data.csv")));
        }
        assert!(expand("$SVCTABLE_SURELY_UNSET_VARIABLE/x.csv").is_err());
    }
}
