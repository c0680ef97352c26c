use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod company;
mod controller;
mod domain;
mod engine;
mod inputter;
mod model;
mod store;
mod ui;

use controller::Controller;
use domain::{DirectoryConfig, DirectoryError};
use model::{Model, Status};
use store::CompanyStore;
use ui::DirectoryUI;

/// Browse, search and filter a directory of companies in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// JSON file with companies; the bundled list is used when omitted
    #[arg(short, long)]
    data: Option<String>,

    /// Simulated network latency of the initial load
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Probability (0.0 - 1.0) that the initial load fails on purpose
    #[arg(long, default_value_t = 0.0)]
    failure_rate: f64,

    /// Companies per page
    #[arg(long, default_value_t = domain::PAGE_SIZE)]
    page_size: usize,

    /// Key event poll interval
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Where to write logs; the terminal is used by the ui
    #[arg(long)]
    log_file: Option<String>,
}

impl Cli {
    fn config(&self) -> Result<DirectoryConfig, DirectoryError> {
        let mut cfg = DirectoryConfig::default()
            .with_fetch_delay(Duration::from_millis(self.delay_ms))
            .with_failure_rate(self.failure_rate)
            .with_page_size(self.page_size)
            .with_event_poll_time(self.poll_ms);
        if let Some(data) = &self.data {
            cfg = cfg.with_data_path(expand_path(data)?);
        }
        cfg.validate()
    }

    fn log_path(&self) -> Result<PathBuf, DirectoryError> {
        match &self.log_file {
            Some(path) => expand_path(path),
            None => Ok(std::env::temp_dir().join("cdir.log")),
        }
    }
}

fn expand_path(path: &str) -> Result<PathBuf, DirectoryError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| DirectoryError::Config(e.to_string()))
}

fn init_tracing(path: &Path) -> Result<(), DirectoryError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env("CDIR_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    controller: &Controller,
) -> Result<(), DirectoryError> {
    let uidata = model.subscribe();
    let mut ui = DirectoryUI::new();

    while model.status != Status::QUITTING {
        // Render the latest published state
        terminal.draw(|f| ui.draw(&uidata.borrow(), f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(model)?;
        model.update(message)?;
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), DirectoryError> {
    let cfg = cli.config()?;
    init_tracing(&cli.log_path()?)?;
    info!("Starting cdir with {cfg:?}");

    let store = CompanyStore::new(&cfg);
    let mut model = Model::init(&cfg);
    model.load(store.spawn_fetch());

    let controller = Controller::new(&cfg);
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &controller);
    ratatui::restore();

    info!(
        "Quitting with {} companies loaded, state was {:?}",
        model.companies().len(),
        model.load_state()
    );
    result
}
