use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Instant,
};

use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser};
use crossterm::tty::IsTty;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};

use wpmtest::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    logging::init_logging,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    terminal, ui, App,
};

/// type the passage before the clock runs out and see your words per minute
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// number of seconds to run the test (overrides the config file)
    #[clap(short = 's', long)]
    seconds: Option<u64>,

    /// alternate config file
    #[clap(long)]
    config: Option<PathBuf>,

    /// file to append logs to
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// increase log verbosity (repeatable)
    #[clap(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layers command line overrides on top of the stored config.
    fn apply_to(&self, stored: Config) -> Config {
        Config {
            countdown_seconds: self.seconds.unwrap_or(stored.countdown_seconds),
            verbosity: if self.verbose > 0 {
                self.verbose
            } else {
                stored.verbosity
            },
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = cli.apply_to(store.load());

    let log_file = match cli.log_file.clone().or_else(AppDirs::log_path) {
        Some(path) => path,
        None => return Err(wpmtest::Error::NoStateDir.into()),
    };
    init_logging(config.verbosity, &log_file)?;
    info!(
        countdown = config.countdown_seconds,
        config = %store.path().display(),
        "starting"
    );

    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "config saved");
    }

    let _restore = terminal::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.session_config());
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::per_second());
    let result = start_tui(&mut terminal, &mut app, &mut runner);

    if let Err(e) = &result {
        warn!(error = %e, "terminal loop failed");
    }
    result?;
    info!("exiting");
    Ok(())
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut Runner<E, T>,
) -> wpmtest::Result<()> {
    terminal.draw(|f| ui::draw(f, app))?;

    while let Some(event) = runner.step() {
        let now = Instant::now();
        let effect = app.dispatch(event, now);
        runner.apply(effect, now);

        if app.should_quit() {
            break;
        }
        terminal.draw(|f| ui::draw(f, app))?;
    }

    Ok(())
}
