//! # otpdeck host
//!
//! Wires the TOTP library to a JSON-file store, the system clock, tracing and
//! a command-line front end.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

use std::io::Write;
use std::sync::Arc;

use otpdeck_totp::totp::{
    spawn_refresh_loop, AddOtpResult, JsonFileBackend, OtpDisplay, OtpEntry, OtpRegistrar,
    OtpUriParser, OtpUriStore, SharedOtpUriStore, SystemClock, Ticker, TimeProvider,
    TotpGeneratorFactory,
};

pub use cli::{Cli, Command};
pub use config::{AppConfig, LogFormat};
pub use error::AppError;

/// Services shared by every command.
pub struct App {
    config: AppConfig,
    store: SharedOtpUriStore,
    parser: OtpUriParser,
    clock: Arc<dyn TimeProvider>,
}

impl App {
    /// Open the store named by `config`, using the system clock.
    pub fn open(config: AppConfig) -> Result<Self, AppError> {
        let store = OtpUriStore::open(JsonFileBackend::new(&config.store_path))?.into_shared();
        Ok(Self {
            config,
            store,
            parser: OtpUriParser::default(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedOtpUriStore {
        &self.store
    }

    /// Run one command, writing user-facing output to `out`.
    pub async fn execute<W: Write>(&self, command: Command, out: &mut W) -> Result<(), AppError> {
        match command {
            Command::Add { uri } => {
                let result = self.registrar().add_uri(&uri).await;
                report(result, out)
            }
            Command::AddManual { name, issuer, key } => {
                let result = self.registrar().add_manual(&name, &issuer, &key).await;
                report(result, out)
            }
            Command::List => {
                for uri in self.store.lock().await.list() {
                    writeln!(out, "{uri}")?;
                }
                Ok(())
            }
            Command::Remove { uri } => {
                let mut store = self.store.lock().await;
                if store.contains(&uri) {
                    store.remove(&uri)?;
                    writeln!(out, "Removed {uri}")?;
                } else {
                    writeln!(out, "No entry for {uri}")?;
                }
                Ok(())
            }
            Command::Codes { json } => {
                let snapshot = self.load_display().await.snapshot();
                if json {
                    writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
                } else {
                    write_codes(out, &snapshot)?;
                }
                Ok(())
            }
            Command::Watch { ticks } => self.watch(ticks, out).await,
        }
    }

    fn registrar(&self) -> OtpRegistrar {
        OtpRegistrar::new(self.parser.clone(), Arc::clone(&self.store))
    }

    async fn load_display(&self) -> OtpDisplay {
        let factory = TotpGeneratorFactory::new(Arc::clone(&self.clock));
        OtpDisplay::load(Arc::clone(&self.store), &self.parser, &factory).await
    }

    async fn watch<W: Write>(&self, ticks: Option<usize>, out: &mut W) -> Result<(), AppError> {
        let mut ticker = Ticker::new(self.config.refresh_interval());
        if let Some(max) = ticks {
            ticker = ticker.with_max_ticks(max);
        }

        let (handle, task) = spawn_refresh_loop(self.load_display().await, ticker);
        let mut snapshots = handle.subscribe();
        let initial = snapshots.borrow_and_update().clone();
        write_codes(out, &initial)?;

        let mut refreshes = 0usize;
        while ticks.map_or(true, |max| refreshes < max) {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    refreshes += 1;
                    let snapshot = snapshots.borrow_and_update().clone();
                    writeln!(out)?;
                    write_codes(out, &snapshot)?;
                    out.flush()?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::debug!("interrupted");
                    break;
                }
            }
        }

        drop(handle);
        if let Err(e) = task.await {
            tracing::warn!("refresh loop ended abnormally: {}", e);
        }
        Ok(())
    }
}

fn report<W: Write>(result: AddOtpResult, out: &mut W) -> Result<(), AppError> {
    match result {
        AddOtpResult::Success(message) => {
            writeln!(out, "{message}")?;
            Ok(())
        }
        AddOtpResult::Error(message) => Err(AppError::Rejected(message)),
    }
}

fn entry_label(entry: &OtpEntry) -> String {
    match entry.issuer.as_deref().filter(|i| !i.is_empty()) {
        Some(issuer) => format!("{issuer} ({})", entry.account),
        None => entry.account.clone(),
    }
}

fn write_codes<W: Write>(out: &mut W, entries: &[OtpEntry]) -> Result<(), AppError> {
    if entries.is_empty() {
        writeln!(out, "No one-time passwords stored")?;
        return Ok(());
    }
    for entry in entries {
        writeln!(out, "{}  {}", entry.code, entry_label(entry))?;
    }
    Ok(())
}

/// Resolve configuration from `cli`, install logging and run the command
/// against stdout.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.validate()?;

    logging::init_logging(&config.log_level, config.log_format)?;
    tracing::debug!(store = %config.store_path.display(), command = ?cli.command, "starting");

    let app = App::open(config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app.execute(cli.command, &mut out).await
}
