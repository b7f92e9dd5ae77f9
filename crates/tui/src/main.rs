mod app;
mod events;
mod logging;
mod strings;
mod terminal;
mod theme;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use terminal::TerminalGuard;
use tg_transport::{ClientConfig, LocalTransport};
use tracing::info;

fn main() -> Result<()> {
    let _log_guard = logging::init();
    let config = ClientConfig::from_env_and_file().context("load client config")?;
    info!(target: "tui", "starting: history={} idle={:?}", config.history_capacity, config.idle_interval);
    let transport = Arc::new(LocalTransport::start(config.local.clone()));
    let mut app = app::App::new(transport, config);
    let mut term = TerminalGuard::new().context("set up terminal")?;
    events::run(&mut term.terminal, &mut app)
}
