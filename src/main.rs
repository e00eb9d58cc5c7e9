mod app;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod ide;
mod logging;
mod store;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::AppConfig;
use crate::event::{Event, EventHandler};
use crate::ide::Workspace;
use crate::store::http::HttpFileStore;
use crate::tui::{install_panic_hook, Tui};

/// A terminal IDE for the files, folders and macros of a Magic backend.
#[derive(Parser, Debug)]
#[command(name = "hyper-ide", version, about)]
struct Cli {
    /// Base URL of the backend
    #[arg(long, env = "MAGIC_URL")]
    url: Option<String>,

    /// JWT bearer token
    #[arg(long, env = "MAGIC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show system folders
    #[arg(long)]
    system: bool,

    /// Delete without asking (unsaved documents still prompt)
    #[arg(long)]
    no_confirm: bool,

    /// Log filter, e.g. `debug` or `hyper_ide=trace`
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Flags given on the command line, as the highest-priority config layer.
    fn overrides(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.backend.url = self.url.clone();
        config.backend.token = self.token.clone();
        if self.system {
            config.general.show_system = Some(true);
        }
        if self.no_confirm {
            config.general.confirm_delete = Some(false);
        }
        config.logging.level = self.log_level.clone();
        config
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    let _log_guard = logging::init(config.log_level(), config.log_dir());

    let url = config.backend_url()?;
    let store = HttpFileStore::new(url, config.token(), config.timeout())?;
    tracing::info!(url, "starting");
    let workspace = Workspace::new(Arc::new(store), config.workspace_options());
    let mut app = App::new(workspace, config.tab_width());

    install_panic_hook();
    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(250));

    // A backend that is down is reported in the UI; `R` retries.
    if let Err(e) = app.workspace.load_root().await {
        app.report_error(e);
    }

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => {
                if let Some(action) = handler::handle_key_event(&mut app, key) {
                    app.perform(action).await;
                }
            }
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    tracing::info!("exiting");
    Ok(())
}
