use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chessbridge::{AnalysisOpener, CoordinatorContext, Navigator, SettingsService, Storage, WatcherContext};
use chessbridge_cdp_driver::{CdpBrowser, DriverConfig};
use chessbridge_core_types::BridgeError;
use chessbridge_game_browser::{filter_games, GameBrowser, SelectDisposition};
use chessbridge_message_bus::{BusError, Message, MessageBus, Reply};
use chessbridge_record_fetch::{HttpGamesProvider, HttpImportClient};
use chessbridge_record_inject::InjectionPipeline;

const TARGET_ANALYSIS_URL: &str = "https://lichess.org/analysis";

/// Carry finished chess.com games into lichess analysis.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storage file path (defaults to the platform config dir).
    #[arg(long, value_name = "FILE")]
    storage: Option<PathBuf>,

    /// Run the browser without a visible window.
    #[arg(long)]
    headless: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch a live game page and export when the game finishes.
    Watch {
        /// URL of the game page to watch.
        url: String,
    },
    /// One-shot export of the finished game on a page.
    Import {
        /// URL of the finished game page.
        url: String,
    },
    /// Browse recent games and load one into the analysis board.
    Games {
        /// Source-site username; prompted for and remembered if absent.
        #[arg(long)]
        username: Option<String>,
        /// Substring filter across players and result.
        #[arg(long)]
        query: Option<String>,
        /// Load the Nth listed game into the analysis board (1-based).
        #[arg(long)]
        pick: Option<usize>,
    },
    /// Detect and print the session state of a page.
    Status {
        /// URL of the page to inspect.
        url: String,
    },
    /// Show or change settings.
    Settings {
        /// Start the export automatically when a game finishes.
        #[arg(long)]
        auto_open: Option<bool>,
        /// Remembered source-site username.
        #[arg(long)]
        username: Option<String>,
        /// Enable or disable notifications.
        #[arg(long)]
        notifications: Option<bool>,
    },
}

struct BrowserNavigator {
    browser: Arc<CdpBrowser>,
}

#[async_trait]
impl Navigator for BrowserNavigator {
    async fn open_tab(&self, url: &str) -> Result<(), BridgeError> {
        self.browser.open(url).await.map(|_| ())
    }
}

struct Runtime {
    bus: Arc<MessageBus>,
    settings: Arc<SettingsService>,
    browser: Arc<CdpBrowser>,
}

impl Runtime {
    async fn bring_up(cli: &Cli) -> Result<Self> {
        let storage = Arc::new(Storage::open(
            cli.storage.clone().unwrap_or_else(Storage::default_path),
        ));
        let bus = MessageBus::new(32);
        let settings = SettingsService::new(storage, bus.clone());
        let browser = CdpBrowser::launch(&DriverConfig {
            headless: cli.headless,
            ..DriverConfig::default()
        })
        .await
        .context("launching the browser")?;
        Ok(Self {
            bus,
            settings,
            browser,
        })
    }

    async fn opener(&self, page_url: &str) -> Result<(Arc<chessbridge_cdp_driver::CdpPage>, Arc<AnalysisOpener>)> {
        let page = self
            .browser
            .open(page_url)
            .await
            .with_context(|| format!("opening {page_url}"))?;
        let provider = Arc::new(HttpGamesProvider::new()?);
        let importer = Arc::new(HttpImportClient::new()?);
        let navigator = Arc::new(BrowserNavigator {
            browser: self.browser.clone(),
        });
        let opener = AnalysisOpener::new(page.clone(), provider, importer, navigator);
        Ok((page, opener))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Watch { url } => watch(&cli, url).await,
        Command::Import { url } => import(&cli, url).await,
        Command::Games {
            username,
            query,
            pick,
        } => games(&cli, username.clone(), query.clone(), *pick).await,
        Command::Status { url } => status(&cli, url).await,
        Command::Settings {
            auto_open,
            username,
            notifications,
        } => settings(&cli, *auto_open, username.clone(), *notifications).await,
    }
}

async fn watch(cli: &Cli, url: &str) -> Result<()> {
    let runtime = Runtime::bring_up(cli).await?;
    let (page, opener) = runtime.opener(url).await?;

    let coordinator = CoordinatorContext::start(runtime.bus.clone());
    let watcher = WatcherContext::start(
        page,
        runtime.bus.clone(),
        runtime.settings.clone(),
        opener,
    )
    .await;

    info!(%url, "watching; press Ctrl+C to stop");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl+C")?;

    watcher.stop();
    coordinator.stop();
    runtime.browser.close().await;
    Ok(())
}

async fn import(cli: &Cli, url: &str) -> Result<()> {
    let runtime = Runtime::bring_up(cli).await?;
    let (_page, opener) = runtime.opener(url).await?;

    let analysis_url = opener
        .run()
        .await
        .map_err(|err| anyhow!("export failed: {err}"))?;
    println!("{analysis_url}");

    runtime.browser.close().await;
    Ok(())
}

async fn games(
    cli: &Cli,
    username: Option<String>,
    query: Option<String>,
    pick: Option<usize>,
) -> Result<()> {
    let runtime = Runtime::bring_up(cli).await?;
    let provider = Arc::new(HttpGamesProvider::new()?);
    let browser = GameBrowser::new(provider, runtime.settings.clone());

    let username = match username {
        Some(username) => {
            browser.submit_identity(&username).await;
            username
        }
        None => match browser.resolve_identity().await {
            Some(remembered) => remembered,
            None => {
                let entered = prompt("Enter your chess.com username: ")?;
                browser.submit_identity(&entered).await;
                entered
            }
        },
    };

    let all_games = browser
        .load_games(&username)
        .await
        .map_err(|err| anyhow!("loading games for '{username}': {err}"))?;
    let listed = filter_games(&all_games, query.as_deref().unwrap_or(""));

    for (index, game) in listed.iter().enumerate() {
        println!(
            "{:>3}. {}  {}  {}  {}",
            index + 1,
            game.pairing(),
            game.result,
            game.time_control,
            game.end_time.format("%Y-%m-%d %H:%M"),
        );
    }

    if let Some(pick) = pick {
        let record = listed
            .get(pick.checked_sub(1).ok_or_else(|| anyhow!("--pick is 1-based"))?)
            .ok_or_else(|| anyhow!("--pick {pick} is out of range"))?;

        let page = runtime
            .browser
            .open(TARGET_ANALYSIS_URL)
            .await
            .context("opening the analysis board")?;
        let pipeline = InjectionPipeline::new(page.clone());
        match browser.select(record, &pipeline, page.as_ref()).await {
            SelectDisposition::Completed(outcome) => {
                info!(?outcome, "game loaded");
            }
            SelectDisposition::Failed(err) => bail!("loading the game failed: {err}"),
            SelectDisposition::AlreadyInFlight => bail!("another injection is already running"),
        }
        // Keep the analysis tab alive until the user is done with it.
        info!("game loaded; press Ctrl+C to close the browser");
        tokio::signal::ctrl_c().await.context("waiting for Ctrl+C")?;
    }

    runtime.browser.close().await;
    Ok(())
}

async fn status(cli: &Cli, url: &str) -> Result<()> {
    let runtime = Runtime::bring_up(cli).await?;
    let (page, opener) = runtime.opener(url).await?;
    let watcher = WatcherContext::start(
        page,
        runtime.bus.clone(),
        runtime.settings.clone(),
        opener,
    )
    .await;

    // Pull, don't wait for a push: this surface may have opened
    // mid-transition.
    let reply = runtime
        .bus
        .request(Message::GetGameState, Duration::from_secs(5))
        .await;
    match reply {
        Ok(Reply::GameState(state)) => {
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Ok(other) => bail!("unexpected reply: {other:?}"),
        Err(BusError::NoListener) => bail!("no watcher answered"),
        Err(BusError::Timeout(_)) => bail!("state query timed out"),
    }

    watcher.stop();
    runtime.browser.close().await;
    Ok(())
}

async fn settings(
    cli: &Cli,
    auto_open: Option<bool>,
    username: Option<String>,
    notifications: Option<bool>,
) -> Result<()> {
    let storage = Arc::new(Storage::open(
        cli.storage.clone().unwrap_or_else(Storage::default_path),
    ));
    let bus = MessageBus::new(8);
    let service = SettingsService::new(storage, bus);

    let mut current = service.load().await;
    let changed = auto_open.is_some() || username.is_some() || notifications.is_some();
    if let Some(auto_open) = auto_open {
        current.auto_open_analysis = auto_open;
    }
    if let Some(username) = username {
        current.source_username = Some(username);
    }
    if let Some(notifications) = notifications {
        current.notifications = notifications;
    }
    if changed {
        service.save(&current).await;
    }

    println!("{}", serde_json::to_string_pretty(&current)?);
    Ok(())
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    std::io::stdout().flush().context("flushing stdout")?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("reading stdin")?;
    let trimmed = line.trim().to_string();
    if trimmed.is_empty() {
        bail!("a username is required");
    }
    Ok(trimmed)
}
