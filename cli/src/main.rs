use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use zagadki::config::{load_env_files, Settings};
use zagadki::logging::init_tracing;
use zagadki::{ChannelHandle, Role, SessionController, SyncChannel, WsTransport};
use zagadki_core::catalog::{catalog_for, PuzzleKind};
use zagadki_core::{PuzzleView, HEAP};
use zagadki_relay::RoomHandle;

#[derive(Parser)]
#[command(name = "zagadki-cli", version, about = "Relay and session tools for zagadki puzzles")]
struct Cli {
    /// TOML settings file; ./zagadki.toml is used when present.
    #[arg(long, global = true, env = "ZAGADKI_CONFIG")]
    config: Option<PathBuf>,
    /// Tracing filter, overriding `[logging] filter`.
    #[arg(long, global = true, env = "ZAGADKI_LOG")]
    log: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Relay {
        #[command(subcommand)]
        command: RelayCommand,
    },
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Subcommand)]
enum RelayCommand {
    Serve {
        #[arg(long, env = "ZAGADKI_BIND")]
        bind: Option<String>,
        /// Do not hand the last update-state to peers that join late.
        #[arg(long)]
        no_replay: bool,
    },
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Mirror a running session and print every state it reaches.
    Watch {
        #[command(flatten)]
        target: SessionTarget,
    },
    /// Act as the authority for one batch of actions, then leave.
    Drive {
        #[command(flatten)]
        target: SessionTarget,
        #[arg(long)]
        view: Option<u32>,
        #[arg(long)]
        select: Option<String>,
        /// ITEM=CONTAINER, repeatable.
        #[arg(long = "place", value_parser = parse_placement)]
        placements: Vec<(u32, String)>,
        #[arg(long)]
        dismiss: bool,
        /// How long to wait for the current state and for frames to flush.
        #[arg(long, default_value_t = 300)]
        settle_ms: u64,
    },
}

/// Where a session connects and which puzzle it plays; both fall back to
/// the `[session]` section.
#[derive(Args)]
struct SessionTarget {
    #[arg(long, env = "ZAGADKI_RELAY_URL")]
    url: Option<String>,
    #[arg(long, env = "ZAGADKI_PUZZLE")]
    puzzle: Option<String>,
}

impl SessionTarget {
    fn apply(self, settings: &mut Settings) {
        if let Some(url) = self.url {
            settings.session.relay_url = url;
        }
        if let Some(puzzle) = self.puzzle {
            settings.session.puzzle = puzzle;
        }
    }
}

#[derive(Subcommand)]
enum CatalogCommand {
    List {
        #[arg(long)]
        puzzle: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_files();
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(filter) = cli.log {
        settings.logging.filter = filter;
    }
    init_tracing(&settings.logging.filter);
    match settings.source.as_deref() {
        Some(path) => debug!(path = %path.display(), "loaded config"),
        None => debug!("no config file, using defaults"),
    }

    match cli.command {
        Commands::Relay { command } => match command {
            RelayCommand::Serve { bind, no_replay } => {
                if let Some(bind) = bind {
                    settings.relay.bind = bind;
                }
                if no_replay {
                    settings.relay.replay_last_state = false;
                }
                let listener = zagadki_relay::bind(&settings.relay.bind).await?;
                let room = RoomHandle::new(settings.relay.replay_last_state);
                zagadki_relay::serve(listener, room).await?;
            }
        },
        Commands::Session { command } => match command {
            SessionCommand::Watch { target } => {
                target.apply(&mut settings);
                let kind = settings.puzzle_kind()?;
                let mut channel = SyncChannel::new(WsTransport::new(&settings.session.relay_url)?);
                channel
                    .connect()
                    .await
                    .with_context(|| format!("connecting to {}", settings.session.relay_url))?;
                let mut session = SessionController::new(kind, Role::Viewer, channel.handle());
                session.run(&mut channel, print_view).await;
                info!("relay went away");
            }
            SessionCommand::Drive {
                target,
                view,
                select,
                placements,
                dismiss,
                settle_ms,
            } => {
                target.apply(&mut settings);
                let kind = settings.puzzle_kind()?;
                let settle = Duration::from_millis(settle_ms);
                let mut channel = SyncChannel::new(WsTransport::new(&settings.session.relay_url)?);
                channel
                    .connect()
                    .await
                    .with_context(|| format!("connecting to {}", settings.session.relay_url))?;
                let mut session = SessionController::new(kind, Role::Authority, channel.handle());
                catch_up(&mut channel, &mut session, settle).await;

                if let Some(view) = view {
                    if !session.switch_view(view) {
                        debug!(view, "already on this view");
                    }
                }
                for (item_id, container) in &placements {
                    if !session.place(*item_id, container) {
                        warn!(item_id, %container, "placement ignored");
                    }
                }
                if let Some(asset) = select.as_deref() {
                    if !session.select(asset) {
                        warn!(%asset, "selection ignored");
                    }
                }
                if dismiss && !session.dismiss() {
                    warn!("nothing to dismiss, puzzle is not solved");
                }

                print_view(&session.projection());
                channel.close();
                tokio::time::sleep(settle).await;
            }
        },
        Commands::Catalog { command } => match command {
            CatalogCommand::List { puzzle } => {
                let kinds = match puzzle.as_deref() {
                    Some(slug) => match PuzzleKind::from_slug(slug) {
                        Some(kind) => vec![kind],
                        None => bail!("unknown puzzle {slug:?}"),
                    },
                    None => PuzzleKind::ALL.to_vec(),
                };
                for kind in kinds {
                    print_catalog(kind);
                }
            }
        },
    }

    Ok(())
}

/// Applies whatever the relay replays before `settle` passes without traffic.
async fn catch_up(
    channel: &mut SyncChannel<WsTransport>,
    session: &mut SessionController<ChannelHandle>,
    settle: Duration,
) {
    while let Ok(Some(event)) = timeout(settle, channel.next_event()).await {
        session.handle_event(&event);
    }
}

fn parse_placement(raw: &str) -> Result<(u32, String), String> {
    let (item, container) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ITEM=CONTAINER, got {raw:?}"))?;
    let item = item
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("bad item id {item:?}: {err}"))?;
    let container = container.trim();
    if container.is_empty() {
        return Err("container must not be empty".to_string());
    }
    Ok((item, container.to_string()))
}

fn print_view(view: &PuzzleView) {
    println!("{} view {}: {}", view.kind, view.view, view.direction);
    if view.kind.is_pick() {
        println!("  selected: {}", view.selected.as_deref().unwrap_or("-"));
    } else {
        for slot in view.containers.iter().map(|slot| slot.id.as_str()).chain([HEAP]) {
            let labels: Vec<&str> = view
                .items_in(slot)
                .map(|item| item.label.as_str())
                .collect();
            println!("  {slot}: {}", labels.join(", "));
        }
    }
    if let Some(celebration) = view.celebration.as_deref() {
        println!("  solved! {celebration}");
    }
}

fn print_catalog(kind: PuzzleKind) {
    let catalog = catalog_for(kind);
    println!("{kind} (default view {})", catalog.default_view);
    for entry in catalog.entries {
        println!("  {}: {}", entry.view, entry.config.assets.join(" "));
    }
}
