use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use emberscript::events::core::{ReloadScriptsEvent, SystemTimeEvent};
use emberscript::{ContainerStore, EventRegistry, InlineQueue, ScriptLibrary};

#[derive(Parser)]
#[command(version = env!("VERSION_STRING"), about = "Runs a container library against the script event engine", long_about = None)]
struct Cli {
    /// Path to the container library (default: the per-user config location)
    #[arg(short, long)]
    scripts: Option<PathBuf>,

    /// Enables file logging
    #[arg(long)]
    log_to_file: bool,

    /// Reload, fire the reload event and exit instead of running the clock loop
    #[arg(long)]
    once: bool,
}

/// Rebuild the path index from `store`, then fire the reload event with the
/// pass outcome.
fn reload_and_fire(registry: &mut EventRegistry, queue: &mut InlineQueue, store: &ContainerStore) {
    let report = registry.reload(store);
    if let Some(event) = registry.event_mut("Reload Scripts") {
        if let Some(kind) = event.kind_mut::<ReloadScriptsEvent>() {
            kind.set_had_error(report.had_error);
        }
        event.fire(queue);
    }
}

fn print_stats(registry: &EventRegistry) {
    for event in registry.events() {
        let stats = event.stats();
        info!(
            target: "events",
            "{}: {} firing(s), {} script run(s), {:?} in scripts",
            event.name(),
            stats.fires,
            stats.script_fires,
            stats.execution_time
        );
    }
}

/// Watch channel bumped on every SIGHUP.
#[cfg(unix)]
fn setup_reload_signal() -> watch::Receiver<u64> {
    let (reload_tx, reload_rx) = watch::channel(0u64);

    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to register SIGHUP handler: {}", e);
                return;
            }
        };

        while sighup.recv().await.is_some() {
            if reload_tx.is_closed() {
                break;
            }
            info!("Received SIGHUP - triggering container library reload");
            reload_tx.send_modify(|n| *n += 1);
        }
    });

    reload_rx
}

/// Non-Unix platforms have no SIGHUP; the channel never fires.
#[cfg(not(unix))]
fn setup_reload_signal() -> watch::Receiver<u64> {
    let (reload_tx, reload_rx) = watch::channel(0u64);
    tracing::warn!("SIGHUP reload not supported on this platform");
    std::mem::forget(reload_tx);
    reload_rx
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = emberscript::logging::init_logging("cli", cli.log_to_file)?;

    let library_path = cli.scripts.unwrap_or_else(ScriptLibrary::default_path);
    let mut store = ScriptLibrary::load(&library_path)
        .with_context(|| format!("loading container library {}", library_path.display()))?
        .into_store();
    info!("Loaded {} container(s)", store.len());

    let mut registry = EventRegistry::new();
    registry.register_core_events();
    let mut queue = InlineQueue::new();

    reload_and_fire(&mut registry, &mut queue, &store);

    if cli.once {
        print_stats(&registry);
        return Ok(());
    }

    let mut reload_rx = setup_reload_signal();
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            changed = reload_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                reload_rx.borrow_and_update();
                match ScriptLibrary::load(&library_path) {
                    Ok(library) => store = library.into_store(),
                    // keep serving the old store when the new file is bad
                    Err(e) => error!("Reload failed, keeping previous containers: {}", e),
                }
                reload_and_fire(&mut registry, &mut queue, &store);
            }
            _ = ticker.tick() => {
                let now = Local::now().time();
                if let Some(event) = registry.event_mut("System Time") {
                    let due = event
                        .kind_mut::<SystemTimeEvent>()
                        .map(|kind| kind.update(now))
                        .unwrap_or(false);
                    if due {
                        event.fire(&mut queue);
                    }
                }
            }
        }
    }

    print_stats(&registry);
    Ok(())
}
