use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use charla::app::App;
use charla::bridge::HostBridge;
use charla::config::Config;
use charla::dictation::DictationEngine;
use charla::tui::{self, AppEvent, EventHandler};
use charla::{handler, ui};

/// Log to a file so the terminal surface stays clean. The guard must live
/// for the program's lifetime.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("charla");
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::never(log_dir, "charla.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logging()?;
    let config = Config::load().unwrap_or_else(|_| Config::new());

    // The bridge carries only these channels; everything else is rejected
    // at the boundary.
    let (bridge, mut host_rx) = HostBridge::new(["dictation", "session"]);
    let bridge = Arc::new(bridge);

    // Host side: drain outbound envelopes (session announcements etc.).
    tokio::spawn(async move {
        while let Some(envelope) = host_rx.recv().await {
            tracing::debug!(
                channel = %envelope.channel,
                args = envelope.args.len(),
                "host envelope"
            );
        }
    });

    // Probe the dictation capability once; absence degrades the voice
    // control, it is never an error.
    let dictation = DictationEngine::from_config(config.dictation_command.as_deref()).map(Arc::new);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    // Dictation transcripts arrive over the bridge and re-enter the UI
    // event loop.
    let tx = events.sender();
    bridge.on("dictation", move |args| {
        let text = args
            .first()
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let _ = tx.send(AppEvent::Dictation(text));
    })?;

    let mut app = App::new(&config, bridge.clone(), dictation);

    let result = run(&mut terminal, &mut events, &mut app).await;

    bridge.remove_all_listeners("dictation");
    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }

        app.poll().await;
    }
    Ok(())
}
