//! Application loop: launches the tray and reacts to clicks.

use serde_json::Value;
use systray::{BundledBinary, ClickEvent, MenuItem, Tray, TrayConfig};
use tokio::sync::mpsc;

use crate::config::Config;

/// What the host does in response to a click.
#[derive(Debug, PartialEq)]
enum Response {
    Quit,
    /// Send the item back with its checkmark flipped.
    Toggle(MenuItem),
    Ignore,
}

fn respond(click: &ClickEvent) -> Response {
    let item = &click.item;
    if item.extra.get("action").and_then(Value::as_str) == Some("quit") {
        return Response::Quit;
    }
    match item.checked {
        Some(checked) if item.is_enabled() && !item.is_separator() => {
            Response::Toggle(item.clone().with_checked(!checked))
        }
        _ => Response::Ignore,
    }
}

/// Runs the tray until it is quit from its menu, interrupted, or the helper
/// exits on its own.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let tray = Tray::new(TrayConfig::new(config.menu.clone()).with_debug(config.debug));

    let (click_tx, mut click_rx) = mpsc::unbounded_channel();
    tray.on_click(move |click| {
        let _ = click_tx.send(click.clone());
    });
    tray.on_data(|line| tracing::info!(line, "tray output"));
    tray.on_error(|err| tracing::warn!("tray error: {err}"));

    match &config.binary {
        Some(path) => tray.launch(path.as_path()).await?,
        None => tray.launch(&BundledBinary::new(&config.binary_dir)).await?,
    }
    tray.ready().await?;
    tracing::info!("tray ready");

    loop {
        tokio::select! {
            click = click_rx.recv() => {
                let Some(click) = click else { break };
                tracing::debug!(id = click.identifier, title = %click.item.title, "menu item clicked");
                match respond(&click) {
                    Response::Quit => {
                        tracing::info!("quit requested via tray");
                        break;
                    }
                    Response::Toggle(item) => tray.update_item(item, Some(click.seq_id)).await?,
                    Response::Ignore => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
            status = tray.wait_exit() => {
                let status = status?;
                tracing::info!(%status, "tray process exited on its own");
                return Ok(());
            }
        }
    }

    tray.kill().await?;
    let status = tray.wait_exit().await?;
    tracing::info!(%status, "tray stopped");
    Ok(())
}
