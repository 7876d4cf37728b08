pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod state;

pub use config::Config;
pub use dispatch::handle_connection;
pub use state::AppState;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;

/// Accepts connections on `listener` and spawns [`handle_connection`] for
/// each one, until `shutdown` fires (§4.4 "graceful shutdown").
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, addr) = accepted?;
                let state = state.clone();
                tokio::spawn(async move {
                    handle_connection(stream, state, addr.to_string()).await;
                });
            }
            _ = shutdown.changed() => {
                log::info!("shutdown signal received, no longer accepting connections");
                return Ok(());
            }
        }
    }
}
