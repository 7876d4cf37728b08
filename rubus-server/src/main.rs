use std::sync::Arc;

use rubus_auth::{Authenticator, TokenPresenceAuthenticator};
use rubus_pool::MediaPool;
use rubus_server::catalog::FsCatalog;
use rubus_server::{serve, AppState, Config};
use tokio::net::TcpListener;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_file(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "config.toml".to_owned()),
    )?;

    env_logger::Builder::new()
        .parse_filters(&config.log_filter)
        .parse_env("RUBUS_LOG")
        .init();

    let catalog = FsCatalog::load(&config.media_root)?;
    let pool = Arc::new(MediaPool::new(Arc::new(catalog)));
    let authenticator: Arc<dyn Authenticator> = Arc::new(TokenPresenceAuthenticator);
    let state = Arc::new(AppState::new(pool, authenticator, config.max_fetch_pieces));

    let listen_address = config.listen_address();
    let listener = TcpListener::bind(&listen_address).await?;
    log::info!("listening on {listen_address}");

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    serve(listener, state, shutdown_rx).await
}
