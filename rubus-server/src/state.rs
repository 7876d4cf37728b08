use std::sync::Arc;

use rubus_auth::Authenticator;
use rubus_pool::MediaPool;

/// Shared, explicitly-constructed state handed to every connection task
/// (§9 "Global state: none required; the media pool, authenticator, and
/// decoder are constructed and passed explicitly").
pub struct AppState {
    pub pool: Arc<MediaPool>,
    pub authenticator: Arc<dyn Authenticator>,
    pub max_fetch_pieces: u32,
}

impl AppState {
    pub fn new(
        pool: Arc<MediaPool>,
        authenticator: Arc<dyn Authenticator>,
        max_fetch_pieces: u32,
    ) -> Self {
        Self {
            pool,
            authenticator,
            max_fetch_pieces,
        }
    }
}
