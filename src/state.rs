use crate::config::Config;
use crate::middleware::LoginThrottle;
use crate::store::Store;
use std::sync::Arc;

pub struct AppState {
    pub store: Store,
    pub config: Config,
    pub login_throttle: LoginThrottle,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        AppState {
            store,
            config,
            // 5 attempts per minute per account
            login_throttle: LoginThrottle::new(5, 60),
        }
    }
}

pub type SharedState = Arc<AppState>;
