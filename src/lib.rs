use std::sync::Arc;

use config::Config;
use history::History;
use store::Store;

pub mod calc;
pub mod config;
pub mod error;
pub mod history;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub history: History,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let history = History::new(store.clone(), config.history_page_size);
        Self {
            store,
            history,
            config,
        }
    }
}
