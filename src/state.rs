// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::dialogflow::IntentClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub intents: Arc<dyn IntentClient>,
}

impl AppState {
    pub fn new(config: Config, intents: Arc<dyn IntentClient>) -> Self {
        Self { config, intents }
    }
}
