use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    services::{assistant_service::TextGenerator, credentials::TokenIssuer},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenIssuer>,
    /// `None` when no generator API key is configured.
    pub assistant: Option<Arc<dyn TextGenerator>>,
}

impl AppState {
    /// Builds the shared state once at startup; the token issuer is derived from `config`.
    pub fn new(
        orm: DatabaseConnection,
        config: AppConfig,
        assistant: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let tokens = Arc::new(TokenIssuer::from_config(&config));
        Self {
            orm: Arc::new(orm),
            config: Arc::new(config),
            tokens,
            assistant,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.orm
    }
}

/// Statements recorded by a mock connection. The state must hold the only handle to it.
#[cfg(test)]
pub(crate) fn transaction_log(state: AppState) -> Vec<sea_orm::Transaction> {
    match Arc::try_unwrap(state.orm) {
        Ok(conn) => conn.into_transaction_log(),
        Err(_) => panic!("connection is still shared"),
    }
}
