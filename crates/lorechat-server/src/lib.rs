pub mod auth;
pub mod config;
pub mod routes;

use std::sync::Arc;

use lorechat_db::Database;
use lorechat_gateway::{Dispatcher, Services};

pub use config::ServerConfig;
pub use routes::{ServerState, app};

impl ServerState {
    /// Wire the chat core to a database that serves as both character
    /// store and channel directory.
    pub fn new(db: Database, config: &ServerConfig) -> Self {
        let db = Arc::new(db);
        Self {
            dispatcher: Dispatcher::new(config.gateway.clone()),
            services: Services::new(db.clone(), db),
            jwt_secret: config.jwt_secret.clone(),
        }
    }
}
