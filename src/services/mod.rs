pub mod analytics;
pub mod directory;
pub mod state_client;
