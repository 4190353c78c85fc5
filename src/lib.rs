// Intelix - A personal-assistant task runner

pub mod abilities;
pub mod brain;     // Keyword intent router
pub mod browser;   // Headless browser sessions
pub mod config;
pub mod db;
pub mod extract;   // Price, salary and text helpers
pub mod llm;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod runner;
pub mod scrapers;
pub mod search;    // SerpAPI Google Shopping
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use runner::TaskRunner;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
