pub mod analytics;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

pub fn build_state(config: config::Config) -> state::AppState {
    state::AppState::new(config)
}
