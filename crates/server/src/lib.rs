pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use state::AppState;
