pub mod app_state;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;
pub mod startup;
pub mod template;
pub mod utils;

pub use app_state::AppState;
pub use config::{Config, RelayConfig, SigningMode};
pub use error::RelayError;
pub use router::build_router;
