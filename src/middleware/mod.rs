// Middleware module - CORS, logging and metrics

pub mod cors;
pub mod metrics;
pub mod request_logger;

pub use cors::relay_cors_middleware;
pub use metrics::metrics_middleware;
pub use request_logger::request_logger_middleware;
