pub mod align;
pub mod handlers;
pub mod ingestion;
pub mod logging;
pub mod metrics;
pub mod models;
