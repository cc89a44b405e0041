pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod indexer;
pub mod models;
pub mod service;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::create_router;
pub use cache::{fingerprint, Cache, PageSetRegistry};
pub use service::ServiceError;
pub use state::{AppState, Dependencies};
