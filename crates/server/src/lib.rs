//! reviewlens-server: HTTP server for reviewlens.
//!
//! Exposes the review store and sentiment ranking over a REST API.
//! Core review logic lives in `reviewlens-core`.

/// REST API layer: Axum router, HTTP handlers, models, metrics.
pub mod api;
