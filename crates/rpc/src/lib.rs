//! HTTP delivery layer for the EduTrack prediction service.
//!
//! Translates engine and bulk-runner outcomes into responses: single-record
//! JSON prediction, CSV upload with downloadable results, and the ambient
//! health/version/metrics endpoints.

pub mod server;


pub use server::{build_router, start_server, AppState};
