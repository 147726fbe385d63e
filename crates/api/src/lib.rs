//! HTTP API: health probe and operational trigger endpoints.

pub mod app;
