//! Footprint service
//!
//! Serves job footprint classification, histograms and unit formatting to
//! the monitoring web frontend, alongside health and Prometheus endpoints.

pub mod api;
pub mod config;
