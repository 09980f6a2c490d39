//! nodewatch: Prometheus-backed host telemetry gateway and terminal dashboard
//!
//! The gateway (`server`) turns raw instant queries into per-instance CPU,
//! memory and disk snapshots; the dashboard (`app`) polls it and renders
//! rolling history.

pub mod app;
pub mod cli;
pub mod core;
pub mod screens;
pub mod server;
pub mod utils;
pub mod widgets;
