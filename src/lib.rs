//! Hybrid 24-hour power-load forecast service.
//!
//! Serves a recursive forecast that fuses a gradient-boosted tree model and a
//! recurrent sequence model through a meta-learner, feeding each fused
//! prediction back into the working window for the next step.

pub mod alerts;
pub mod api;
pub mod config;
pub mod domain;
pub mod features;
pub mod forecast;
pub mod history;
pub mod models;
pub mod state;
pub mod telemetry;
