//! Founder dashboard core: metrics store, reference tables, derived
//! metrics and the allowlist access gate.
//!
//! Rendering is someone else's job. This crate owns state and arithmetic;
//! a presentation layer reads `Dashboard::snapshot()` and issues
//! `DashCommand`s.

pub mod auth;
pub mod calculator;
pub mod command;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod event;
pub mod gate;
pub mod metrics;
pub mod reference_data;
pub mod types;
