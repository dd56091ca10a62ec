//! Presenca - attendance query and aggregation engine
//!
//! This library reads meeting attendance registrations from a document
//! store (Firestore or a JSON snapshot), normalizes them into a fixed
//! meeting time zone and renders console reports and CSV/JSON exports.

pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod config;
pub mod csv_output;
pub mod document;
pub mod export;
pub mod json_output;
pub mod normalize;
pub mod query;
pub mod record;
pub mod report;
pub mod store;
