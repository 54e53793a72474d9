//! Aggregation engine for school records: incidents, permissions, risk
//! factors, special-education (NEE) evaluations and dropouts, scoped to
//! what each staff member is allowed to see.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod directory;
pub mod export;
pub mod features;
pub mod filter;
pub mod frequency;
pub mod models;
pub mod record;
pub mod report;
pub mod scope;
pub mod status;
pub mod store;
