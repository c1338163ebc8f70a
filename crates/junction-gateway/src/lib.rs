//! Junction: a declarative HTTP routing and transformation gateway.
//!
//! Incoming requests are matched against an externally authored rule set,
//! authenticated, and either answered with a configured mock response or
//! forwarded to an upstream target with a field-remapped body. One trace
//! record is emitted per request.

// ===== Core engine modules =====
pub mod auth;
pub mod condition;
pub mod engine;
pub mod error;
pub mod fieldpath;
pub mod matcher;
pub mod proxy;
pub mod rules;
pub mod trace;
pub mod transform;

// ===== Process surfaces =====
pub mod admin;
pub mod config;
