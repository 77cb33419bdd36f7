//! API-friendly types: what clients send and what they get back.
//!
//! IDs are rendered as hex strings and datetimes as RFC 3339.

pub mod admin;
pub mod auth;
pub mod ballot;
pub mod candidate;
pub mod position;
pub mod results;
pub mod voter;
