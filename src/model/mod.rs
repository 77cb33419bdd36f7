//! Data types, split by where they live:
//!
//! - [`api`]: request and response bodies exchanged with clients.
//! - [`common`]: domain types shared by both sides, plus the pure election logic.
//! - [`db`]: documents as they are stored in MongoDB.
//! - [`mongodb`]: collection plumbing and ID handling.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
