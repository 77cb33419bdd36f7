//! DB-compatible (e.g. de/serialisable) types.
//!
//! IDs and datetimes are serialised in MongoDB's own format. Each stored type
//! comes as a `*Core` with the data, a `New*` alias for inserting, and a full
//! type carrying the `_id` that MongoDB assigned.

pub mod admin;
pub mod candidate;
pub mod closed_position;
pub mod vote;
pub mod voter;
