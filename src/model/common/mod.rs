pub mod position;
pub mod schedule;
pub mod secret;
pub mod tally;
