//! Small terminal habit tracker. Add habits, tick them off once a day, and keep an eye on the
//! streaks. Everything is stored locally in a single JSON value.
//!

pub mod cli;
pub mod habits;
pub mod storage;
pub mod utils;
