//! Habits and the store that owns them.
//!
//! A habit is completed at most once per calendar day. Completing it adds one to its streak,
//! undoing keeps the streak, and completing it again on the same day does nothing.
//! [store::HabitStore] applies these rules and saves the list after every change.

pub mod entities;
pub mod store;
