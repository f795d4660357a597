//! Core types and trait definitions for the Rolo activity log.
//!
//! No HTTP, no database. All other crates depend on it.

pub mod account;
pub mod activity;
pub mod activity_type;
pub mod contact;
pub mod error;
pub mod journal;
pub mod query;
pub mod store;

pub use account::AccountId;
pub use error::{Error, Missing, Result};
