//! # vigia-core
//!
//! Core types, traits, configuration, and error handling for the Vigía agent.

pub mod config;
pub mod error;
pub mod message;
pub mod traits;
pub mod types;
