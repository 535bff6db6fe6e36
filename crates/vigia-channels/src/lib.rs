//! # vigia-channels
//!
//! Messaging platform integration for Vigía.

pub mod telegram;
