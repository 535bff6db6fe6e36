//! # vigia-agent
//!
//! Processing agent integration for Vigía.

pub mod http;

pub use http::HttpAgent;
