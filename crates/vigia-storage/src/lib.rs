//! # vigia-storage
//!
//! Cloud storage listing backend for Vigía (Google Drive REST API).

pub mod drive;

pub use drive::DriveBrowser;
