//! # vigia-memory
//!
//! SQLite-backed persistence for Vigía.

pub mod audit;
pub mod store;

pub use audit::ExecutionLogger;
pub use store::Store;
