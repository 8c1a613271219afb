//! Application layer - use cases and orchestration.
//!
//! Services here coordinate the provider registry and the domain ports;
//! HTTP handlers call these services and never touch adapters directly.

pub mod services;

pub use services::{IndexingService, SearchService};
