//! # Utilities Module
//!
//! ## Role
//! Cross-cutting helpers that don't belong in domain-specific modules.
//!
//! ## Sub-modules
//! - `threading`: Rayon thread pool configuration
//! - `progress`: Atomic progress counter for the streaming loop

pub mod progress;
pub mod threading;

pub use progress::Progress;
pub use threading::build_thread_pool;
