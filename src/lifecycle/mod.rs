//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Initialize subsystems → Start listener
//!
//! Shutdown (shutdown.rs):
//!     SIGINT or explicit trigger → Stop accepting → Drain → Exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
