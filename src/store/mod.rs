//! Flat-file store ports.
//!
//! # Data Flow
//! ```text
//! Request handler
//!     → store type (invites.rs, issues.rs, …)
//!     → json_file.rs (read full file / atomic replace)
//!     → JSON file under storage.data_dir
//! ```
//!
//! # Design Decisions
//! - Every read loads the whole file; no cross-request cache
//! - Missing or malformed files degrade to the empty value, never error
//! - Writes are transactional: temp file + rename
//! - Stores own their policy (matching, ordering); handlers stay thin

pub mod invites;
pub mod issues;
pub mod json_file;

pub use invites::InviteStore;
pub use issues::{ContentIssue, IssueStatus, IssueStore};
