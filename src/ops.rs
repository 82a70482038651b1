//! Operations modules for interacting with the external tools `prq` drives.
//!
//! - [`git`]: branch inspection, creation, pushing and the fetch/reset/cherry-pick fallback
//! - [`github`]: PR lookup, creation and viewing via the GitHub CLI
//!
//! Each submodule provides a trait-based abstraction with a real implementation
//! and, under test, a mock.

pub mod git;
pub mod github;
