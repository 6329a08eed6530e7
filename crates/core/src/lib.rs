//! Shared domain types and pure logic for the WriteTalent backend.
//!
//! Nothing in this crate performs I/O; HTTP clients, persistence and the
//! generation pipeline build on top of it.

pub mod error;
pub mod originality;
pub mod storyboard;
pub mod themes;
pub mod types;
pub mod verification;
