//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Serialize` response view where the row must not leak as-is
//! - `Deserialize` create DTOs for inserts

pub mod portfolio;
pub mod user;
