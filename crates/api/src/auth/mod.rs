//! Account credentials: password hashing and password-reset codes.

pub mod password;
pub mod verification;
