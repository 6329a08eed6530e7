//! Request handlers, one submodule per resource.
//!
//! Handlers delegate to the repositories in `writetalent_db`, the job
//! dispatcher, or the storyteller, and map errors via [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

pub mod ai;
pub mod auth;
pub mod drama;
pub mod jobs;
pub mod portfolios;
pub mod users;
