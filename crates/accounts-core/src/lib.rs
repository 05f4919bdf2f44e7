//! Core accounts library (validation, session, HTTP client, workflows).

pub mod api;
pub mod config;
pub mod form;
pub mod profile;
pub mod route;
pub mod session;
pub mod task;
pub mod token;
pub mod validate;
pub mod workflows;
