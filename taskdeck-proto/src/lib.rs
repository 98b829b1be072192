//! Shared task model and JSON wire types for Taskdeck.
//!
//! The server crate persists [`task::Task`] documents and speaks the
//! request/response shapes in [`api`] and [`dashboard`].

pub mod api;
pub mod dashboard;
pub mod task;
pub mod user;
