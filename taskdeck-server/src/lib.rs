//! Taskdeck server library.
//!
//! Exposes the task API server for use in tests and embedding. The server
//! keeps tasks in an in-memory store (optionally mirrored to a JSON file),
//! authorizes every mutation against the requester's role and assignments,
//! and serves role-scoped dashboards.

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod policy;
pub mod service;
pub mod store;
pub mod users;
