//! Emporium Admin library.
//!
//! This crate provides the back-office API as a library, so the handlers
//! can be tested and the CLI can reuse the database helpers.
//!
//! # Security
//!
//! Every `/api` route requires a staff bearer token and checks a
//! per-route permission. Deploy behind a private network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
