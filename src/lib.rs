//! Library exports for the dashboard API
//!
//! This module exposes internal components for the binary and the integration tests.

pub mod aggregate;
pub mod config;
pub mod country;
pub mod database;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
