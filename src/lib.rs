//! Masarat Al Nur - client core for an Arabic Islamic-learning app
//!
//! Learners browse categories, topics and lessons, sign in with email or
//! Google, and build up experience points and a daily streak. This crate
//! holds everything below the UI: domain records, ports to the identity
//! provider and document store, their Firebase and in-memory adapters,
//! stream-based repositories and the view models that turn them into screen
//! states.

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod presentation;
pub mod telemetry;

pub use app::{AppContainer, ContainerError};
