//! Host for the students client core.
//!
//! # Overview
//! Executes the core's `HttpRequest`s with reqwest on a single-threaded tokio
//! runtime and drives the list and form screens. List fetches run as tasks
//! that can be aborted; every list request carries a deadline.

pub mod api;
pub mod config;
pub mod error;
pub mod render;
pub mod screens;
pub mod session;
pub mod transport;

pub use api::StudentsApi;
pub use config::{AppConfig, ConfigArgs};
pub use error::{AppError, AppResult};
pub use session::Session;
