//! Scrumkit Core Library
//!
//! Domain models and services for agile planning (projects, team, epics,
//! stories, sprints) and the discovery canvases.

pub mod auth;
pub mod canvas;
pub mod collections;
pub mod common;
pub mod config;
pub mod context;
pub mod epic;
pub mod error;
pub mod project;
pub mod saga;
pub mod seed;
pub mod sprint;
pub mod story;
pub mod team;

pub use common::{ListOptions, Priority};
pub use config::{BackendConfig, ConfigSource};
pub use error::{CoreError, CoreResult};
