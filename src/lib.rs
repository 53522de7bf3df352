pub mod api;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod hub;
pub mod migration;
pub mod services;
pub mod text;

pub use api::{AppState, build_app};
pub use error::{ServiceError, ServiceResult};
