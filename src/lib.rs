pub mod app;
pub mod auth;
pub mod baas;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod validation;
pub mod wizard;

pub use app::{build_router, AppState};
