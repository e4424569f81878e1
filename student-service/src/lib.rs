pub mod config;
pub mod dtos;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application};
