pub mod api;
pub mod attendance;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod state;

pub use error::{AppError, ErrorKind};
