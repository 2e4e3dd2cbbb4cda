pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod services;
pub mod state;
