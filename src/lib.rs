pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod entities;
pub mod error;
pub mod query;
pub mod server;
