pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod proxy;
pub mod server;
pub mod workers;
