// Library root for the events platform backend

pub mod api;
pub mod auth;
pub mod config;
pub mod core;
pub mod engine;
pub mod store;
