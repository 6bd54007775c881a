pub mod app;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod form;
pub mod models;
pub mod tasks;
pub mod ui;
