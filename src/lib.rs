// src/lib.rs
pub mod app;
pub mod config;
