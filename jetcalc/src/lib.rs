// src/lib.rs
pub mod error;
pub mod config;
pub mod event;
pub mod features;
pub mod strategies;
pub mod driver;
