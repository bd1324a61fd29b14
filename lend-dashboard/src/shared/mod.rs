//! Shared modules for the lending dashboard

pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod hotkeys;
pub mod metrics;
pub mod sort;
pub mod table;
pub mod types;
pub mod view;
pub mod websocket;
