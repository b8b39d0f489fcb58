//! Chess rules on an immutable 8x8 board, plus a client for UCI engines.

pub mod config;
pub mod display;
pub mod domain;
pub mod error;
pub mod models;
