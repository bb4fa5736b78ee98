//! Shortener - a small URL shortener service
//!
//! # Architecture
//! - `storage`: the `UrlStore` contract, its memory / line-log / SQL backends and the `Repository` facade
//! - `api`: HTTP handlers, owner-token middleware and error mapping
//! - `config`: TOML + environment configuration
//! - `runtime`: server startup
//! - `system`: logging and shutdown signals

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod storage;
pub mod system;
