//! Application startup and the HTTP server loop

pub mod server;

pub use server::{build_repository, run_server};
