//! Invoice Server Library
//!
//! PDF invoice upload, AI-assisted field extraction and invoice record
//! management over a JSON REST API. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `pdf`: Text extraction and repackaging
//! - `normalize`: Language model prompt, client and reply parsing
//! - `pipeline`: Stored PDF to structured invoice, for one request
//! - `storage`: Blob storage for uploaded PDFs (local or S3)
//! - `db`: SQLite persistence for confirmed invoices
//! - `routes`: HTTP handlers

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod invoice;
pub mod normalize;
pub mod pdf;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod storage;

pub use app::build_router;
pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
