//! # cpp2il-core
//!
//! Core crate for the Cpp2IL importer. Contains the host settings schema
//! (game installation, package tree, logging), configuration loading,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other importer crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
