//! Core types shared by the SaverFox AI service crates.
//!
//! This crate provides the error-handling foundation and the identifiers
//! that tie an adventure operation to its observability trace.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, TraceId};
