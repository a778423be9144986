//! Shared domain types for the Leukoscan platform.
//!
//! Everything here is plain data: ids, timestamps, role names, error
//! variants, and the detection record produced by the inference service.
//! No I/O lives in this crate.

pub mod detection;
pub mod error;
pub mod roles;
pub mod session;
pub mod types;
