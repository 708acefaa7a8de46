// src/lib.rs

//! pagewatch library
//!
//! Fetches monitored pages, reduces them to a stable fingerprint and
//! reports when that fingerprint moves.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
