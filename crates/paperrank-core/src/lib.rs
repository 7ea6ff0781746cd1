//! Core types, ranking logic, and the storage trait for paperrank.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// Native `async fn` in traits; the store trait spells out its `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod engine;
pub mod error;
pub mod paper;
pub mod rank;
pub mod rating;
pub mod score;
pub mod store;
pub mod user;

pub use error::{Error, Result};
