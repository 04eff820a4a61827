//! Core types and trait definitions for Tally.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the domain records, the [`store::FinanceStore`] abstraction, the error
//! taxonomy shared by every layer, and the pure 50/30/20 budget computations.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod budget;
pub mod category;
pub mod coaching;
pub mod error;
pub mod forecast;
pub mod goal;
pub mod period;
pub mod recurring;
pub mod settings;
pub mod store;
pub mod transaction;
pub mod validate;
pub mod voice;

pub use error::{Error, Result};
