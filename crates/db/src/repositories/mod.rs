//! Query functions, one module per table group. Every function runs on the
//! connection it is given, so callers decide the transaction.

pub mod booking;
pub mod catalog;
pub mod history;
pub mod quota;
pub mod schedule;
