pub mod auth;
pub mod body;
pub mod error_handling;
