pub mod booking;
pub mod catalog;
pub mod history;
pub mod identity;
pub mod quota;
pub mod schedule;
