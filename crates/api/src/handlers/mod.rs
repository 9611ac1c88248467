pub mod availability;
pub mod booking;
pub mod catalog;
pub mod history;
pub mod quota;
