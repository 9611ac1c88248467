//! Operations of the booking subsystem. Each public function opens one
//! store transaction and commits it only when every check has passed.

pub mod availability;
pub mod booking;
pub mod catalog;
pub mod history;
pub mod quota;
