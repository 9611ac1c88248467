mod availability_test;
mod booking_test;
mod catalog_test;
mod health_test;
mod middleware_test;
mod test_utils;
