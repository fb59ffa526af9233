pub mod auth;
pub mod body;
pub mod hook;
pub mod parse_error;
pub mod testcase;
