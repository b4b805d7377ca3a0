pub mod discussion;
pub mod platform;
pub mod tracker;
pub mod user;
