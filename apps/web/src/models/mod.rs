pub mod application;
pub mod flash;
pub mod job;
pub mod user;
