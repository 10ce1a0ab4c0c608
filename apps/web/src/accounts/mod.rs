//! Accounts: registration, login/logout, cookie sessions and flash messages.

pub mod handlers;
pub mod password;
pub mod registration;
pub mod session;
