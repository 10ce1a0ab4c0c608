//! Employer-side review of the applications a job received.

pub mod handlers;
pub mod review;
