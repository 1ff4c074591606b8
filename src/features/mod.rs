pub mod auth;
pub mod generations;
