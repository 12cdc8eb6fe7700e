pub mod auth;
pub mod config;
pub mod food;
pub mod member;
pub mod reconcile;
pub mod status;
pub mod watch;
