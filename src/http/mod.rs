pub mod app_error;
pub mod health;
pub mod readings;
pub mod sensors;
pub mod server;
pub mod state;
