pub mod app_state;
pub mod directives;
pub mod server_config;
pub mod streaming;
