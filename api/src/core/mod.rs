pub mod app_config;
pub mod app_state;
pub mod http;
pub mod qa_flow;
pub mod session;
