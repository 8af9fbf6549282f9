pub mod acleda_client;
pub mod api_errors;
pub mod http;
