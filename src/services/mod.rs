pub mod audit_sink;
pub mod link_service;
pub mod worker;
