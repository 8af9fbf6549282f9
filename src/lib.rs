pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;

use {
    services::{link_service::LinkService, worker::JobQueue},
    std::sync::Arc,
};

#[derive(Clone)]
pub struct AppState {
    pub links: Arc<LinkService>,
    pub jobs: JobQueue,
}
