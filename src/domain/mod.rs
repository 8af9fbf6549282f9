pub mod audit;
pub mod clock;
pub mod error;
pub mod event;
pub mod gateway;
pub mod id;
pub mod job;
pub mod money;
pub mod payment;
pub mod payment_link;
pub mod store;
