pub mod amqp;
pub mod memory;
pub mod postgres;
