//! RabbitMQ publisher for payment events.
//!
//! Each event name gets a durable fanout exchange (`payment-created` is
//! published to `payment.created`) with a durable queue of the same name bound
//! to it, so the first consumer never misses messages published before it
//! attached.

use {
    crate::domain::error::PipelineError,
    crate::domain::event::{EventPublisher, PAYMENT_CREATED, PaymentCreatedEvent},
    lapin::{
        BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
        options::{
            BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
        },
        types::FieldTable,
    },
    std::{future::Future, pin::Pin},
};

/// AMQP delivery mode 2: message is written to disk by the broker.
const PERSISTENT: u8 = 2;

pub fn exchange_for(event_name: &str) -> String {
    event_name.replace('-', ".")
}

pub struct AmqpPublisher {
    // Held so the connection lives as long as the channel.
    _connection: Connection,
    channel: Channel,
}

impl AmqpPublisher {
    pub async fn connect(url: &str) -> Result<Self, PipelineError> {
        let connection = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        let exchange = exchange_for(PAYMENT_CREATED);
        channel
            .exchange_declare(
                &exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_declare(
                &exchange,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_bind(
                &exchange,
                &exchange,
                "",
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        tracing::info!(exchange = %exchange, "connected to AMQP");

        Ok(Self {
            _connection: connection,
            channel,
        })
    }

    async fn publish_inner(&self, event: &PaymentCreatedEvent) -> Result<(), PipelineError> {
        let body = serde_json::to_vec(event)?;
        let exchange = exchange_for(event.name());
        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(PERSISTENT)
            .with_timestamp(u64::try_from(event.timestamp.timestamp()).unwrap_or_default());

        self.channel
            .basic_publish(
                &exchange,
                "",
                BasicPublishOptions::default(),
                &body,
                properties,
            )
            .await?
            .await?;

        tracing::debug!(
            exchange = %exchange,
            transaction_id = %event.transaction_id,
            "event published"
        );
        Ok(())
    }
}

impl EventPublisher for AmqpPublisher {
    fn publish<'a>(
        &'a self,
        event: &'a PaymentCreatedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>> {
        Box::pin(self.publish_inner(event))
    }
}

/// Stand-in when no broker is configured: the event only reaches the logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

impl EventPublisher for LogPublisher {
    fn publish<'a>(
        &'a self,
        event: &'a PaymentCreatedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'a>> {
        Box::pin(async move {
            let payload = serde_json::to_string(event)?;
            tracing::info!(event = event.name(), %payload, "publishing event");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_uses_dots() {
        assert_eq!(exchange_for(PAYMENT_CREATED), "payment.created");
    }
}
