//! Records exchanged with the Kafka transport.
//!
//! [`ProducerRecord`] carries application data towards Kafka, [`KafkaMessage`]
//! is what the transport hands back, and [`AvroMessage`] is a received record
//! with its key and value decoded.

mod avro_message;
mod producer_record;

pub use avro_message::{AvroMessage, KafkaMessage};
pub use producer_record::{Payload, ProducerRecord, DEFAULT_PARTITION};
