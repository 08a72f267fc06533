//! Error types for codec, registry and adapter operations.

use thiserror::Error;

/// Result type for all fallible operations in this crate
pub type AvroResult<T> = Result<T, AvroError>;

/// Error types for schema resolution and Avro encoding/decoding
///
/// The variants follow the order in which a record meets them: transport and
/// registry failures while loading schemas, validation before any work is done,
/// envelope integrity and schema compatibility while coding, and resolution
/// exhaustion when no candidate schema is left.
#[derive(Error, Debug)]
pub enum AvroError {
    /// HTTP or Kafka I/O failure reported by the external client, never retried
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The schema registry answered, but not with a usable schema
    ///
    /// Carries the request context and the raw response for diagnostics.
    #[error("Schema registry error for subject '{subject}' (version: {version}): {message} (HTTP {status} {method} {path})")]
    RegistryResponse {
        subject: String,
        version: String,
        role: String,
        message: String,
        status: u16,
        method: String,
        path: String,
        body: String,
    },

    /// The registry returned schema text that is not a valid Avro schema
    #[error("Failed to compile schema for subject '{subject}' (version: {version}): {message}")]
    SchemaCompile {
        subject: String,
        version: String,
        message: String,
    },

    /// Input rejected before any serialization or I/O was attempted
    #[error("Validation error: {0}")]
    Validation(String),

    /// First byte of the envelope is not the expected marker (unframed or foreign data)
    #[error("Data has incorrect magic byte or is unserialized: expected 0x{expected:02x}, found 0x{found:02x}")]
    MagicByte { expected: u8, found: u8 },

    /// Embedded schema id differs from the schema used to decode
    #[error("Data has incorrect schema id or is unserialized: expected {expected}, found {found}")]
    SchemaIdMismatch { expected: i32, found: i32 },

    /// Value does not conform to the schema it was encoded with
    #[error("Avro encode failed with schema {schema_id}: {message}")]
    Encode { schema_id: i32, message: String },

    /// Bytes could not be read with the supplied schema
    #[error("Avro decode failed with schema {schema_id}: {message}")]
    Decode { schema_id: i32, message: String },

    /// The catalog for this topic/role holds no schemas at all
    #[error("No schema available for topic '{topic}' ({role})")]
    NoSchema { topic: String, role: String },

    /// No schemas were loaded for the requested topic
    #[error("Schema not found to serialize data for topic '{0}'")]
    UnknownTopic(String),

    /// Configuration error - detected at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization error (fallback path, registry bodies)
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AvroError {
    /// Check if this error came from the HTTP or Kafka transport
    pub fn is_transport(&self) -> bool {
        matches!(self, AvroError::Transport { .. })
    }

    /// Check if this error is a malformed or failed registry response
    pub fn is_registry(&self) -> bool {
        matches!(
            self,
            AvroError::RegistryResponse { .. } | AvroError::SchemaCompile { .. }
        )
    }

    /// Check if this error is an input validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, AvroError::Validation(_))
    }

    /// Check if the wire envelope did not match expectations
    pub fn is_envelope_mismatch(&self) -> bool {
        matches!(
            self,
            AvroError::MagicByte { .. } | AvroError::SchemaIdMismatch { .. }
        )
    }

    /// Check if the schema and the data disagree structurally
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, AvroError::Encode { .. } | AvroError::Decode { .. })
    }

    /// Check if the catalog was empty
    pub fn is_no_schema(&self) -> bool {
        matches!(self, AvroError::NoSchema { .. })
    }

    /// Create a transport error from a message
    pub fn transport(message: impl Into<String>) -> Self {
        AvroError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error with source
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AvroError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        AvroError::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        AvroError::Configuration(message.into())
    }

    /// Short label used for metrics
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            AvroError::Transport { .. } => "transport",
            AvroError::RegistryResponse { .. } => "registry_response",
            AvroError::SchemaCompile { .. } => "schema_compile",
            AvroError::Validation(_) => "validation",
            AvroError::MagicByte { .. } => "magic_byte",
            AvroError::SchemaIdMismatch { .. } => "schema_id_mismatch",
            AvroError::Encode { .. } => "encode",
            AvroError::Decode { .. } => "decode",
            AvroError::NoSchema { .. } => "no_schema",
            AvroError::UnknownTopic(_) => "unknown_topic",
            AvroError::Configuration(_) => "configuration",
            AvroError::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for AvroError {
    fn from(err: serde_json::Error) -> Self {
        AvroError::Serialization(err.to_string())
    }
}
