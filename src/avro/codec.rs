//! Avro encode/decode of framed records against a compiled schema.

use super::json::{avro_to_json, collect_named, json_to_avro, NamedSchemas};
use crate::wire::{encode_wire_format, peek_schema_id, MAGIC_BYTE_OFFSET, PAYLOAD_OFFSET};
use crate::{AvroError, AvroResult};
use apache_avro::{from_avro_datum, to_avro_datum, Schema};
use serde_json::Value as JsonValue;

/// An immutable, executable Avro schema
///
/// Holds the parsed schema together with its named types so references can be
/// followed when mapping JSON values. Cloning is cheap relative to a registry
/// round-trip, but catalogs hand out references rather than clones.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    schema: Schema,
    names: NamedSchemas,
}

impl CompiledSchema {
    /// Wrap an already parsed schema
    pub fn new(schema: Schema) -> Self {
        let mut names = NamedSchemas::new();
        collect_named(&schema, &mut names);
        Self { schema, names }
    }

    /// Parse and compile schema JSON text
    pub fn parse(text: &str) -> Result<Self, apache_avro::Error> {
        Ok(Self::new(Schema::parse_str(text)?))
    }

    /// The underlying Avro schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Canonical JSON form of the schema
    pub fn canonical_form(&self) -> String {
        self.schema.canonical_form()
    }

    /// Serialize a JSON value into raw Avro binary (no framing)
    pub(crate) fn write(&self, value: &JsonValue) -> Result<Vec<u8>, String> {
        let avro = json_to_avro(value, &self.schema, &self.names)?;
        to_avro_datum(&self.schema, avro).map_err(|e| e.to_string())
    }

    /// Deserialize raw Avro binary, requiring every byte to be consumed
    pub(crate) fn read(&self, payload: &[u8]) -> Result<JsonValue, String> {
        let mut remaining = payload;
        let avro = from_avro_datum(&self.schema, &mut remaining, None).map_err(|e| e.to_string())?;
        if !remaining.is_empty() {
            return Err(format!(
                "{} trailing bytes left after reading the datum",
                remaining.len()
            ));
        }
        avro_to_json(&avro, &self.schema, &self.names)
    }
}

impl From<Schema> for CompiledSchema {
    fn from(schema: Schema) -> Self {
        Self::new(schema)
    }
}

/// Whether a value counts as "no data"
///
/// Only `null` and empty objects/arrays are empty. Scalars, including `0`,
/// `false` and `""`, are data.
pub fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Object(entries) => entries.is_empty(),
        JsonValue::Array(elements) => elements.is_empty(),
        _ => false,
    }
}

/// Encode `value` with `schema` and frame it with `schema_id`
///
/// Fails with a validation error for empty values, with an encode error when
/// the value does not fit the schema.
pub fn encode_avro(
    schema: &CompiledSchema,
    schema_id: i32,
    value: &JsonValue,
    magic_byte: u8,
) -> AvroResult<Vec<u8>> {
    if is_empty_value(value) {
        return Err(AvroError::validation("Data cannot be empty"));
    }

    let payload = schema
        .write(value)
        .map_err(|message| AvroError::Encode { schema_id, message })?;

    encode_wire_format(&payload, schema_id, magic_byte)
}

/// Check the envelope of `data` and decode its payload with `schema`
///
/// The magic byte is checked before the schema id, and both before any Avro
/// decoding is attempted.
pub fn decode_avro(
    schema: &CompiledSchema,
    schema_id: i32,
    data: &[u8],
    magic_byte: u8,
) -> AvroResult<JsonValue> {
    if data.is_empty() {
        return Err(AvroError::validation("Data cannot be empty"));
    }

    let found = data[MAGIC_BYTE_OFFSET];
    if found != magic_byte {
        return Err(AvroError::MagicByte {
            expected: magic_byte,
            found,
        });
    }

    let embedded_id = peek_schema_id(data).ok_or_else(|| {
        AvroError::validation(format!(
            "Data is too short to carry a schema id: {} bytes",
            data.len()
        ))
    })?;
    if embedded_id != schema_id {
        return Err(AvroError::SchemaIdMismatch {
            expected: schema_id,
            found: embedded_id,
        });
    }

    schema
        .read(&data[PAYLOAD_OFFSET..])
        .map_err(|message| AvroError::Decode { schema_id, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::DEFAULT_MAGIC_BYTE;
    use serde_json::json;

    fn pet_schema() -> CompiledSchema {
        CompiledSchema::parse(
            r#"{"type": "record", "name": "Pet", "fields": [
                {"name": "kind", "type": {"type": "enum", "name": "Kind", "symbols": ["CAT", "DOG"]}},
                {"name": "name", "type": "string"}
            ]}"#,
        )
        .unwrap()
    }

    fn kiara() -> JsonValue {
        json!({"kind": "DOG", "name": "Kiara"})
    }

    #[test]
    fn test_encode_valid_data() {
        let encoded = encode_avro(&pet_schema(), 3, &kiara(), 0x0).unwrap();

        // 5 header bytes + enum index (1) + string length (1) + "Kiara" (5)
        assert_eq!(encoded.len(), 12);
        assert_eq!(encoded[0], 0x0);
        assert_eq!(peek_schema_id(&encoded), Some(3));
    }

    #[test]
    fn test_roundtrip() {
        let schema = pet_schema();
        for magic in [DEFAULT_MAGIC_BYTE, 0x7] {
            let encoded = encode_avro(&schema, 3, &kiara(), magic).unwrap();
            let decoded = decode_avro(&schema, 3, &encoded, magic).unwrap();
            assert_eq!(decoded, kiara());
        }
    }

    #[test]
    fn test_logical_types_roundtrip() {
        let schema = CompiledSchema::parse(
            r#"{"type": "record", "name": "Payment", "fields": [
                {"name": "at", "type": {"type": "long", "logicalType": "local-timestamp-millis"}},
                {"name": "amount", "type": {"type": "bytes", "logicalType": "decimal", "precision": 9, "scale": 2}},
                {"name": "window", "type": {"type": "fixed", "name": "Window", "size": 12, "logicalType": "duration"}}
            ]}"#,
        )
        .unwrap();
        let payment = json!({
            "at": 1_700_000_000_000i64,
            "amount": "MDk=",
            "window": "AQAAAAIAAAADAAAA"
        });

        let encoded = encode_avro(&schema, 1, &payment, 0).unwrap();
        assert_eq!(decode_avro(&schema, 1, &encoded, 0).unwrap(), payment);
    }

    #[test]
    fn test_decode_decimal_bytes() {
        let schema = CompiledSchema::parse(
            r#"{"type": "bytes", "logicalType": "decimal", "precision": 4, "scale": 0}"#,
        )
        .unwrap();

        // Length 1 (zigzag 0x02), then the single byte 0x01
        let framed = [0, 0, 0, 0, 1, 0x02, 0x01];
        assert_eq!(decode_avro(&schema, 1, &framed, 0).unwrap(), json!("AQ=="));
    }

    #[test]
    fn test_empty_values_rejected() {
        let schema = pet_schema();
        for empty in [json!({}), json!(null), json!([])] {
            let err = encode_avro(&schema, 3, &empty, 0).unwrap_err();
            assert!(err.is_validation(), "{:?} should be rejected", empty);
        }
    }

    #[test]
    fn test_scalars_are_not_empty() {
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!("")));
        assert!(!is_empty_value(&json!(false)));

        let schema = CompiledSchema::parse(r#""int""#).unwrap();
        let encoded = encode_avro(&schema, 9, &json!(0), 0).unwrap();
        assert_eq!(decode_avro(&schema, 9, &encoded, 0).unwrap(), json!(0));
    }

    #[test]
    fn test_encode_mismatched_data() {
        let err = encode_avro(&pet_schema(), 3, &json!({"age": 1, "nickname": "Doggo"}), 0)
            .unwrap_err();
        assert!(err.is_schema_mismatch());
        assert!(matches!(err, AvroError::Encode { schema_id: 3, .. }));
    }

    #[test]
    fn test_decode_empty_data() {
        let err = decode_avro(&pet_schema(), 3, &[], 0).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_decode_wrong_magic_byte() {
        let schema = pet_schema();
        let encoded = encode_avro(&schema, 3, &kiara(), 0x0).unwrap();

        let err = decode_avro(&schema, 3, &encoded, 0x1).unwrap_err();
        assert!(matches!(
            err,
            AvroError::MagicByte {
                expected: 0x1,
                found: 0x0
            }
        ));
    }

    #[test]
    fn test_decode_wrong_schema_id() {
        let schema = pet_schema();
        let encoded = encode_avro(&schema, 3, &kiara(), 0).unwrap();

        let err = decode_avro(&schema, 4, &encoded, 0).unwrap_err();
        assert!(matches!(
            err,
            AvroError::SchemaIdMismatch {
                expected: 4,
                found: 3
            }
        ));
    }

    #[test]
    fn test_decode_with_longer_schema() {
        let encoded = encode_avro(&pet_schema(), 3, &kiara(), 0).unwrap();
        let longer = CompiledSchema::parse(
            r#"{"type": "record", "name": "Pet", "fields": [
                {"name": "age", "type": "int"},
                {"name": "alive", "type": "boolean"},
                {"name": "nickname", "type": "string"}
            ]}"#,
        )
        .unwrap();

        let err = decode_avro(&longer, 3, &encoded, 0).unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn test_decode_with_shorter_schema() {
        let encoded = encode_avro(&pet_schema(), 3, &kiara(), 0).unwrap();
        let shorter = CompiledSchema::parse(
            r#"{"type": "record", "name": "Pet", "fields": [{"name": "age", "type": "int"}]}"#,
        )
        .unwrap();

        let err = decode_avro(&shorter, 3, &encoded, 0).unwrap_err();
        assert!(matches!(err, AvroError::Decode { schema_id: 3, .. }));
    }

    #[test]
    fn test_decode_with_different_field_types() {
        let encoded = encode_avro(&pet_schema(), 3, &kiara(), 0).unwrap();
        let different = CompiledSchema::parse(
            r#"{"type": "record", "name": "Pet", "fields": [
                {"name": "kind", "type": "boolean"},
                {"name": "name", "type": "long"}
            ]}"#,
        )
        .unwrap();

        assert!(decode_avro(&different, 3, &encoded, 0).is_err());
    }

    #[test]
    fn test_decode_truncated_header() {
        let err = decode_avro(&pet_schema(), 3, &[0, 0, 0], 0).unwrap_err();
        assert!(err.is_validation());
    }
}
