//! Chunk resolution: pick the catalog schema that encodes or decodes a chunk.
//!
//! Candidates are tried from the highest schema id down. Schema mismatches
//! against one candidate only mean "try the next one"; once every candidate has
//! failed, the last failure is returned.

use crate::avro::{decode_avro, encode_avro, is_empty_value};
use crate::catalog::Catalog;
use crate::wire::peek_schema_id;
use crate::AvroResult;
use serde_json::Value as JsonValue;
use tracing::trace;

/// A decoded key or value chunk and the schema that decoded it
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChunk {
    pub value: JsonValue,
    pub schema_id: i32,
}

/// Encode `value` with the newest catalog schema that accepts it
///
/// An absent or empty value yields zero bytes without looking at the catalog.
pub fn encode_chunk(
    catalog: &Catalog,
    value: Option<&JsonValue>,
    magic_byte: u8,
) -> AvroResult<Vec<u8>> {
    let value = match value {
        Some(value) if !is_empty_value(value) => value,
        _ => return Ok(Vec::new()),
    };

    if catalog.is_empty() {
        return Err(catalog.no_schema());
    }

    let mut last_error = None;
    for record in catalog.records() {
        match encode_avro(&record.schema, record.schema_id, value, magic_byte) {
            Ok(bytes) => {
                trace!(topic = catalog.topic(), role = %catalog.role(), schema_id = record.schema_id, "chunk encoded");
                return Ok(bytes);
            }
            Err(e) => {
                trace!(schema_id = record.schema_id, error = %e, "candidate rejected value");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| catalog.no_schema()))
}

/// Decode a framed chunk with whichever catalog schema accepts it
///
/// The schema named by the embedded id is tried first. If it is missing or
/// fails, every candidate is tried in order so the reported failure is the same
/// as for a plain scan.
pub fn decode_chunk(catalog: &Catalog, data: &[u8], magic_byte: u8) -> AvroResult<DecodedChunk> {
    if catalog.is_empty() {
        return Err(catalog.no_schema());
    }

    if let Some(record) = peek_schema_id(data).and_then(|id| catalog.get(id)) {
        if let Ok(value) = decode_avro(&record.schema, record.schema_id, data, magic_byte) {
            return Ok(DecodedChunk {
                value,
                schema_id: record.schema_id,
            });
        }
    }

    let mut last_error = None;
    for record in catalog.records() {
        match decode_avro(&record.schema, record.schema_id, data, magic_byte) {
            Ok(value) => {
                return Ok(DecodedChunk {
                    value,
                    schema_id: record.schema_id,
                })
            }
            Err(e) => {
                trace!(schema_id = record.schema_id, error = %e, "candidate rejected chunk");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| catalog.no_schema()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avro::CompiledSchema;
    use crate::catalog::SchemaRecord;
    use crate::schema::SchemaRole;
    use crate::AvroError;
    use serde_json::json;

    fn record(schema_id: i32, schema: &str) -> SchemaRecord {
        SchemaRecord {
            schema_id,
            version: schema_id as u32,
            subject: "orders-value".to_string(),
            schema: CompiledSchema::parse(schema).unwrap(),
        }
    }

    fn catalog(records: Vec<SchemaRecord>) -> Catalog {
        let mut catalog = Catalog::new("orders", SchemaRole::Value);
        for r in records {
            catalog.insert(r);
        }
        catalog
    }

    const NAME: &str = r#"{"type":"record","name":"Pet","fields":[{"name":"name","type":"string"}]}"#;
    const NAME_OPT_AGE: &str = r#"{"type":"record","name":"Pet","fields":[
        {"name":"name","type":"string"},
        {"name":"age","type":["null","int"],"default":null}
    ]}"#;
    const AGE: &str = r#"{"type":"record","name":"Pet","fields":[{"name":"age","type":"int"}]}"#;

    #[test]
    fn test_encode_prefers_highest_id() {
        let catalog = catalog(vec![record(1, NAME), record(2, NAME_OPT_AGE)]);

        let bytes = encode_chunk(&catalog, Some(&json!({"name": "Kiara"})), 0).unwrap();
        assert_eq!(peek_schema_id(&bytes), Some(2));
    }

    #[test]
    fn test_encode_falls_through_to_matching_schema() {
        let catalog = catalog(vec![record(1, NAME), record(2, AGE)]);

        let bytes = encode_chunk(&catalog, Some(&json!({"name": "Kiara"})), 0).unwrap();
        assert_eq!(peek_schema_id(&bytes), Some(1));
    }

    #[test]
    fn test_encode_absent_value_skips_catalog() {
        let empty = Catalog::new("orders", SchemaRole::Key);
        assert!(encode_chunk(&empty, None, 0).unwrap().is_empty());
        assert!(encode_chunk(&empty, Some(&json!({})), 0).unwrap().is_empty());
        assert!(encode_chunk(&empty, Some(&json!(null)), 0).unwrap().is_empty());
    }

    #[test]
    fn test_encode_empty_catalog() {
        let empty = Catalog::new("orders", SchemaRole::Value);
        let err = encode_chunk(&empty, Some(&json!({"name": "Kiara"})), 0).unwrap_err();
        assert!(err.is_no_schema());
    }

    #[test]
    fn test_encode_reports_last_failure() {
        let catalog = catalog(vec![record(1, NAME), record(2, AGE)]);

        let err = encode_chunk(&catalog, Some(&json!({"colour": "brown"})), 0).unwrap_err();
        assert!(matches!(err, AvroError::Encode { schema_id: 1, .. }));
    }

    #[test]
    fn test_decode_uses_embedded_id() {
        let catalog = catalog(vec![record(1, NAME), record(2, NAME_OPT_AGE)]);
        let bytes = encode_avro(&catalog.get(1).unwrap().schema, 1, &json!({"name": "Kiara"}), 0)
            .unwrap();

        let decoded = decode_chunk(&catalog, &bytes, 0).unwrap();
        assert_eq!(decoded.schema_id, 1);
        assert_eq!(decoded.value, json!({"name": "Kiara"}));
    }

    #[test]
    fn test_decode_unknown_id_reports_last_failure() {
        let catalog = catalog(vec![record(1, NAME), record(2, AGE)]);
        let foreign = CompiledSchema::parse(NAME).unwrap();
        let bytes = encode_avro(&foreign, 99, &json!({"name": "Kiara"}), 0).unwrap();

        let err = decode_chunk(&catalog, &bytes, 0).unwrap_err();
        assert!(matches!(
            err,
            AvroError::SchemaIdMismatch {
                expected: 1,
                found: 99
            }
        ));
    }

    #[test]
    fn test_decode_wrong_magic_byte() {
        let catalog = catalog(vec![record(1, NAME)]);
        let bytes = encode_chunk(&catalog, Some(&json!({"name": "Kiara"})), 0).unwrap();

        let err = decode_chunk(&catalog, &bytes, 1).unwrap_err();
        assert!(matches!(err, AvroError::MagicByte { .. }));
    }

    #[test]
    fn test_decode_empty_catalog() {
        let empty = Catalog::new("orders", SchemaRole::Value);
        assert!(decode_chunk(&empty, &[0, 0, 0, 0, 1, 2], 0)
            .unwrap_err()
            .is_no_schema());
        assert!(decode_chunk(&empty, &[], 0).unwrap_err().is_no_schema());
    }
}
