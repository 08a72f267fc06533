//! Schema resolution against multi-schema catalogs

mod common;

use common::{AGE_SCHEMA, MY_NAME_SCHEMA, NAME_SCHEMA, STRING_SCHEMA};
use kafka_avro_core::{
    decode_chunk, encode_chunk, encode_wire_format, AvroError, Catalog, CompiledSchema,
    SchemaRecord, SchemaRole, DEFAULT_MAGIC_BYTE,
};
use serde_json::json;

fn catalog(role: SchemaRole, schemas: &[(i32, &str)]) -> Catalog {
    let mut catalog = Catalog::new("pets", role);
    for (version, (schema_id, text)) in schemas.iter().enumerate() {
        catalog.insert(SchemaRecord {
            schema_id: *schema_id,
            version: version as u32 + 1,
            subject: role.subject("pets"),
            schema: CompiledSchema::parse(text).unwrap(),
        });
    }
    catalog
}

fn pets() -> Catalog {
    catalog(SchemaRole::Value, &[(261, AGE_SCHEMA), (263, NAME_SCHEMA)])
}

#[test]
fn test_value_matches_newest_schema() {
    let catalog = pets();

    let bytes = encode_chunk(&catalog, Some(&json!({"name": "Kiara"})), DEFAULT_MAGIC_BYTE).unwrap();
    assert_eq!(&bytes[..5], &[0, 0, 0, 1, 7]);

    let decoded = decode_chunk(&catalog, &bytes, DEFAULT_MAGIC_BYTE).unwrap();
    assert_eq!(decoded.schema_id, 263);
    assert_eq!(decoded.value, json!({"name": "Kiara"}));
}

#[test]
fn test_value_falls_back_to_older_schema() {
    let catalog = pets();

    let bytes = encode_chunk(&catalog, Some(&json!({"age": 1})), DEFAULT_MAGIC_BYTE).unwrap();
    assert_eq!(&bytes[..5], &[0, 0, 0, 1, 5]);

    let decoded = decode_chunk(&catalog, &bytes, DEFAULT_MAGIC_BYTE).unwrap();
    assert_eq!(decoded.schema_id, 261);
    assert_eq!(decoded.value, json!({"age": 1}));
}

#[test]
fn test_value_rejected_by_every_schema() {
    let catalog = pets();

    let err = encode_chunk(&catalog, Some(&json!({"myName": "Kiara"})), DEFAULT_MAGIC_BYTE)
        .unwrap_err();

    // The oldest candidate is tried last
    assert!(matches!(err, AvroError::Encode { schema_id: 261, .. }));
}

#[test]
fn test_empty_catalog() {
    let catalog = catalog(SchemaRole::Key, &[]);

    let err = encode_chunk(&catalog, Some(&json!("id-1")), DEFAULT_MAGIC_BYTE).unwrap_err();
    assert!(err.is_no_schema());

    let err = decode_chunk(&catalog, &[0, 0, 0, 0, 3, 2, 0x61], DEFAULT_MAGIC_BYTE).unwrap_err();
    assert!(err.is_no_schema());
}

#[test]
fn test_empty_values_encode_to_nothing() {
    let catalog = pets();

    for value in [None, Some(json!(null)), Some(json!({})), Some(json!([]))] {
        let bytes = encode_chunk(&catalog, value.as_ref(), DEFAULT_MAGIC_BYTE).unwrap();
        assert!(bytes.is_empty(), "{:?}", value);
    }
}

#[test]
fn test_scalar_keys() {
    let keys = catalog(SchemaRole::Key, &[(3, STRING_SCHEMA)]);

    let bytes = encode_chunk(&keys, Some(&json!("")), DEFAULT_MAGIC_BYTE).unwrap();
    assert_eq!(bytes, vec![0, 0, 0, 0, 3, 0]);

    let decoded = decode_chunk(&keys, &bytes, DEFAULT_MAGIC_BYTE).unwrap();
    assert_eq!(decoded.value, json!(""));
    assert_eq!(decoded.schema_id, 3);
}

#[test]
fn test_decode_unknown_schema_id() {
    let catalog = catalog(SchemaRole::Value, &[(262, MY_NAME_SCHEMA)]);
    let bytes = encode_wire_format(&[0x0a, b'K', b'i', b'a', b'r', b'a'], 263, DEFAULT_MAGIC_BYTE)
        .unwrap();

    let err = decode_chunk(&catalog, &bytes, DEFAULT_MAGIC_BYTE).unwrap_err();
    assert!(matches!(
        err,
        AvroError::SchemaIdMismatch {
            expected: 262,
            found: 263
        }
    ));
    assert!(err.is_envelope_mismatch());
}

#[test]
fn test_decode_wrong_magic_byte() {
    let catalog = pets();
    let bytes = encode_chunk(&catalog, Some(&json!({"name": "Kiara"})), 0x01).unwrap();
    assert_eq!(bytes[0], 0x01);

    let err = decode_chunk(&catalog, &bytes, DEFAULT_MAGIC_BYTE).unwrap_err();
    assert!(matches!(
        err,
        AvroError::MagicByte {
            expected: 0x00,
            found: 0x01
        }
    ));

    // Same bytes decode once the marker matches
    let decoded = decode_chunk(&catalog, &bytes, 0x01).unwrap();
    assert_eq!(decoded.schema_id, 263);
}

#[test]
fn test_unframed_data_is_rejected() {
    let catalog = pets();

    let err = decode_chunk(&catalog, br#"{"name":"Kiara"}"#, DEFAULT_MAGIC_BYTE).unwrap_err();
    assert!(matches!(err, AvroError::MagicByte { found: b'{', .. }));
}
