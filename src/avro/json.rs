//! Schema-directed mapping between JSON values and Avro values.
//!
//! Union values are wrapped: a non-null union value appears in JSON as a
//! single-key object naming the branch, e.g. `{"string": "Kiara"}`, and `null`
//! stays `null`. Bytes and fixed values travel as base64 strings, and so do the
//! `decimal` (two's-complement big-endian) and `duration` (12 bytes) logical
//! types. Other logical types use the JSON form of their underlying type.

use apache_avro::schema::{Name, Schema, UnionSchema};
use apache_avro::types::Value;
use apache_avro::{Decimal, Duration};
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::HashMap;

/// Named types of a schema, keyed by full name, used to follow `Ref`s
pub(crate) type NamedSchemas = HashMap<String, Schema>;

/// Collect every named type (record, enum, fixed) defined inside `schema`
pub(crate) fn collect_named(schema: &Schema, names: &mut NamedSchemas) {
    match schema {
        Schema::Record(record) => {
            names.insert(record.name.fullname(None), schema.clone());
            for field in &record.fields {
                collect_named(&field.schema, names);
            }
        }
        Schema::Enum(e) => {
            names.insert(e.name.fullname(None), schema.clone());
        }
        Schema::Fixed(f) => {
            names.insert(f.name.fullname(None), schema.clone());
        }
        Schema::Array(items) => collect_named(items, names),
        Schema::Map(values) => collect_named(values, names),
        Schema::Union(union) => {
            for variant in union.variants() {
                collect_named(variant, names);
            }
        }
        _ => {}
    }
}

fn lookup<'a>(name: &Name, names: &'a NamedSchemas) -> Result<&'a Schema, String> {
    let fullname = name.fullname(None);
    names
        .get(&fullname)
        .ok_or_else(|| format!("unresolved schema reference '{}'", fullname))
}

/// Name a union branch is tagged with
pub(crate) fn branch_name(schema: &Schema) -> String {
    match schema {
        Schema::Null => "null".to_string(),
        Schema::Boolean => "boolean".to_string(),
        Schema::Int => "int".to_string(),
        Schema::Long => "long".to_string(),
        Schema::Float => "float".to_string(),
        Schema::Double => "double".to_string(),
        Schema::Bytes => "bytes".to_string(),
        Schema::String => "string".to_string(),
        Schema::Array(_) => "array".to_string(),
        Schema::Map(_) => "map".to_string(),
        Schema::Record(record) => record.name.fullname(None),
        Schema::Enum(e) => e.name.fullname(None),
        Schema::Fixed(f) => f.name.fullname(None),
        Schema::Ref { name } => name.fullname(None),
        // Logical types are tagged with their underlying type
        other => underlying_type_name(other),
    }
}

fn underlying_type_name(schema: &Schema) -> String {
    match serde_json::from_str::<JsonValue>(&schema.canonical_form()) {
        Ok(JsonValue::String(name)) => name,
        Ok(JsonValue::Object(obj)) => match obj.get("type").and_then(JsonValue::as_str) {
            Some("fixed") | Some("record") | Some("enum") => obj
                .get("name")
                .and_then(JsonValue::as_str)
                .unwrap_or("fixed")
                .to_string(),
            Some(kind) => kind.to_string(),
            None => "unknown".to_string(),
        },
        _ => "unknown".to_string(),
    }
}

fn describe(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn mismatch(expected: &str, json: &JsonValue) -> String {
    format!("expected {}, found {}", expected, describe(json))
}

fn decode_base64(text: &str) -> Result<Vec<u8>, String> {
    base64::Engine::decode(&base64::engine::general_purpose::STANDARD, text)
        .map_err(|e| format!("invalid base64 bytes: {}", e))
}

fn encode_base64(bytes: &[u8]) -> JsonValue {
    JsonValue::String(base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        bytes,
    ))
}

fn as_int(json: &JsonValue) -> Result<i32, String> {
    json.as_i64()
        .ok_or_else(|| mismatch("int", json))
        .and_then(|n| i32::try_from(n).map_err(|_| format!("{} does not fit in an int", n)))
}

fn as_long(json: &JsonValue) -> Result<i64, String> {
    json.as_i64().ok_or_else(|| mismatch("long", json))
}

/// Convert a JSON value into the Avro value `schema` describes
pub(crate) fn json_to_avro(
    json: &JsonValue,
    schema: &Schema,
    names: &NamedSchemas,
) -> Result<Value, String> {
    match schema {
        Schema::Null => match json {
            JsonValue::Null => Ok(Value::Null),
            other => Err(mismatch("null", other)),
        },
        Schema::Boolean => json
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| mismatch("boolean", json)),
        Schema::Int => as_int(json).map(Value::Int),
        Schema::Long => as_long(json).map(Value::Long),
        Schema::Float => {
            let f = json.as_f64().ok_or_else(|| mismatch("float", json))?;
            let narrowed = f as f32;
            if !narrowed.is_finite() {
                return Err(format!("{} does not fit in a float", f));
            }
            Ok(Value::Float(narrowed))
        }
        Schema::Double => json
            .as_f64()
            .map(Value::Double)
            .ok_or_else(|| mismatch("double", json)),
        Schema::Bytes => json
            .as_str()
            .ok_or_else(|| mismatch("base64 string", json))
            .and_then(decode_base64)
            .map(Value::Bytes),
        Schema::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| mismatch("string", json)),
        Schema::Array(items) => match json {
            JsonValue::Array(elements) => elements
                .iter()
                .map(|element| json_to_avro(element, items, names))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Err(mismatch("array", other)),
        },
        Schema::Map(values) => match json {
            JsonValue::Object(entries) => entries
                .iter()
                .map(|(k, v)| json_to_avro(v, values, names).map(|v| (k.clone(), v)))
                .collect::<Result<HashMap<_, _>, _>>()
                .map(Value::Map),
            other => Err(mismatch("map", other)),
        },
        Schema::Union(union) => union_to_avro(json, union, names),
        Schema::Record(record) => {
            let entries = match json {
                JsonValue::Object(entries) => entries,
                other => return Err(mismatch(&record.name.fullname(None), other)),
            };

            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let value = match (entries.get(&field.name), &field.default) {
                    (Some(v), _) => json_to_avro(v, &field.schema, names),
                    (None, Some(default)) => default_to_avro(default, &field.schema, names),
                    (None, None) => Err(format!("missing required field '{}'", field.name)),
                }
                .map_err(|e| format!("field '{}': {}", field.name, e))?;
                fields.push((field.name.clone(), value));
            }
            Ok(Value::Record(fields))
        }
        Schema::Enum(e) => {
            let symbol = json.as_str().ok_or_else(|| mismatch("enum symbol", json))?;
            e.symbols
                .iter()
                .position(|s| s == symbol)
                .map(|idx| Value::Enum(idx as u32, symbol.to_string()))
                .ok_or_else(|| {
                    format!(
                        "'{}' is not a symbol of enum {}",
                        symbol,
                        e.name.fullname(None)
                    )
                })
        }
        Schema::Fixed(f) => {
            let bytes = json
                .as_str()
                .ok_or_else(|| mismatch("base64 string", json))
                .and_then(decode_base64)?;
            if bytes.len() != f.size {
                return Err(format!(
                    "fixed {} expects {} bytes, found {}",
                    f.name.fullname(None),
                    f.size,
                    bytes.len()
                ));
            }
            Ok(Value::Fixed(f.size, bytes))
        }
        Schema::Ref { name } => json_to_avro(json, lookup(name, names)?, names),
        Schema::Date => as_int(json).map(Value::Date),
        Schema::TimeMillis => as_int(json).map(Value::TimeMillis),
        Schema::TimeMicros => as_long(json).map(Value::TimeMicros),
        Schema::TimestampMillis => as_long(json).map(Value::TimestampMillis),
        Schema::TimestampMicros => as_long(json).map(Value::TimestampMicros),
        Schema::LocalTimestampMillis => as_long(json).map(Value::LocalTimestampMillis),
        Schema::LocalTimestampMicros => as_long(json).map(Value::LocalTimestampMicros),
        Schema::Decimal(decimal) => {
            let bytes = json
                .as_str()
                .ok_or_else(|| mismatch("base64 string", json))
                .and_then(decode_base64)?;
            if let Schema::Fixed(f) = decimal.inner.as_ref() {
                if bytes.len() > f.size {
                    return Err(format!(
                        "decimal {} holds at most {} bytes, found {}",
                        f.name.fullname(None),
                        f.size,
                        bytes.len()
                    ));
                }
            }
            Ok(Value::Decimal(Decimal::from(bytes)))
        }
        Schema::Duration => {
            let bytes = json
                .as_str()
                .ok_or_else(|| mismatch("base64 string", json))
                .and_then(decode_base64)?;
            let raw: [u8; 12] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| format!("duration expects 12 bytes, found {}", bytes.len()))?;
            Ok(Value::Duration(Duration::from(raw)))
        }
        other => Value::from(json.clone())
            .resolve(other)
            .map_err(|e| e.to_string()),
    }
}

/// Field defaults for unions are given unwrapped, for the first branch
fn default_to_avro(
    default: &JsonValue,
    schema: &Schema,
    names: &NamedSchemas,
) -> Result<Value, String> {
    match schema {
        Schema::Union(union) => {
            let first = union
                .variants()
                .first()
                .ok_or_else(|| "union has no branches".to_string())?;
            json_to_avro(default, first, names).map(|v| Value::Union(0, Box::new(v)))
        }
        other => json_to_avro(default, other, names),
    }
}

fn union_to_avro(
    json: &JsonValue,
    union: &UnionSchema,
    names: &NamedSchemas,
) -> Result<Value, String> {
    let variants = union.variants();

    if json.is_null() {
        return variants
            .iter()
            .position(|v| matches!(v, Schema::Null))
            .map(|idx| Value::Union(idx as u32, Box::new(Value::Null)))
            .ok_or_else(|| "null is not a branch of this union".to_string());
    }

    // Wrapped form: {"<branch>": value}
    if let JsonValue::Object(entries) = json {
        if entries.len() == 1 {
            if let Some((tag, inner)) = entries.iter().next() {
                if let Some(idx) = variants.iter().position(|v| &branch_name(v) == tag) {
                    return json_to_avro(inner, &variants[idx], names)
                        .map(|v| Value::Union(idx as u32, Box::new(v)));
                }
            }
        }
    }

    // Unwrapped input: first branch that accepts the value wins
    let mut last_error = format!("no union branch matches {}", describe(json));
    for (idx, variant) in variants.iter().enumerate() {
        if matches!(variant, Schema::Null) {
            continue;
        }
        match json_to_avro(json, variant, names) {
            Ok(v) => return Ok(Value::Union(idx as u32, Box::new(v))),
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

fn number_from_f64(f: f64) -> Result<JsonValue, String> {
    Number::from_f64(f)
        .map(JsonValue::Number)
        .ok_or_else(|| format!("{} cannot be represented in JSON", f))
}

/// Convert a decoded Avro value into JSON, wrapping union branches
pub(crate) fn avro_to_json(
    value: &Value,
    schema: &Schema,
    names: &NamedSchemas,
) -> Result<JsonValue, String> {
    if let Schema::Ref { name } = schema {
        return avro_to_json(value, lookup(name, names)?, names);
    }

    match (schema, value) {
        (Schema::Union(union), Value::Union(idx, inner)) => {
            let branch = union
                .variants()
                .get(*idx as usize)
                .ok_or_else(|| format!("union branch {} out of range", idx))?;
            if matches!(branch, Schema::Null) {
                return Ok(JsonValue::Null);
            }
            let mut wrapped = Map::new();
            wrapped.insert(branch_name(branch), avro_to_json(inner, branch, names)?);
            Ok(JsonValue::Object(wrapped))
        }
        (_, Value::Null) => Ok(JsonValue::Null),
        (_, Value::Boolean(b)) => Ok(JsonValue::Bool(*b)),
        (_, Value::Int(i)) | (_, Value::Date(i)) | (_, Value::TimeMillis(i)) => {
            Ok(JsonValue::from(*i))
        }
        (_, Value::Long(l))
        | (_, Value::TimeMicros(l))
        | (_, Value::TimestampMillis(l))
        | (_, Value::TimestampMicros(l))
        | (_, Value::LocalTimestampMillis(l))
        | (_, Value::LocalTimestampMicros(l)) => Ok(JsonValue::from(*l)),
        (_, Value::Float(f)) => number_from_f64(f64::from(*f)),
        (_, Value::Double(d)) => number_from_f64(*d),
        (_, Value::Bytes(bytes)) | (_, Value::Fixed(_, bytes)) => Ok(encode_base64(bytes)),
        (_, Value::Decimal(decimal)) => Vec::<u8>::try_from(decimal)
            .map(|bytes| encode_base64(&bytes))
            .map_err(|e| e.to_string()),
        (_, Value::Duration(duration)) => Ok(encode_base64(&<[u8; 12]>::from(*duration))),
        (_, Value::String(s)) | (_, Value::Enum(_, s)) => Ok(JsonValue::String(s.clone())),
        (_, Value::Uuid(uuid)) => Ok(JsonValue::String(uuid.to_string())),
        (Schema::Array(items), Value::Array(elements)) => elements
            .iter()
            .map(|element| avro_to_json(element, items, names))
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        (Schema::Map(values), Value::Map(entries)) => entries
            .iter()
            .map(|(k, v)| avro_to_json(v, values, names).map(|v| (k.clone(), v)))
            .collect::<Result<Map<_, _>, _>>()
            .map(JsonValue::Object),
        (Schema::Record(record), Value::Record(fields)) => {
            let mut object = Map::new();
            for (name, field_value) in fields {
                let field = record
                    .fields
                    .iter()
                    .find(|f| &f.name == name)
                    .ok_or_else(|| format!("unknown field '{}'", name))?;
                object.insert(name.clone(), avro_to_json(field_value, &field.schema, names)?);
            }
            Ok(JsonValue::Object(object))
        }
        // Anything else decodes as its plain JSON form
        (schema, other) => JsonValue::try_from(other.clone()).map_err(|e| {
            format!(
                "unsupported value {:?} for schema {}: {}",
                other,
                branch_name(schema),
                e
            )
        }),
    }
}
