//! JSON Schema generation for advertised output documents.

use schemars::JsonSchema;
use serde_json::Value;

/// Draft-07 schema for `T` with subschemas inlined, so clients that do not
/// resolve `$ref` still see the whole shape.
pub fn schema_for<T: JsonSchema>() -> Value {
    let settings = schemars::generate::SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
    });
    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    serde_json::to_value(schema).unwrap_or_default()
}
