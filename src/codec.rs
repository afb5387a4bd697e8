//! Value codecs
//!
//! Every adapter holds one [`ValueCodec`] chosen at construction time and
//! routes all reads and writes through it:
//!
//! - [`RawCodec`]: strings are stored verbatim, other values as their JSON
//!   text; reads always come back as `Value::String`
//! - [`JsonCodec`]: lossless JSON text, `decode(encode(v)) == v`

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::CollectionResult;

/// Transcodes values to and from the text form kept in the store
pub trait ValueCodec: Send + Sync + fmt::Debug {
    /// Encode a value for storage
    fn encode(&self, value: &Value) -> String;

    /// Decode a stored value
    fn decode(&self, text: &str) -> CollectionResult<Value>;

    /// Whether values are transcoded as JSON
    fn is_json(&self) -> bool;

    /// Decode a null-able reply
    fn decode_optional(&self, text: Option<String>) -> CollectionResult<Option<Value>> {
        text.map(|t| self.decode(&t)).transpose()
    }

    /// Decode every element, preserving order and length
    fn decode_each(&self, texts: Vec<String>) -> CollectionResult<Vec<Value>> {
        texts.iter().map(|t| self.decode(t)).collect()
    }

    /// Decode positional replies that may contain missing entries
    fn decode_each_optional(&self, texts: Vec<Option<String>>) -> CollectionResult<Vec<Option<Value>>> {
        texts.into_iter().map(|t| self.decode_optional(t)).collect()
    }

    /// Decode only the values of a field mapping
    fn decode_mapping_values(
        &self,
        mapping: HashMap<String, String>,
    ) -> CollectionResult<HashMap<String, Value>> {
        mapping
            .into_iter()
            .map(|(field, text)| Ok((field, self.decode(&text)?)))
            .collect()
    }

    /// Encode only the values of a field mapping
    fn encode_mapping_values(&self, mapping: &HashMap<String, Value>) -> HashMap<String, String> {
        mapping
            .iter()
            .map(|(field, value)| (field.clone(), self.encode(value)))
            .collect()
    }
}

/// Stores strings as-is; reads come back as strings
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl ValueCodec for RawCodec {
    fn encode(&self, value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn decode(&self, text: &str) -> CollectionResult<Value> {
        Ok(Value::String(text.to_string()))
    }

    fn is_json(&self) -> bool {
        false
    }
}

/// Stores values as JSON text
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn encode(&self, value: &Value) -> String {
        value.to_string()
    }

    fn decode(&self, text: &str) -> CollectionResult<Value> {
        Ok(serde_json::from_str(text)?)
    }

    fn is_json(&self) -> bool {
        true
    }
}

/// Pick the codec for a serialization flag
pub fn codec_for(use_json: bool) -> Arc<dyn ValueCodec> {
    if use_json {
        Arc::new(JsonCodec)
    } else {
        Arc::new(RawCodec)
    }
}
