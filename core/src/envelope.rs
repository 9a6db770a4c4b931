//! Decoding of the OpenCGA response envelope.
//!
//! Every endpoint answers with
//! `{"error": "...", "response": [{"errorMsg": "...", "result": [...]}]}`.
//! A call is only successful when the envelope carries no error, holds exactly
//! one response, and that response carries no error message. The HTTP status
//! code plays no part in the decision.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OpencgaError, Result};

/// Top-level wire object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub error: String,
    #[serde(rename = "response")]
    pub responses: Vec<Response>,
}

/// Per-call result container. `results` stays untyped until an entity mapper
/// asks for a concrete shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Response {
    pub id: String,
    pub db_time: i64,
    pub num_results: i64,
    pub num_total_results: i64,
    pub warning_msg: String,
    pub error_msg: String,
    pub result_type: String,
    #[serde(rename = "result")]
    pub results: Vec<Value>,
}

impl Envelope {
    /// Parse a raw body. `path` is only used for error context.
    pub fn parse(path: &str, body: &str) -> Result<Self> {
        // Explicit nulls are common in OpenCGA output; treat them as absent.
        // Result records are left as sent until they are decoded.
        let mut raw = strip_nulls(serde_json::from_str(body).map_err(|e| {
            OpencgaError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            }
        })?);
        if let Some(Value::Array(responses)) = raw.get_mut("response") {
            for response in responses.iter_mut() {
                *response = strip_nulls(std::mem::take(response));
            }
        }
        serde_json::from_value(raw).map_err(|e| OpencgaError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the envelope and return its single response.
    pub fn into_single_response(self, path: &str) -> Result<Response> {
        if !self.error.is_empty() {
            return Err(OpencgaError::Api {
                path: path.to_string(),
                message: self.error,
            });
        }
        if self.responses.len() != 1 {
            return Err(OpencgaError::Api {
                path: path.to_string(),
                message: format!("expecting 1 response, got {}", self.responses.len()),
            });
        }
        let mut responses = self.responses;
        let response = responses.remove(0);
        if !response.error_msg.is_empty() {
            return Err(OpencgaError::Api {
                path: path.to_string(),
                message: response.error_msg,
            });
        }
        Ok(response)
    }
}

impl Response {
    /// Decode every result record as `T`.
    pub fn decode_all<T: DeserializeOwned>(&self, entity: &str) -> Result<Vec<T>> {
        self.results
            .iter()
            .map(|item| decode_record(entity, item))
            .collect()
    }

    /// Decode the first result record, as echoed back by create calls.
    pub fn decode_first<T: DeserializeOwned>(&self, path: &str, entity: &str) -> Result<T> {
        let item = self.results.first().ok_or_else(|| OpencgaError::NotFound {
            path: path.to_string(),
            entity: entity.to_string(),
        })?;
        decode_record(entity, item)
    }

    /// Decode the one and only result record. Zero results is `NotFound`,
    /// more than one is `Ambiguous`.
    pub fn decode_single<T: DeserializeOwned>(&self, path: &str, entity: &str) -> Result<T> {
        match self.results.len() {
            0 => Err(OpencgaError::NotFound {
                path: path.to_string(),
                entity: entity.to_string(),
            }),
            1 => decode_record(entity, &self.results[0]),
            count => Err(OpencgaError::Ambiguous {
                path: path.to_string(),
                entity: entity.to_string(),
                count,
            }),
        }
    }
}

/// Structural decode of one untyped record. Unknown fields are ignored and
/// missing ones fall back to defaults; a present field of the wrong type is a
/// `Shape` error.
pub fn decode_record<T: DeserializeOwned>(entity: &str, item: &Value) -> Result<T> {
    serde_json::from_value(strip_nulls(item.clone())).map_err(|e| OpencgaError::Shape {
        entity: entity.to_string(),
        message: e.to_string(),
    })
}

/// Drop null members of an object and of its nested objects. Arrays are
/// kept verbatim: they hold caller-defined data such as variable
/// definitions, where an explicit null is meaningful.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        other => other,
    }
}
