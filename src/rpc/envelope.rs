use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::RpcError;

/// `{"method": "<name>", "data": [<arg0>, <arg1>, ...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEnvelope {
    pub method: String,
    pub data: Vec<Value>,
}

impl CallEnvelope {
    pub fn new(method: impl Into<String>, data: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            data,
        }
    }

    pub fn decode(body: &[u8]) -> Result<Self, RpcError> {
        serde_json::from_slice(body).map_err(|err| RpcError::malformed(err.to_string()))
    }

    pub fn encode(&self) -> Vec<u8> {
        // A String and a Vec<Value> always serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::CallEnvelope;
    use crate::errors::RpcError;
    use serde_json::json;

    #[test]
    fn encode_then_decode_preserves_method_and_data() {
        let envelope = CallEnvelope::new(
            "currentTime2",
            vec![
                json!(true),
                json!(null),
                json!(-1.5),
                json!("ünïcödé"),
                json!({"nested": [1, {"deep": false}]}),
            ],
        );

        let decoded = CallEnvelope::decode(&envelope.encode()).expect("round trip");
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn wire_shape_matches_protocol() {
        let encoded = CallEnvelope::new("currentTime", vec![]).encode();
        assert_eq!(encoded, br#"{"method":"currentTime","data":[]}"#);
    }

    #[test]
    fn rejects_invalid_json() {
        let err = CallEnvelope::decode(b"{").expect_err("invalid json");
        assert!(matches!(err, RpcError::MalformedEnvelope { .. }));
    }

    #[test]
    fn rejects_missing_fields_and_non_array_data() {
        for body in [
            r#"{"data":[]}"#,
            r#"{"method":"currentTime"}"#,
            r#"{"method":"currentTime","data":true}"#,
            r#"{"method":7,"data":[]}"#,
            r#"[]"#,
        ] {
            let err = CallEnvelope::decode(body.as_bytes()).expect_err(body);
            assert!(matches!(err, RpcError::MalformedEnvelope { .. }), "{body}");
        }
    }
}
