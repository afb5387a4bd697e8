//! Raw replies from the store
//!
//! Mirrors the RESP value kinds. Adapters never match on variants directly;
//! they use the typed accessors, which fail with
//! [`ClientError::UnexpectedReply`] when the shape is wrong and surface error
//! replies as [`ClientError::Response`].

use std::collections::HashMap;

use crate::error::{ClientError, ClientResult};

/// Reply value returned for one command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Null bulk / null array
    Nil,
    /// `+OK`
    Okay,
    /// Any other simple string
    Status(String),
    /// Error reply (only seen inside EXEC results)
    Error(String),
    /// Integer reply
    Integer(i64),
    /// Bulk string
    Bulk(String),
    /// Array reply
    Array(Vec<Reply>),
}

impl Reply {
    /// Short name of the reply kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Nil => "nil",
            Reply::Okay => "ok",
            Reply::Status(_) => "status",
            Reply::Error(_) => "error",
            Reply::Integer(_) => "integer",
            Reply::Bulk(_) => "bulk string",
            Reply::Array(_) => "array",
        }
    }

    fn unexpected<T>(self, expected: &'static str) -> ClientResult<T> {
        match self {
            Reply::Error(msg) => Err(ClientError::Response(msg)),
            other => Err(ClientError::UnexpectedReply {
                expected,
                got: other.kind(),
            }),
        }
    }

    /// Integer reply
    pub fn into_integer(self) -> ClientResult<i64> {
        match self {
            Reply::Integer(i) => Ok(i),
            other => other.unexpected("integer"),
        }
    }

    /// Non-negative count reply
    pub fn into_count(self) -> ClientResult<u64> {
        let value = self.into_integer()?;
        u64::try_from(value).map_err(|_| ClientError::Protocol(format!("negative count: {}", value)))
    }

    /// 0/1 integer reply as a strict boolean
    pub fn into_bool(self) -> ClientResult<bool> {
        Ok(self.into_integer()? != 0)
    }

    /// `+OK` or any status reply
    pub fn into_unit(self) -> ClientResult<()> {
        match self {
            Reply::Okay | Reply::Status(_) => Ok(()),
            other => other.unexpected("status"),
        }
    }

    /// Bulk string or nil
    pub fn into_optional_string(self) -> ClientResult<Option<String>> {
        match self {
            Reply::Bulk(s) => Ok(Some(s)),
            Reply::Nil => Ok(None),
            other => other.unexpected("bulk string"),
        }
    }

    /// Array of bulk strings; nil reads as empty
    pub fn into_strings(self) -> ClientResult<Vec<String>> {
        match self {
            Reply::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Reply::Bulk(s) => Ok(s),
                    other => other.unexpected("bulk string"),
                })
                .collect(),
            Reply::Nil => Ok(Vec::new()),
            other => other.unexpected("array"),
        }
    }

    /// Array of bulk strings with nil holes
    pub fn into_optional_strings(self) -> ClientResult<Vec<Option<String>>> {
        match self {
            Reply::Array(items) => items.into_iter().map(Reply::into_optional_string).collect(),
            other => other.unexpected("array"),
        }
    }

    /// Flat `[field, value, field, value, ...]` array as a map
    pub fn into_map(self) -> ClientResult<HashMap<String, String>> {
        let flat = self.into_strings()?;
        if flat.len() % 2 != 0 {
            return Err(ClientError::Protocol(format!(
                "odd number of elements in field/value reply: {}",
                flat.len()
            )));
        }
        let mut map = HashMap::with_capacity(flat.len() / 2);
        let mut iter = flat.into_iter();
        while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
            map.insert(field, value);
        }
        Ok(map)
    }

    /// Turn an error reply into an error, pass anything else through
    pub fn into_result(self) -> ClientResult<Reply> {
        match self {
            Reply::Error(msg) => Err(ClientError::Response(msg)),
            other => Ok(other),
        }
    }
}

impl TryFrom<redis::Value> for Reply {
    type Error = ClientError;

    fn try_from(value: redis::Value) -> ClientResult<Self> {
        match value {
            redis::Value::Nil => Ok(Reply::Nil),
            redis::Value::Okay => Ok(Reply::Okay),
            redis::Value::Status(s) => Ok(Reply::Status(s)),
            redis::Value::Int(i) => Ok(Reply::Integer(i)),
            redis::Value::Data(bytes) => String::from_utf8(bytes)
                .map(Reply::Bulk)
                .map_err(|e| ClientError::Protocol(format!("Invalid encoding: {}", e))),
            redis::Value::Bulk(items) => items
                .into_iter()
                .map(Reply::try_from)
                .collect::<ClientResult<Vec<_>>>()
                .map(Reply::Array),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_bool_is_strict() {
        assert!(Reply::Integer(1).into_bool().unwrap());
        assert!(!Reply::Integer(0).into_bool().unwrap());
    }

    #[test]
    fn test_error_reply_surfaces_as_response() {
        let result = Reply::Error("ERR index out of range".to_string()).into_unit();
        match result {
            Err(ClientError::Response(msg)) => assert_eq!(msg, "ERR index out of range"),
            other => panic!("Expected response error, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_reply_kind() {
        let result = Reply::Bulk("x".to_string()).into_integer();
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedReply { expected: "integer", got: "bulk string" })
        ));
    }

    #[test]
    fn test_into_map() {
        let reply = Reply::Array(vec![
            Reply::Bulk("a".to_string()),
            Reply::Bulk("1".to_string()),
            Reply::Bulk("b".to_string()),
            Reply::Bulk("2".to_string()),
        ]);
        let map = reply.into_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_into_map_rejects_odd_length() {
        let reply = Reply::Array(vec![Reply::Bulk("a".to_string())]);
        assert!(matches!(reply.into_map(), Err(ClientError::Protocol(_))));
    }

    #[test]
    fn test_optional_strings_keep_holes() {
        let reply = Reply::Array(vec![Reply::Bulk("x".to_string()), Reply::Nil]);
        assert_eq!(
            reply.into_optional_strings().unwrap(),
            vec![Some("x".to_string()), None]
        );
    }

    #[test]
    fn test_from_redis_value() {
        let value = redis::Value::Bulk(vec![
            redis::Value::Data(b"foo".to_vec()),
            redis::Value::Nil,
            redis::Value::Int(3),
        ]);
        let reply = Reply::try_from(value).unwrap();
        assert_eq!(
            reply,
            Reply::Array(vec![Reply::Bulk("foo".to_string()), Reply::Nil, Reply::Integer(3)])
        );
    }
}
