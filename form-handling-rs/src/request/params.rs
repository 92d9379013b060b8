//! Field sources of an inbound request

use crate::FieldMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An inbound request as seen by the validator: three independent field
/// sources
pub trait RequestFields {
    /// Query-string parameters
    fn query(&self) -> &FieldMap;

    /// Parsed body parameters
    fn body(&self) -> &FieldMap;

    /// Uploaded file metadata
    fn files(&self) -> &FieldMap;

    /// Union of all sources; on a key collision the query wins over the body,
    /// and the body over files
    fn all_fields(&self) -> FieldMap {
        let mut data = self.query().clone();
        for source in [self.body(), self.files()] {
            for (key, value) in source {
                if !data.contains_key(key) {
                    data.insert(key.clone(), value.clone());
                }
            }
        }
        data
    }
}

/// Owned request field sources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    #[serde(default)]
    pub query: FieldMap,
    #[serde(default)]
    pub body: FieldMap,
    #[serde(default)]
    pub files: FieldMap,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    pub fn with_file<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.files.insert(key.into(), value.into());
        self
    }
}

impl RequestFields for RequestParams {
    fn query(&self) -> &FieldMap {
        &self.query
    }

    fn body(&self) -> &FieldMap {
        &self.body
    }

    fn files(&self) -> &FieldMap {
        &self.files
    }
}
