use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigUpdateRequest {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub count: Option<usize>,
}

/// List endpoints answer either with a bare array or a `{ results }` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Plain(Vec<T>),
    Envelope(ListResponse<T>),
}

impl<T> ListBody<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListBody::Plain(items) => items,
            ListBody::Envelope(envelope) => envelope.results,
        }
    }
}
