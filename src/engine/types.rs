//! Wire types for the process engine REST API.
//!
//! Every variable sent to the engine travels as a `{value, type}` pair. The
//! type tag is a closed enum so an untagged variable cannot be built.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Typed variables
// ---------------------------------------------------------------------------

/// Primitive type vocabulary understood by the engine.
///
/// Tags not listed here (e.g. `Date`, `Object`) are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VariableType {
    String,
    Boolean,
    Integer,
    Long,
    Double,
    Json,
    Null,
    Other(String),
}

impl VariableType {
    pub fn as_str(&self) -> &str {
        match self {
            VariableType::String => "String",
            VariableType::Boolean => "Boolean",
            VariableType::Integer => "Integer",
            VariableType::Long => "Long",
            VariableType::Double => "Double",
            VariableType::Json => "Json",
            VariableType::Null => "Null",
            VariableType::Other(tag) => tag,
        }
    }
}

impl From<String> for VariableType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "String" => VariableType::String,
            "Boolean" => VariableType::Boolean,
            "Integer" => VariableType::Integer,
            "Long" => VariableType::Long,
            "Double" => VariableType::Double,
            "Json" => VariableType::Json,
            "Null" => VariableType::Null,
            _ => VariableType::Other(tag),
        }
    }
}

impl From<VariableType> for String {
    fn from(kind: VariableType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single variable value together with its engine type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    pub value: Value,
    #[serde(rename = "type")]
    pub kind: VariableType,
}

impl TypedValue {
    pub fn new(value: Value, kind: VariableType) -> Self {
        Self { value, kind }
    }

    /// String-tagged value. `None` is sent as JSON `null`, still tagged
    /// `String`, and the engine decides whether to accept it.
    pub fn string<S: Into<String>>(value: Option<S>) -> Self {
        let value = value.map(|s| Value::String(s.into())).unwrap_or(Value::Null);
        Self::new(value, VariableType::String)
    }
}

/// Variables keyed by name, as they appear in engine request bodies.
pub type VariableMap = BTreeMap<String, TypedValue>;

// ---------------------------------------------------------------------------
// Worker identity and topics
// ---------------------------------------------------------------------------

/// Identity this process presents to the engine when claiming and releasing
/// task locks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Topic the worker claims, and how long a claimed task stays locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSubscription {
    pub topic_name: String,
    /// Lock duration in milliseconds.
    pub lock_duration: u64,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /process-definition/key/{key}/start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartProcess {
    pub variables: VariableMap,
}

/// Body of `POST /external-task/fetchAndLock`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchAndLock {
    pub worker_id: WorkerId,
    pub max_tasks: u32,
    pub topics: Vec<TopicSubscription>,
}

/// Body of `POST /external-task/{id}/complete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTask {
    pub worker_id: WorkerId,
    pub variables: VariableMap,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// A locked external task as returned by fetch-and-lock.
///
/// Only `id` is needed to complete the task. Other fields, process
/// variables included, are not decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTask {
    pub id: String,
    #[serde(default)]
    pub process_instance_id: Option<String>,
}

/// Error body the engine attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineErrorBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
