//! ProcessTrigger: starts instances of the configured process definition.

use std::sync::Arc;

use serde_json::Value;

use crate::engine::{EngineApi, EngineResult, StartProcess, TypedValue, VariableMap, VariableType};

/// Variable carrying the applicant's name into the process.
pub const APPLICANT_NAME_VAR: &str = "applicantName";

/// Starts process instances on behalf of the HTTP layer.
///
/// No input validation happens here; the engine decides what it accepts.
#[derive(Clone)]
pub struct ProcessTrigger {
    engine: Arc<dyn EngineApi>,
    process_key: String,
}

impl ProcessTrigger {
    pub fn new(engine: Arc<dyn EngineApi>, process_key: impl Into<String>) -> Self {
        Self {
            engine,
            process_key: process_key.into(),
        }
    }

    /// Start one instance with `applicantName` set to `applicant_name`,
    /// tagged `String` whatever its JSON shape (a missing name is `null`).
    ///
    /// Returns the engine's instance descriptor as-is. Called once per
    /// request; there is no retry.
    pub async fn start(&self, applicant_name: Value) -> EngineResult<Value> {
        let body = start_body(applicant_name);
        let instance = self.engine.start_process(&self.process_key, &body).await?;

        let instance_id = instance
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("<none>");
        tracing::info!(
            process_key = %self.process_key,
            instance_id = instance_id,
            "Process instance started"
        );
        Ok(instance)
    }
}

fn start_body(applicant_name: Value) -> StartProcess {
    let mut variables = VariableMap::new();
    variables.insert(
        APPLICANT_NAME_VAR.to_string(),
        TypedValue::new(applicant_name, VariableType::String),
    );
    StartProcess { variables }
}
