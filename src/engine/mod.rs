//! Process engine REST integration.
//!
//! - `types`: request/response bodies and typed variables
//! - `client`: the `EngineApi` seam and its reqwest implementation
//! - `error`: `EngineError`

pub mod client;
pub mod error;
pub mod types;

pub use client::{EngineApi, RestEngineClient};
pub use error::{EngineError, EngineResult};
pub use types::{
    CompleteTask, ExternalTask, FetchAndLock, StartProcess, TopicSubscription, TypedValue,
    VariableMap, VariableType, WorkerId,
};
