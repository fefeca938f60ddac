//! bpmn-gateway: HTTP front end and external-task worker for a BPMN process
//! engine REST API.
//!
//! - `trigger` starts process instances from `POST /start-process`
//! - `worker` claims and completes external tasks of one topic on a timer
//! - `engine` holds the REST client both of them share
//!
//! All workflow state lives in the engine; this crate keeps none between
//! requests or poll cycles.

pub mod config;
pub mod engine;
pub mod server;
pub mod trigger;
pub mod worker;

pub use config::{BatchFailurePolicy, GatewayConfig};
pub use engine::{EngineApi, EngineError, RestEngineClient};
pub use server::{build_router, AppState};
pub use trigger::ProcessTrigger;
pub use worker::{ExternalTaskWorker, PollReport};
