// CV-to-job evaluation: work selection, prompt building, reconciliation of
// model output, and the run orchestrator that ties them to storage.
// All model calls go through llm_client.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod reconcile;
pub mod selector;
