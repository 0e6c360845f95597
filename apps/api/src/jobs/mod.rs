// Jobs API: persistence (Postgres and in-memory stores), request validation,
// job-description generation, and the HTTP handlers.

pub mod description;
pub mod handlers;
pub mod memory;
pub mod prompts;
pub mod store;
pub mod validation;
