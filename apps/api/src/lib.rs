//! HireWise API: job postings with background skill generation, plus the
//! client-side poller used to watch a job until its skills are ready.

pub mod config;
pub mod db;
pub mod errors;
pub mod jobs;
pub mod llm_client;
pub mod models;
pub mod poller;
pub mod routes;
pub mod skills;
pub mod state;
