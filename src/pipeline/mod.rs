pub mod aggregate;
pub mod identity;
pub mod jobs;
pub mod orchestrator;
pub mod transitions;
pub mod writeback;
