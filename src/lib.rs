//! AI Interviewer — staged screening-interview engine.

pub mod config;
pub mod error;
pub mod interview;
pub mod oracle;
pub mod store;
pub mod ws;
