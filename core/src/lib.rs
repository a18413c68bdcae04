//! # Context Agent Core
//!
//! Core types shared by the context agent crates.
//!
//! The agent host talks to tools only through the types in [`agent`]:
//! a [`Tool`](agent::Tool) definition for the LLM, a
//! [`ToolExecutorFn`](agent::ToolExecutorFn) that runs it, and a
//! [`ToolSafety`](agent::ToolSafety) flag telling the host whether a
//! confirmation step is needed.

pub mod agent;

pub use agent::{Tool, ToolError, ToolExecutorFn, ToolFuture, ToolResult, ToolSafety};
