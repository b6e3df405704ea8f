//! Shared utilities for the Chatwire packages.
//!
//! Holds the pieces every binary and library in the workspace needs but which
//! belong to no single layer: logger bootstrap and time formatting.

pub mod logger;
pub mod time;
