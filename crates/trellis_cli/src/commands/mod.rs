//! CLI command implementations.

pub mod permanent_items;
pub mod replay;
