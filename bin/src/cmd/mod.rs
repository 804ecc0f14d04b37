//! CLI subcommand modules.
//!
//! This module contains the implementations for all ronda CLI subcommands.

pub(crate) mod compute;
pub(crate) mod eval;
pub(crate) mod factors;
pub(crate) mod preprocess;
