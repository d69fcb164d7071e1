//! Utility functions and helpers.

pub mod settings;
