//! Platform utilities

pub mod logging;
