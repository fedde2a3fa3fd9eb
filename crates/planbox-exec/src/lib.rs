//! Build plan execution against an external image builder.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod builder;
pub mod cancel;
pub mod driver;
pub mod runner;
