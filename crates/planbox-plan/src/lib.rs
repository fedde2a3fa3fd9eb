//! # planbox-plan
//!
//! Turns an evaluated script graph into a sealed, serializable build plan.
//!
//! Handles:
//! - **Assemble**: Directive concatenation, singleton checks, and the plan
//!   draft that hooks append to.
//! - **Envmerge**: Last-write-wins environment merging with ordered
//!   path-list accumulation.
//! - **Plan**: The immutable plan model, its manifest form, and its digest.
//! - **Render**: The stream of external-builder invocations a plan implies.
//! - **Pipeline**: The evaluate / assemble / hooks / seal phases of one
//!   build.

pub mod assemble;
pub mod envmerge;
pub mod pipeline;
pub mod plan;
pub mod render;
