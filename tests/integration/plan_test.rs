//! Integration tests for the script-to-plan pipeline.
//!
//! These tests are implemented in:
//! `crates/planbox-plan/tests/pipeline_test.rs`
//!
//! Covered scenarios:
//! - `pipeline_ci_toolchain_scenario`: Full compile of a realistic CI script with includes and hooks
//! - `pipeline_hooks_apply_in_registration_order`: Deferred blocks append in declaration order
//! - `pipeline_shared_fragment_applies_once_per_build`: Diamond includes collapse to one application
//! - `pipeline_second_base_image_conflicts`: Disagreeing FROM directives abort the build
//! - `pipeline_required_variable_aborts_the_build`: `${NAME:?}` fails fast when unset
//! - `pipeline_digest_tracks_the_environment_snapshot`: Plan digests change with the input env
//! - `pipeline_render_expands_flatten_into_squash_and_recreate`: Flatten markers become builder invocations
//! - `pipeline_filesystem_scripts_with_nested_include`: On-disk scripts resolve includes relative to the includer
