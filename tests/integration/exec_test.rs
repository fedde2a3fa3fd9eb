//! Integration tests for plan execution and cancellation.
//!
//! These tests are implemented in:
//! `crates/planbox-exec/src/driver.rs` and `crates/planbox-exec/src/runner.rs`
//!
//! Covered scenarios:
//! - `operations_run_in_plan_order`: Builder calls mirror the plan step for step
//! - `empty_env_table_skips_configuration`: No env invocation when the table is empty
//! - `failing_step_halts_and_destroys_the_container`: Working container is reclaimed on error
//! - `cancellation_between_steps_destroys_the_container`: Cancel flag stops the drive loop
//! - `flatten_before_final_step_interleaves`: Flatten points fire between the right steps
//! - `failing_command_reports_its_status`: Exit codes surface in the step error
//! - `pre_raised_flag_kills_the_command`: In-flight processes die on cancellation
