//! Integration tests for tide-bot.
//!
//! These tests drive the wired application against mock seams:
//! - Trigger, build, submit and reconcile
//! - Periodic task cadence under a paused clock
//! - Cancellation racing a submission

pub mod common;
