//! Provisioning sequencer.
//!
//! The sequence is a fixed list of [`Step`]s built from configuration by
//! [`build_plan`]. [`Provisioner`] waits for the service, then executes the
//! steps one at a time:
//!
//! - expected status: success, next step
//! - 409: the resource exists; create steps follow up with a PUT under the
//!   `update` conflict policy
//! - anything else: required steps abort the run, best-effort steps
//!   (bounding boxes, global settings) become warnings

pub mod mutate;
mod plan;
mod readiness;
mod report;
mod runner;
mod step;

pub use plan::build_plan;
pub use readiness::{parse_version, wait_for_ready, VERSION_PATH};
pub use report::{ProvisionReport, ServiceLinks};
pub use runner::{ProvisionError, Provisioner};
pub use step::*;
