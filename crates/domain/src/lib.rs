//! # presence-domain
//!
//! Pure domain model for the presence automation client.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define the **lock state** signal that gates automations
//! - Define **automation rules** (time window + trigger state + action)
//! - Define the **sync status** tracked by the sync engine
//! - Contain the eligibility logic of a rule (weekday, window, state)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod automation;
pub mod lock_state;
pub mod sync_status;
