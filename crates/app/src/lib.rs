//! # presence-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ActionTransport` — send one API call to the upstream service
//!   - `Clock` — read the local wall-clock
//!   - `ChoiceSource` — pick a random element index
//! - Provide the use-cases:
//!   - `AutomationMatcher` — select the rules that apply right now
//!   - `ActionBuilder` — turn a rule into a concrete request payload
//!   - `RetryController` — delayed re-invocation of a failed sync
//!   - `SyncEngine` — the state machine tying the above together
//!
//! ## Dependency rule
//! Depends on `presence-domain` only (plus `tokio` for timers and locks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod action_builder;
pub mod matcher;
pub mod ports;
pub mod random;
pub mod retry;
pub mod sync_engine;
