//! Clock, configuration, and the sweep tick loop for the Tonyn feed.
//!
//! # Modules
//!
//! - [`clock`] -- [`Clock`] trait with system and manual implementations.
//! - [`config`] -- Configuration loading from `tonyn-config.yaml` into
//!   strongly-typed structs.
//! - [`runner`] -- [`run_session`], the async loop that sweeps the store
//!   once per tick.
//! - [`session`] -- [`SessionControl`], shared stop and speed controls.
//!
//! [`Clock`]: clock::Clock
//! [`run_session`]: runner::run_session
//! [`SessionControl`]: session::SessionControl

pub mod clock;
pub mod config;
pub mod runner;
pub mod session;
