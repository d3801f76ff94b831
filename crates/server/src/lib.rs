//! HTTP surface of the shorts pipeline.
//!
//! Every stage is exposed as its own trigger endpoint; the binary in
//! `main.rs` loads configuration, wires the collaborators and serves
//! [`api::create_router`].

pub mod api;
pub mod metrics;
pub mod state;
