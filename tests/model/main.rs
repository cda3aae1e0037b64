//! Reactive Model Integration Tests
//!
//! End-to-end coverage of the public facade:
//!
//! - `navigation`: pure get/put/delete over persistent trees
//! - `transactions`: atomic root swaps, no-ops, aborts, observers
//! - `lifetimes`: cancellation scope ordering and idempotence
//! - `entity_groups`: sibling active selection, host objects, config
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test model
//! cargo test --test model entity_groups::
//! cargo test --test model -- --nocapture
//! ```

#[path = "../common/mod.rs"]
mod common;

mod entity_groups;
mod navigation;
mod transactions;
