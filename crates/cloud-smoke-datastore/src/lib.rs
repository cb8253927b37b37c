// crates/cloud-smoke-datastore/src/lib.rs
// ============================================================================
// Module: Cloud Smoke Datastore
// Description: Cloud Datastore driver, filters, keys, and smoke tester.
// Purpose: Exercise Datastore (or its emulator) over the v1 REST API.
// Dependencies: async-trait, base64, reqwest, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! - [`DatastoreDriver`]: JSON over HTTP against the public endpoint or the
//!   emulator named by `DATASTORE_EMULATOR_HOST`.
//! - [`DataFilter`] and [`Query`]: property filters, ancestors, ordering.
//! - [`Key`]: entity keys with a URL-safe encoded form.
//! - [`BasicDriver`]: typed access to `Animal` entities.
//! - [`DatastoreTester`]: the scripted create/find/update/get/delete run.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod basic;
pub mod driver;
mod error;
pub mod filter;
pub mod key;
pub mod query;
pub mod tester;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use basic::Animal;
pub use basic::BasicDriver;
pub use driver::DatastoreDriver;
pub use driver::Driver;
pub use driver::DriverConfig;
pub use driver::EntityIterator;
pub use error::DatastoreError;
pub use filter::DataFilter;
pub use filter::FieldFilter;
pub use filter::FilterOperator;
pub use key::Key;
pub use key::PathElement;
pub use query::Query;
pub use tester::DatastoreScenario;
pub use tester::DatastoreTester;
