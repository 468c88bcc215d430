//! Test doubles for code that depends on storage and time.
//!
//! Available with the `test-utils` feature.

pub mod mocks;
pub mod time;

pub use mocks::FailingStore;
pub use time::MockClock;
