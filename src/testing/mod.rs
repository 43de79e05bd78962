//! Testing utilities and mock implementations
//!
//! Mock publisher, sensor source, and network interface so every state
//! machine can be exercised without a broker, GPIO hardware, or a wireless
//! adapter.

pub mod mocks;

pub use mocks::*;
