//! Mock implementations for testing purposes.
//!
//! This module contains mock implementations of the traits used throughout
//! the crate, primarily for testing. It includes:
//! - Chain connections and connection factories
//! - Emission sinks and a hand-driven job scheduler
//! - JSON-RPC transports and mockito server helpers
//!
//! The mocks are implemented using the `mockall` crate where expectations are
//! needed, and as small fakes where state is.

#[allow(unused_imports)]
pub use connections::*;
#[allow(unused_imports)]
pub use services::*;
#[allow(unused_imports)]
pub use transports::*;
