//! Test helper utilities
//!
//! - `builders`: Builders for trigger configurations and raw EVM logs

pub mod builders {
	pub mod trigger;
}

pub use builders::*;
