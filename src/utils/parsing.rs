//! Parsing utilities
//!
//! String helpers shared by the CLI, the logging setup and the JSON-RPC
//! clients.

use byte_unit::Byte;
use std::str::FromStr;

/// Parses a human-readable size such as "1GB", "500MB" or "1024KiB" into bytes.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	Byte::from_str(s)
		.map(|byte| byte.as_u64())
		.map_err(|e| format!("Invalid size format: '{}'. Error: {}", s, e))
}

/// Trims and lowercases a string for case-insensitive matching
pub fn normalize_string(input: &str) -> String {
	input.trim().to_lowercase()
}

/// Parses a JSON-RPC quantity (`0x`-prefixed hexadecimal, no leading zeros required)
pub fn parse_hex_quantity(quantity: &str) -> Result<u64, String> {
	let digits = quantity
		.strip_prefix("0x")
		.or_else(|| quantity.strip_prefix("0X"))
		.ok_or_else(|| format!("Quantity '{}' is missing the 0x prefix", quantity))?;
	if digits.is_empty() {
		return Err(format!("Quantity '{}' has no digits", quantity));
	}
	u64::from_str_radix(digits, 16).map_err(|e| format!("Invalid quantity '{}': {}", quantity, e))
}

/// Formats a number as a JSON-RPC quantity
pub fn to_hex_quantity(value: u64) -> String {
	format!("0x{:x}", value)
}

/// Port of a `HOST:PORT` address, `None` when the address has no valid port
pub fn port_from_address(address: &str) -> Option<u16> {
	address
		.rsplit_once(':')
		.and_then(|(_, port)| port.parse().ok())
}
