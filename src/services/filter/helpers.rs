//! Helper functions for EVM-specific operations.
//!
//! This module provides utility functions for working with EVM data types:
//! address and hash formatting, topic padding, event signature hashing and
//! ABI encoding/decoding of contract view calls.

use alloy::core::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt};
use alloy::core::json_abi::{Function, JsonAbi};
use alloy::primitives::{keccak256, Address, Bytes, B256};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::services::filter::error::FilterError;

/// Converts a B256 hash to its hexadecimal string representation.
///
/// # Returns
/// A string in the format "0x..." representing the hash
pub fn b256_to_string(hash: B256) -> String {
	format!("0x{}", hex::encode(hash.as_slice()))
}

/// Converts an address to its lowercase hexadecimal string representation.
pub fn h160_to_string(address: Address) -> String {
	format!("0x{}", hex::encode(address.as_slice()))
}

/// Left-pads an address to a 32-byte topic
pub fn pad_address(address: Address) -> B256 {
	address.into_word()
}

/// Reads the address held in the low 20 bytes of a topic
pub fn topic_to_address(topic: &B256) -> Address {
	Address::from_word(*topic)
}

/// Normalizes a function or event signature by removing spaces.
pub fn normalize_signature(signature: &str) -> String {
	signature.replace(' ', "")
}

/// Keccak hash of an event signature such as `Transfer(address,address,uint256)`
pub fn event_signature(signature: &str) -> B256 {
	keccak256(normalize_signature(signature).as_bytes())
}

/// A view function call ready to be sent with `eth_call`
#[derive(Debug, Clone)]
pub struct EncodedCall {
	pub function: Function,
	pub data: Bytes,
}

/// Parses either a full ABI array or a single function fragment.
///
/// Fragments without a `type` field are read as functions.
fn parse_abi(fragment: &Value) -> Result<JsonAbi, FilterError> {
	let items = match fragment {
		Value::Array(_) => fragment.clone(),
		Value::Object(object) => {
			let mut object = object.clone();
			object
				.entry("type")
				.or_insert_with(|| Value::String("function".to_string()));
			Value::Array(vec![Value::Object(object)])
		}
		Value::String(raw) => serde_json::from_str(raw).map_err(|e| {
			FilterError::abi_error("ABI fragment is not valid JSON", Some(Box::new(e)), None)
		})?,
		_ => {
			return Err(FilterError::abi_error(
				"ABI fragment must be an array or an object",
				None,
				None,
			))
		}
	};

	serde_json::from_value::<JsonAbi>(items)
		.map_err(|e| FilterError::abi_error("Failed to parse ABI", Some(Box::new(e)), None))
}

/// Renders a JSON call argument the way `DynSolType::coerce_str` expects it
fn argument_to_string(argument: &Value) -> String {
	match argument {
		Value::String(s) => s.clone(),
		Value::Array(items) => format!(
			"[{}]",
			items
				.iter()
				.map(argument_to_string)
				.collect::<Vec<_>>()
				.join(",")
		),
		other => other.to_string(),
	}
}

/// Encodes a view function call from an ABI fragment and JSON arguments.
///
/// # Arguments
/// * `fragment` - A full ABI array or a single function fragment
/// * `function_name` - The function to call
/// * `args` - Arguments, coerced to the declared input types
///
/// # Errors
/// Returns `FilterError::AbiError` when the function is missing or an argument
/// does not fit its declared type.
pub fn encode_call(
	fragment: &Value,
	function_name: &str,
	args: &[Value],
) -> Result<EncodedCall, FilterError> {
	let metadata = HashMap::from([("function".to_string(), function_name.to_string())]);
	let abi = parse_abi(fragment)?;

	let overloads = abi.function(function_name).ok_or_else(|| {
		FilterError::abi_error(
			"function not found in ABI",
			None,
			Some(metadata.clone()),
		)
	})?;
	let function = overloads
		.iter()
		.find(|function| function.inputs.len() == args.len())
		.ok_or_else(|| {
			FilterError::abi_error(
				format!("no overload accepts {} arguments", args.len()),
				None,
				Some(metadata.clone()),
			)
		})?;

	let mut values = Vec::with_capacity(args.len());
	for (param, argument) in function.inputs.iter().zip(args) {
		let ty: DynSolType = param.selector_type().parse().map_err(|e| {
			FilterError::abi_error(
				format!("unsupported parameter type {}", param.selector_type()),
				Some(Box::new(e)),
				Some(metadata.clone()),
			)
		})?;
		let value = ty.coerce_str(&argument_to_string(argument)).map_err(|e| {
			FilterError::abi_error(
				format!("argument '{}' does not fit {}", param.name, ty),
				Some(Box::new(e)),
				Some(metadata.clone()),
			)
		})?;
		values.push(value);
	}

	let data = function.abi_encode_input(&values).map_err(|e| {
		FilterError::abi_error(
			"Failed to encode call",
			Some(Box::new(e)),
			Some(metadata.clone()),
		)
	})?;

	Ok(EncodedCall {
		function: function.clone(),
		data: Bytes::from(data),
	})
}

/// Decodes the return data of a view call into its output values
pub fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<DynSolValue>, FilterError> {
	let metadata = HashMap::from([("function".to_string(), function.name.clone())]);

	let types = function
		.outputs
		.iter()
		.map(|param| param.selector_type().parse::<DynSolType>())
		.collect::<Result<Vec<_>, _>>()
		.map_err(|e| {
			FilterError::decode_error(
				"unsupported output type",
				Some(Box::new(e)),
				Some(metadata.clone()),
			)
		})?;

	match DynSolType::Tuple(types).abi_decode_params(data) {
		Ok(DynSolValue::Tuple(values)) => Ok(values),
		Ok(other) => Ok(vec![other]),
		Err(e) => Err(FilterError::decode_error(
			"Failed to decode call output",
			Some(Box::new(e)),
			Some(metadata),
		)),
	}
}

/// Converts a decoded value into JSON.
///
/// Integers become decimal strings so no precision is lost.
pub fn dyn_value_to_json(value: &DynSolValue) -> Value {
	match value {
		DynSolValue::Bool(b) => json!(b),
		DynSolValue::String(s) => json!(s),
		DynSolValue::Address(addr) => json!(h160_to_string(*addr)),
		DynSolValue::Uint(u, _) => json!(u.to_string()),
		DynSolValue::Int(i, _) => json!(i.to_string()),
		DynSolValue::FixedBytes(bytes, size) => {
			json!(format!("0x{}", hex::encode(&bytes[..*size])))
		}
		DynSolValue::Bytes(bytes) => json!(format!("0x{}", hex::encode(bytes))),
		DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
			Value::Array(items.iter().map(dyn_value_to_json).collect())
		}
		DynSolValue::Function(selector) => json!(format!("0x{}", hex::encode(selector))),
	}
}
