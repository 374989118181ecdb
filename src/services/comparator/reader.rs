//! Reads the values polling watches compare.

use alloy::core::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, U256};
use serde_json::Value;
use std::collections::HashMap;

use crate::{
	models::ViewFunctionWatch,
	services::{
		blockchain::ChainConnection,
		comparator::snapshot::SnapshotValue,
		filter::{
			evm_helpers::{decode_output, dyn_value_to_json, encode_call, h160_to_string, EncodedCall},
			FilterError,
		},
		trigger::TriggerError,
	},
};

/// Reads the native balance of an account
pub async fn read_balance(
	connection: &dyn ChainConnection,
	address: Address,
) -> Result<U256, TriggerError> {
	connection.get_balance(address).await.map_err(|e| {
		TriggerError::connectivity_error(
			"Failed to read balance",
			Some(e.into()),
			Some(HashMap::from([(
				"address".to_string(),
				h160_to_string(address),
			)])),
		)
	})
}

/// Encoded view call of a watch, prepared once when the trigger starts
#[derive(Debug, Clone)]
pub struct ViewFunctionReader {
	contract: Address,
	call: EncodedCall,
}

impl ViewFunctionReader {
	/// Encodes the call described by the watch
	///
	/// # Errors
	/// Returns a `FilterError` when the ABI or arguments are unusable.
	pub fn new(watch: &ViewFunctionWatch) -> Result<Self, FilterError> {
		Ok(Self {
			contract: watch.contract_address,
			call: encode_call(&watch.abi_fragment, &watch.function_name, &watch.args)?,
		})
	}

	pub fn function_name(&self) -> &str {
		&self.call.function.name
	}

	/// Calls the function and converts the output into a comparable value.
	///
	/// A single integer output is compared numerically; anything else is
	/// compared through its JSON form.
	pub async fn read(&self, connection: &dyn ChainConnection) -> Result<SnapshotValue, TriggerError> {
		let metadata = HashMap::from([
			("contract".to_string(), h160_to_string(self.contract)),
			("function".to_string(), self.call.function.name.clone()),
		]);

		let output: Bytes = connection
			.call(self.contract, self.call.data.clone())
			.await
			.map_err(|e| {
				TriggerError::connectivity_error(
					"View function call failed",
					Some(e.into()),
					Some(metadata.clone()),
				)
			})?;

		let values = decode_output(&self.call.function, &output).map_err(|e| {
			TriggerError::decode_error(
				"Failed to decode view function output",
				Some(Box::new(e)),
				Some(metadata),
			)
		})?;

		Ok(match values.as_slice() {
			[DynSolValue::Uint(value, _)] => SnapshotValue::Unsigned(*value),
			[DynSolValue::Int(value, _)] => SnapshotValue::Signed(*value),
			[single] => SnapshotValue::Structured(dyn_value_to_json(single)),
			many => SnapshotValue::Structured(Value::Array(
				many.iter().map(dyn_value_to_json).collect(),
			)),
		})
	}
}
