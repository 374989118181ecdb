//! Secret management for provider credentials and endpoint URLs.
//!
//! Secrets are held in [`SecretString`], which zeroizes its buffer on drop and
//! redacts itself in `Debug` and `Display` output. A [`SecretValue`] is either
//! the secret itself or a reference to an environment variable holding it.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fmt};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::models::security::error::{SecurityError, SecurityResult};

const REDACTED: &str = "***";

/// A secret value that can be sourced from different places.
///
/// - `Plain`: the secret itself
/// - `Environment`: name of the environment variable holding the secret
#[derive(Clone, Serialize, Deserialize, ZeroizeOnDrop)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
#[serde(deny_unknown_fields)]
pub enum SecretValue {
	#[serde(alias = "Plain", alias = "PLAIN")]
	Plain(SecretString),
	#[serde(alias = "Environment", alias = "ENVIRONMENT")]
	Environment(String),
}

impl PartialEq for SecretValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Plain(l0), Self::Plain(r0)) => l0.as_str() == r0.as_str(),
			(Self::Environment(l0), Self::Environment(r0)) => l0 == r0,
			_ => false,
		}
	}
}

/// A string that is zeroized when dropped and never printed.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

impl SecretValue {
	/// Creates a plain secret
	pub fn plain(value: impl Into<String>) -> Self {
		Self::Plain(SecretString::new(value.into()))
	}

	/// Resolves the secret from its source.
	///
	/// # Errors
	/// Returns a `SecurityError` if the referenced environment variable is not set.
	pub async fn resolve(&self) -> SecurityResult<SecretString> {
		match self {
			SecretValue::Plain(secret) => Ok(secret.clone()),
			SecretValue::Environment(env_var) => {
				env::var(env_var).map(SecretString::new).map_err(|e| {
					Box::new(SecurityError::resolution_error(
						"Failed to read secret from environment",
						Some(e.into()),
						Some(HashMap::from([("variable".to_string(), env_var.clone())])),
					))
				})
			}
		}
	}

	/// Checks if the secret value is empty after trimming
	pub fn is_empty(&self) -> bool {
		self.as_str().trim().is_empty()
	}

	/// Returns the raw value: the secret for `Plain`, the variable name for `Environment`
	pub fn as_str(&self) -> &str {
		match self {
			SecretValue::Plain(secret) => secret.as_str(),
			SecretValue::Environment(env_var) => env_var,
		}
	}
}

impl Zeroize for SecretValue {
	fn zeroize(&mut self) {
		match self {
			SecretValue::Plain(secret) => secret.zeroize(),
			SecretValue::Environment(env_var) => env_var.zeroize(),
		}
	}
}

impl SecretString {
	pub fn new(value: String) -> Self {
		Self(value)
	}

	/// Gets a reference to the underlying string.
	///
	/// The reference should be used immediately and not stored.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl AsRef<str> for SecretString {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl fmt::Debug for SecretValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SecretValue::Plain(_) => write!(f, "Plain({})", REDACTED),
			SecretValue::Environment(env_var) => write!(f, "Environment({})", env_var),
		}
	}
}

impl fmt::Display for SecretValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SecretValue::Plain(_) => write!(f, "{}", REDACTED),
			SecretValue::Environment(env_var) => write!(f, "${}", env_var),
		}
	}
}
