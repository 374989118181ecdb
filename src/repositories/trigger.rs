//! Trigger configuration repository implementation.
//!
//! Loads the trigger definitions found in `config/triggers/*.json` (or a
//! given directory) through the [`ConfigLoader`] implementation of
//! [`TriggerConfig`], keyed by trigger key.

#![allow(clippy::result_large_err)]

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;

use crate::{
	models::{ConfigLoader, TriggerConfig},
	repositories::error::RepositoryError,
};

/// Repository for storing and retrieving trigger configurations
#[derive(Clone, Default)]
pub struct TriggerRepository {
	/// Map of trigger keys to their configurations
	pub triggers: HashMap<String, TriggerConfig>,
}

impl TriggerRepository {
	/// Create a new trigger repository from the given path
	///
	/// Loads all trigger configurations from JSON files in the specified directory
	/// (or default config directory if None is provided).
	pub async fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		let triggers = Self::load_all(path).await?;
		Ok(TriggerRepository { triggers })
	}
}

/// Interface for trigger repository implementations
#[async_trait]
pub trait TriggerRepositoryTrait: Clone {
	/// Create a new trigger repository from the given path
	async fn new(path: Option<&Path>) -> Result<Self, RepositoryError>
	where
		Self: Sized;

	/// Load all trigger configurations from the given path
	///
	/// If no path is provided, uses the default config directory.
	async fn load_all(
		path: Option<&Path>,
	) -> Result<HashMap<String, TriggerConfig>, RepositoryError>;

	/// Get a specific trigger by key
	fn get(&self, trigger_key: &str) -> Option<TriggerConfig>;

	/// Get all triggers
	fn get_all(&self) -> HashMap<String, TriggerConfig>;
}

#[async_trait]
impl TriggerRepositoryTrait for TriggerRepository {
	async fn new(path: Option<&Path>) -> Result<Self, RepositoryError> {
		TriggerRepository::new(path).await
	}

	async fn load_all(
		path: Option<&Path>,
	) -> Result<HashMap<String, TriggerConfig>, RepositoryError> {
		TriggerConfig::load_all(path).await.map_err(|e| {
			RepositoryError::load_error(
				"Failed to load triggers",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"path".to_string(),
					path.map_or_else(|| "default".to_string(), |p| p.display().to_string()),
				)])),
			)
		})
	}

	fn get(&self, trigger_key: &str) -> Option<TriggerConfig> {
		self.triggers.get(trigger_key).cloned()
	}

	fn get_all(&self) -> HashMap<String, TriggerConfig> {
		self.triggers.clone()
	}
}

/// Service layer for trigger repository operations
#[derive(Clone)]
pub struct TriggerService<T: TriggerRepositoryTrait> {
	repository: T,
}

impl<T: TriggerRepositoryTrait> TriggerService<T> {
	/// Create a new trigger service with the default repository implementation
	pub async fn new(
		path: Option<&Path>,
	) -> Result<TriggerService<TriggerRepository>, RepositoryError> {
		let repository = TriggerRepository::new(path).await?;
		Ok(TriggerService { repository })
	}

	/// Create a new trigger service with a custom repository implementation
	pub fn new_with_repository(repository: T) -> Self {
		TriggerService { repository }
	}

	/// Get a specific trigger by key
	pub fn get(&self, trigger_key: &str) -> Option<TriggerConfig> {
		self.repository.get(trigger_key)
	}

	/// Get all triggers
	pub fn get_all(&self) -> HashMap<String, TriggerConfig> {
		self.repository.get_all()
	}

	/// Trigger keys in a stable order, used to start triggers deterministically
	pub fn keys(&self) -> Vec<String> {
		let mut keys: Vec<String> = self.repository.get_all().into_keys().collect();
		keys.sort();
		keys
	}
}
