use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::AdapterSettings;
use crate::error::ValidationError;

use super::ProtocolAdapter;
use super::builtins;

/// Builds an adapter for one run from its settings.
pub type AdapterConstructor =
    Arc<dyn Fn(&AdapterSettings) -> Arc<dyn ProtocolAdapter> + Send + Sync>;

/// Maps protocol names to adapter constructors.
///
/// The driver resolves the adapter once per run; adding a protocol means
/// registering a constructor here, not touching the driver.
#[derive(Clone, Default)]
pub struct ProtocolRegistry {
    constructors: BTreeMap<String, AdapterConstructor>,
}

impl ProtocolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, constructor) in builtins::builtins() {
            if let Err(err) = registry.register(name, constructor) {
                tracing::warn!("Skipping builtin protocol adapter: {}", err);
            }
        }
        registry
    }

    /// Registers a constructor under `name` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error when the name is empty or already registered.
    pub fn register<F>(&mut self, name: &str, constructor: F) -> Result<(), ValidationError>
    where
        F: Fn(&AdapterSettings) -> Arc<dyn ProtocolAdapter> + Send + Sync + 'static,
    {
        let key = normalize(name);
        if key.is_empty() {
            return Err(ValidationError::EmptyProtocolName);
        }
        if self.constructors.contains_key(&key) {
            return Err(ValidationError::DuplicateProtocol { protocol: key });
        }
        self.constructors.insert(key, Arc::new(constructor));
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&normalize(name))
    }

    /// Builds the adapter registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedProtocol` when no adapter is registered under the
    /// name.
    pub fn resolve(
        &self,
        name: &str,
        settings: &AdapterSettings,
    ) -> Result<Arc<dyn ProtocolAdapter>, ValidationError> {
        self.constructors
            .get(&normalize(name))
            .map(|constructor| constructor(settings))
            .ok_or_else(|| ValidationError::UnsupportedProtocol {
                protocol: name.to_owned(),
                supported: self.supported_protocols_csv(),
            })
    }

    #[must_use]
    pub fn supported_protocols_csv(&self) -> String {
        self.constructors
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
