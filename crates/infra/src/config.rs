//! Startup configuration for the contract.

use std::path::Path;

use anyhow::Context;

use carchain_auth::AccessPolicy;
use carchain_observability::Logger;

use crate::ledger::CompositeKey;
use crate::record_store::CAR_NAMESPACE;

/// Path of a JSON access policy table.
pub const POLICY_FILE_ENV: &str = "CARCHAIN_POLICY_FILE";
/// Override for the namespace token car keys are stored under.
pub const NAMESPACE_ENV: &str = "CARCHAIN_NAMESPACE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractConfig {
    pub policy: AccessPolicy,
    pub namespace: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            policy: AccessPolicy::default(),
            namespace: CAR_NAMESPACE.to_string(),
        }
    }
}

impl ContractConfig {
    /// Load from `CARCHAIN_POLICY_FILE` / `CARCHAIN_NAMESPACE`.
    pub fn from_env(logger: &Logger) -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok(), logger)
    }

    /// Same as [`ContractConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F, logger: &Logger) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let policy = match lookup(POLICY_FILE_ENV).filter(|p| !p.trim().is_empty()) {
            Some(path) => {
                let policy = load_policy_file(&path)?;
                logger.scope(|| tracing::info!(path = %path, "access policy loaded"));
                policy
            }
            None => {
                logger.scope(|| {
                    tracing::warn!("{POLICY_FILE_ENV} not set, using built-in access policy")
                });
                AccessPolicy::default()
            }
        };

        let namespace = lookup(NAMESPACE_ENV).unwrap_or_else(|| CAR_NAMESPACE.to_string());
        let config = Self { policy, namespace };
        config.validate()?;
        Ok(config)
    }

    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        CompositeKey::new(&self.namespace, &[])
            .with_context(|| format!("invalid namespace token {:?}", self.namespace))?;
        self.policy.validate().context("invalid access policy")?;
        Ok(())
    }
}

/// Read and validate a JSON policy table from disk.
pub fn load_policy_file(path: impl AsRef<Path>) -> anyhow::Result<AccessPolicy> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read policy file {}", path.display()))?;
    AccessPolicy::from_json(&json)
        .with_context(|| format!("failed to load policy file {}", path.display()))
}
