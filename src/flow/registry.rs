//! Flow registry
//!
//! Holds every tenant's validated flow, keyed by tenant id. Tenants come from
//! the built-in set and from definition files; a file that fails to load is
//! reported and skipped without affecting the other tenants.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info, warn};

use super::definition::{FlowDefinition, FlowStep, TenantConfig, INITIAL_STATE};
use super::tenants::builtin_tenants;
use crate::utils::errors::{ChatFlowError, Result};
use crate::utils::logging::log_definition_error;

/// On-disk shape of a tenant definition (`.json` or `.toml`)
#[derive(Debug, Deserialize)]
struct TenantFile {
    /// Defaults to the file stem
    tenant_id: Option<String>,
    brand_name: String,
    #[serde(default = "default_entry_state")]
    entry_state: String,
    steps: HashMap<String, FlowStep>,
}

fn default_entry_state() -> String {
    INITIAL_STATE.to_string()
}

/// A definition file that could not be registered
#[derive(Debug)]
pub struct LoadFailure {
    pub source: PathBuf,
    pub error: ChatFlowError,
}

/// Outcome of loading a definition directory
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Read-only lookup of tenant flows
#[derive(Debug, Clone, Default)]
pub struct FlowRegistry {
    tenants: HashMap<String, Arc<TenantConfig>>,
}

impl FlowRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in tenants
    pub fn with_builtin_tenants() -> Result<Self> {
        let mut registry = Self::new();
        for tenant in builtin_tenants()? {
            registry.register(tenant);
        }
        Ok(registry)
    }

    /// Register a tenant, replacing any tenant with the same id
    pub fn register(&mut self, tenant: TenantConfig) -> Option<Arc<TenantConfig>> {
        let tenant_id = tenant.tenant_id.clone();
        let replaced = self.tenants.insert(tenant_id.clone(), Arc::new(tenant));
        if replaced.is_some() {
            warn!(tenant_id = %tenant_id, "Tenant flow replaced");
        } else {
            debug!(tenant_id = %tenant_id, "Tenant flow registered");
        }
        replaced
    }

    /// Get a tenant by id
    pub fn get(&self, tenant_id: &str) -> Option<Arc<TenantConfig>> {
        self.tenants.get(tenant_id).cloned()
    }

    /// Get a tenant by id, failing for unknown ids
    pub fn tenant(&self, tenant_id: &str) -> Result<Arc<TenantConfig>> {
        self.get(tenant_id)
            .ok_or_else(|| ChatFlowError::UnknownTenant(tenant_id.to_string()))
    }

    /// Registered tenant ids in sorted order
    pub fn tenant_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.tenants.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    /// Load every `.json` and `.toml` definition in a directory
    ///
    /// Only an unreadable directory is an error; broken files end up in the
    /// report's failures.
    pub async fn load_directory(&mut self, dir: &Path) -> Result<LoadReport> {
        let mut entries = fs::read_dir(dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }
        paths.sort();

        let mut report = LoadReport::default();
        for path in paths {
            if !is_definition_file(&path) {
                debug!(path = %path.display(), "Skipping non-definition file");
                continue;
            }

            match load_tenant_file(&path).await {
                Ok(tenant) => {
                    report.loaded.push(tenant.tenant_id.clone());
                    self.register(tenant);
                }
                Err(error) => {
                    log_definition_error(&path.display().to_string(), &error.to_string());
                    report.failures.push(LoadFailure { source: path, error });
                }
            }
        }

        info!(
            dir = %dir.display(),
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            "Loaded flow definitions"
        );
        Ok(report)
    }
}

fn is_definition_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("json") | Some("toml")
    )
}

async fn load_tenant_file(path: &Path) -> Result<TenantConfig> {
    let content = fs::read_to_string(path).await?;
    parse_tenant(path, &content)
}

/// Parse and validate one tenant definition; the format follows the extension
pub fn parse_tenant(path: &Path, content: &str) -> Result<TenantConfig> {
    let file: TenantFile = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(content)?,
        _ => serde_json::from_str(content)?,
    };

    let tenant_id = match file.tenant_id {
        Some(id) => id,
        None => path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string(),
    };

    let flow = FlowDefinition::new(&file.entry_state, file.steps)?;
    Ok(TenantConfig::new(&tenant_id, &file.brand_name, flow)?)
}
