//! JSON manifest of desired resources
//!
//! A manifest lists the resources the user wants to exist:
//!
//! ```json
//! {
//!   "resources": [
//!     {
//!       "type": "dlc.data_engine",
//!       "name": "main",
//!       "attributes": { "data_engine_name": "main", "engine_type": "spark", ... }
//!     },
//!     { "type": "dlc.data_engines", "name": "all", "read_only": true, "attributes": {} }
//!   ]
//! }
//! ```
//!
//! Entries with `read_only: true` are data-source queries and are never
//! created, updated, or deleted.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use vela_core::resource::{Resource, attributes_from_json};

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    resources: Vec<ManifestResource>,
}

#[derive(Debug, Deserialize)]
struct ManifestResource {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    read_only: bool,
    #[serde(default = "empty_object")]
    attributes: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Load and parse a manifest file into desired resources
pub fn load(path: &Path) -> Result<Vec<Resource>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse(&content)
}

/// Parse manifest JSON into desired resources
pub fn parse(content: &str) -> Result<Vec<Resource>, String> {
    let manifest: ManifestFile =
        serde_json::from_str(content).map_err(|e| format!("Invalid manifest: {}", e))?;

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut resources = Vec::with_capacity(manifest.resources.len());

    for entry in manifest.resources {
        if !seen.insert((entry.resource_type.clone(), entry.name.clone())) {
            return Err(format!(
                "Duplicate resource: {}.{}",
                entry.resource_type, entry.name
            ));
        }

        let attributes = attributes_from_json(&entry.attributes).map_err(|e| {
            format!(
                "{}.{}: invalid attributes: {}",
                entry.resource_type, entry.name, e
            )
        })?;

        let mut resource = Resource::new(entry.resource_type, entry.name);
        resource.attributes = attributes;
        resources.push(resource.with_read_only(entry.read_only));
    }

    Ok(resources)
}
