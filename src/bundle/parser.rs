//! Bundle Parser (C5): scene manifest JSON -> resolved script bindings.

use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
struct Manifest {
    format_version: Option<String>,
    scene_name: Option<String>,
    #[serde(default)]
    region: Option<serde_json::Value>,
    #[serde(default)]
    objects: IndexMap<String, ManifestObject>,
    #[serde(default)]
    assets: IndexMap<String, ManifestAsset>,
}

#[derive(Debug, Deserialize)]
struct ManifestObject {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    inventory: Vec<InventoryEntry>,
}

#[derive(Debug, Deserialize)]
struct InventoryEntry {
    name: String,
    asset: String,
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ManifestAsset {
    #[serde(rename = "type")]
    kind: String,
    path: String,
}

/// One resolvable `script` inventory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBinding {
    pub object_id: String,
    pub object_name: String,
    pub script_name: String,
    pub asset_uuid: String,
    pub asset_path: String,
}

/// Aggregate per-region counts, informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionStats {
    pub object_count: usize,
    pub asset_count: usize,
}

/// The result of a successful [`parse`].
#[derive(Debug, Clone)]
pub struct ParsedBundle {
    pub format_version: String,
    pub scene_name: String,
    pub region: Option<serde_json::Value>,
    pub scripts: Vec<ScriptBinding>,
    pub animation_assets: Vec<String>,
    pub sound_assets: Vec<String>,
    pub stats: RegionStats,
}

/// A single validation failure, tagged with the manifest field it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// An unparsable manifest (not valid JSON, or not a JSON object).
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid manifest JSON: {0}")]
pub struct ManifestJsonError(pub String);

/// Checks a manifest for required fields and dangling `script` references.
/// Dangling references to non-`script` assets are tolerated, per spec.
pub fn validate(manifest_json: &str) -> Result<Vec<ValidationError>, ManifestJsonError> {
    let manifest: Manifest = serde_json::from_str(manifest_json).map_err(|e| ManifestJsonError(e.to_string()))?;
    let mut errors = Vec::new();

    if manifest.format_version.is_none() {
        errors.push(ValidationError { field: "format_version".to_string(), message: "missing required field".to_string() });
    }
    if manifest.scene_name.is_none() {
        errors.push(ValidationError { field: "scene_name".to_string(), message: "missing required field".to_string() });
    }
    if manifest.objects.is_empty() {
        errors.push(ValidationError { field: "objects".to_string(), message: "missing required field".to_string() });
    }
    if manifest.assets.is_empty() {
        errors.push(ValidationError { field: "assets".to_string(), message: "missing required field".to_string() });
    }

    for (object_id, object) in &manifest.objects {
        for entry in &object.inventory {
            if entry.kind == "script" && !manifest.assets.contains_key(&entry.asset) {
                errors.push(ValidationError {
                    field: format!("objects.{object_id}.inventory[{}]", entry.name),
                    message: format!("script inventory entry references unknown asset '{}'", entry.asset),
                });
            }
        }
    }

    Ok(errors)
}

/// Parses a manifest into a [`ParsedBundle`], filtering to only those
/// `script` inventory entries whose asset actually resolves. Does not
/// itself validate — call [`validate`] first if you need diagnostics.
pub fn parse(manifest_json: &str) -> Result<ParsedBundle, ManifestJsonError> {
    let manifest: Manifest = serde_json::from_str(manifest_json).map_err(|e| ManifestJsonError(e.to_string()))?;

    let mut scripts = Vec::new();
    let mut animation_assets = Vec::new();
    let mut sound_assets = Vec::new();

    for (object_id, object) in &manifest.objects {
        let object_name = object.name.clone().unwrap_or_else(|| object_id.clone());
        for entry in &object.inventory {
            if entry.kind != "script" {
                continue;
            }
            if let Some(asset) = manifest.assets.get(&entry.asset) {
                scripts.push(ScriptBinding {
                    object_id: object_id.clone(),
                    object_name: object_name.clone(),
                    script_name: entry.name.clone(),
                    asset_uuid: entry.asset.clone(),
                    asset_path: asset.path.clone(),
                });
            }
        }
    }

    for (_uuid, asset) in &manifest.assets {
        match asset.kind.as_str() {
            "animation" => animation_assets.push(asset.path.clone()),
            "sound" => sound_assets.push(asset.path.clone()),
            _ => {}
        }
    }

    Ok(ParsedBundle {
        format_version: manifest.format_version.unwrap_or_default(),
        scene_name: manifest.scene_name.unwrap_or_default(),
        region: manifest.region,
        stats: RegionStats {
            object_count: manifest.objects.len(),
            asset_count: manifest.assets.len(),
        },
        scripts,
        animation_assets,
        sound_assets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "format_version": "1.0",
        "scene_name": "Test Scene",
        "objects": {
            "obj-1": { "name": "Door", "inventory": [ { "name": "door script", "asset": "asset-1", "kind": "script" } ] }
        },
        "assets": {
            "asset-1": { "type": "script", "path": "scripts/door.lsl" }
        }
    }"#;

    #[test]
    fn parses_a_valid_manifest() {
        let bundle = parse(VALID).unwrap();
        assert_eq!(bundle.scripts.len(), 1);
        assert_eq!(bundle.scripts[0].asset_path, "scripts/door.lsl");
        assert!(validate(VALID).unwrap().is_empty());
    }

    #[test]
    fn dangling_script_reference_yields_zero_bindings_and_one_error() {
        let src = r#"{
            "format_version": "1.0",
            "scene_name": "Test",
            "objects": { "obj-1": { "inventory": [ { "name": "s", "asset": "no-such-asset", "kind": "script" } ] } },
            "assets": { "other": { "type": "texture", "path": "x.png" } }
        }"#;
        let bundle = parse(src).unwrap();
        assert_eq!(bundle.scripts.len(), 0);
        let errors = validate(src).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("no-such-asset"));
    }

    #[test]
    fn dangling_non_script_reference_is_tolerated() {
        let src = r#"{
            "format_version": "1.0",
            "scene_name": "Test",
            "objects": { "obj-1": { "inventory": [ { "name": "tex", "asset": "missing", "kind": "texture" } ] } },
            "assets": { "a": { "type": "script", "path": "x.lsl" } }
        }"#;
        assert!(validate(src).unwrap().is_empty());
    }

    #[test]
    fn missing_required_fields_are_each_reported() {
        let errors = validate("{}").unwrap();
        assert_eq!(errors.len(), 4);
    }
}
