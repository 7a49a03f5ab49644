// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration export and import in YAML and JSON formats.

use crate::config::EngineConfig;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Export engine configuration to YAML format.
pub fn export_yaml(config: &EngineConfig, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

/// Export engine configuration to JSON format.
pub fn export_json(config: &EngineConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

/// Import engine configuration from YAML format.
pub fn import_yaml(path: &Path) -> Result<EngineConfig> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let config = serde_yaml::from_str(&yaml)?;
    Ok(config)
}

/// Import engine configuration from JSON format.
pub fn import_json(path: &Path) -> Result<EngineConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let config = serde_json::from_str(&json)?;
    Ok(config)
}

/// Export engine configuration, picking the format from the extension.
pub fn export_config(config: &EngineConfig, path: &Path) -> Result<()> {
    let extension = path.extension().and_then(|s| s.to_str());
    match extension {
        Some("yaml") | Some("yml") => export_yaml(config, path),
        Some("json") => export_json(config, path),
        _ => bail!("Unsupported config extension: {:?}", extension),
    }
}

/// Import and validate engine configuration, picking the format from the
/// extension.
pub fn import_config(path: &Path) -> Result<EngineConfig> {
    let extension = path.extension().and_then(|s| s.to_str());
    let config = match extension {
        Some("yaml") | Some("yml") => import_yaml(path)?,
        Some("json") => import_json(path)?,
        _ => bail!("Unsupported config extension: {:?}", extension),
    };
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_by_extension() {
        let dir = std::env::temp_dir();
        let yaml_path = dir.join(format!("easel-config-{}.yaml", std::process::id()));
        std::fs::write(&yaml_path, "min_size_px: 12\n").expect("write yaml");
        let config = import_config(&yaml_path).expect("yaml config");
        assert_eq!(config.min_size_px, 12.0);
        let _ = std::fs::remove_file(&yaml_path);

        let json_path = dir.join(format!("easel-config-{}.json", std::process::id()));
        std::fs::write(&json_path, r#"{"history_limit": 3}"#).expect("write json");
        let config = import_config(&json_path).expect("json config");
        assert_eq!(config.history_limit, 3);
        let _ = std::fs::remove_file(&json_path);

        assert!(import_config(Path::new("config.toml")).is_err());
    }

    #[test]
    fn test_export_then_import_keeps_values() {
        let dir = std::env::temp_dir();
        let config = EngineConfig {
            max_zoom: 8.0,
            fill_by_default: true,
            ..EngineConfig::default()
        };
        for extension in ["yaml", "json"] {
            let path = dir.join(format!("easel-export-{}.{}", std::process::id(), extension));
            export_config(&config, &path).expect("export");
            assert_eq!(import_config(&path).expect("import"), config);
            let _ = std::fs::remove_file(&path);
        }
        assert!(export_config(&config, Path::new("config.toml")).is_err());
    }

    #[test]
    fn test_import_rejects_swapped_zoom_bounds() {
        let path = std::env::temp_dir().join(format!("easel-bad-{}.yaml", std::process::id()));
        std::fs::write(&path, "min_zoom: 30.0\nmax_zoom: 20.0\n").expect("write yaml");
        assert!(import_config(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
