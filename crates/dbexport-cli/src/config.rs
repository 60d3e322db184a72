use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use dbexport_core::ExportSettings;

const DEFAULT_CONFIG_FILE: &str = "dbexport.toml";

/// Load settings from an optional file plus `DBEXPORT__*` environment
/// overrides, e.g. `DBEXPORT__DIALECT__SCHEMA=dpbk_prd.02_silver`.
///
/// An explicitly given file must exist; the default `dbexport.toml` is only
/// read when present.
pub fn load_settings(path: Option<&Path>) -> Result<ExportSettings> {
    let mut builder = Config::builder();
    match path {
        Some(p) => {
            builder = builder.add_source(File::from(p.to_path_buf()).required(true));
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path));
            }
        }
    }
    builder = builder.add_source(
        Environment::with_prefix("DBEXPORT")
            .try_parsing(true)
            .separator("__"),
    );

    let settings: ExportSettings = builder
        .build()
        .context("Failed to read settings")?
        .try_deserialize()
        .context("Invalid settings")?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = settings_file(
            r#"
log_level = "debug"
skip_catalogs = ["brk"]

[dialect]
schema = "dpbk_prd.02_silver"
"#,
        );
        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.skip_catalogs, vec!["brk"]);
        assert_eq!(settings.dialect.schema, "dpbk_prd.02_silver");
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let file = settings_file("[dialect]\nschema = \"dpbk..silver\"\n");
        let err = load_settings(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("empty segment"));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(load_settings(Some(&path)).is_err());
    }
}
