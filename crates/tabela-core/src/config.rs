//! Export configuration (`config.toml`).
//!
//! Every field is optional in the file; missing fields fall back to the
//! built-in look of exported workbooks.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TabelaError};

const MAX_CONFIG_FILE_BYTES: u64 = 65_536; // 64 KiB
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub sheet_name: String,
    /// Width applied to every exported column, in character units.
    pub column_width: f64,
    pub font_name: String,
    pub header_font_color: String,
    pub header_fill: String,
    /// Fill of every other data row.
    pub stripe_fill: String,
    /// File name stem used when the caller supplies none.
    pub default_stem: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            sheet_name: "Planilha".to_string(),
            column_width: 20.0,
            font_name: "Calibri".to_string(),
            header_font_color: "#FFFFFF".to_string(),
            header_fill: "#4F81BD".to_string(),
            stripe_fill: "#EDEDED".to_string(),
            default_stem: "tabela".to_string(),
        }
    }
}

/// Colours resolved from an [`ExportConfig`], as `0xRRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub header_font: u32,
    pub header_fill: u32,
    pub stripe_fill: u32,
}

impl ExportConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve and check the configured colours.
    pub fn palette(&self) -> Result<Palette> {
        Ok(Palette {
            header_font: parse_color("header_font_color", &self.header_font_color)?,
            header_fill: parse_color("header_fill", &self.header_fill)?,
            stripe_fill: parse_color("stripe_fill", &self.stripe_fill)?,
        })
    }

    /// Check every field an export depends on.
    pub fn validate(&self) -> Result<Palette> {
        if self.sheet_name.trim().is_empty() {
            return Err(TabelaError::Config("sheet_name must not be empty".to_string()));
        }
        if !self.column_width.is_finite() || self.column_width <= 0.0 {
            return Err(TabelaError::Config(format!(
                "column_width must be a positive number, got {}",
                self.column_width
            )));
        }
        self.palette()
    }
}

/// Parse `#RRGGBB` (the `#` is optional) into `0xRRGGBB`.
pub fn parse_color(field: &str, value: &str) -> Result<u32> {
    let hex = value.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TabelaError::Config(format!(
            "{} must look like #RRGGBB, got '{}'",
            field, value
        )));
    }
    u32::from_str_radix(hex, 16)
        .map_err(|err| TabelaError::Config(format!("{}: {}", field, err)))
}

/// Load the export configuration.
///
/// `config_file` overrides the per-user `tabela/config.toml`. Problems never
/// fail the load: they fall back to defaults and come back as warnings.
pub fn load_config(config_file: Option<&Path>) -> (ExportConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let config_path = config_file.map(Path::to_path_buf).or_else(user_config_path);

    let Some(path) = config_path.as_ref() else {
        return (ExportConfig::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (ExportConfig::default(), warnings);
    }

    let config = match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(path) {
            Ok(content) => match ExportConfig::from_toml(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    (config.unwrap_or_default(), warnings)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tabela")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push(CONFIG_FILE_NAME);
    Some(path)
}
