//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// odegen configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Marker macros and prefixes recognized in headers
    pub dialect: Dialect,

    /// Header files or directories containing headers
    pub headers: Vec<PathBuf>,

    /// Output locations
    pub output: OutputConfig,

    /// Name printed in the preamble of generated files
    pub generator_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            headers: Vec::new(),
            output: OutputConfig::default(),
            generator_name: "odegen".into(),
        }
    }
}

impl Config {
    /// Parse configuration from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    ///
    /// Relative header and output paths are resolved against the directory
    /// containing the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &PathBuf| if p.is_relative() { base.join(p) } else { p.clone() };
        self.headers = self.headers.iter().map(resolve).collect();
        self.output.embind_dir = self.output.embind_dir.as_ref().map(resolve);
        self.output.napi_dir = self.output.napi_dir.as_ref().map(resolve);
        self.output.typescript_dir = self.output.typescript_dir.as_ref().map(resolve);
    }

    fn validate(&self) -> Result<()> {
        let d = &self.dialect;
        let required = [
            ("api_marker", &d.api_marker),
            ("handle_marker", &d.handle_marker),
            ("tuple_marker", &d.tuple_marker),
            ("result_type", &d.result_type),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("dialect.{} must not be empty", key)));
            }
        }
        Ok(())
    }
}

/// Marker macro names and prefixes of the header dialect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    /// Marks exported functions and constants
    pub api_marker: String,
    /// Only `#define`s whose name starts with this prefix are collected
    /// (empty: all numeric defines)
    pub define_prefix: String,
    pub handle_marker: String,
    pub tuple_marker: String,
    pub bind_constructor: String,
    pub bind_method: String,
    pub bind_ptr_getter: String,
    pub bind_array_getter: String,
    pub marker_in: String,
    pub marker_out: String,
    /// Accepted spellings of the input/output marker
    pub marker_in_out: Vec<String>,
    pub marker_out_return: String,
    /// Return type of functions reporting a status code
    pub result_type: String,
    /// Prefixes removed from exposed symbol names
    pub symbol_prefixes: Vec<String>,
    /// Namespace prefix stripped from enum values that do not spell the enum name
    pub enum_value_prefix: String,
    /// Prefix of generated accessor helper functions
    pub helper_prefix: String,
    pub const_data_ptr: String,
    pub var_data_ptr: String,
    pub assert_macro: String,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            api_marker: "ODE_API".into(),
            define_prefix: "ODE_".into(),
            handle_marker: "ODE_HANDLE_DECL".into(),
            tuple_marker: "ODE_TUPLE".into(),
            bind_constructor: "ODE_BIND_CONSTRUCTOR".into(),
            bind_method: "ODE_BIND_METHOD".into(),
            bind_ptr_getter: "ODE_BIND_PTR_GETTER".into(),
            bind_array_getter: "ODE_BIND_ARRAY_GETTER".into(),
            marker_in: "ODE_IN".into(),
            marker_out: "ODE_OUT".into(),
            marker_in_out: vec!["ODE_IN_OUT".into(), "ODE_INOUT".into()],
            marker_out_return: "ODE_OUT_RETURN".into(),
            result_type: "ODE_Result".into(),
            symbol_prefixes: vec!["ODE_".into(), "ode_".into()],
            enum_value_prefix: "ODE_".into(),
            helper_prefix: "ode_".into(),
            const_data_ptr: "ODE_ConstDataPtr".into(),
            var_data_ptr: "ODE_VarDataPtr".into(),
            assert_macro: "ODE_ASSERT".into(),
        }
    }
}

impl Dialect {
    /// Remove the first matching symbol prefix
    pub fn remove_prefix<'a>(&self, name: &'a str) -> &'a str {
        self.symbol_prefixes
            .iter()
            .find_map(|prefix| name.strip_prefix(prefix.as_str()))
            .unwrap_or(name)
    }
}

/// Output locations of generated artifacts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for Emscripten bindings (default: next to each header)
    pub embind_dir: Option<PathBuf>,
    /// Directory for N-API glue sources
    pub napi_dir: Option<PathBuf>,
    /// Directory for TypeScript declarations
    pub typescript_dir: Option<PathBuf>,
}
