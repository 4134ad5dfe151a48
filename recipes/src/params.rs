//! Recipe parameters and host settings.
//!
//! Recipes declare enumerated parameters. Host settings are a flat
//! `name -> value` map, optionally read from a YAML or JSON file, and are
//! resolved against the declarations before a run starts.

use std::collections::BTreeMap;
use std::path::Path;

use common::FileFormat;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A parameter whose value is one of a fixed set of alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterEnum {
    pub name: String,
    pub context: String,
    pub description: String,
    pub default: String,
    pub alternatives: Vec<String>,
}

impl ParameterEnum {
    pub fn new<I, S>(
        name: impl Into<String>,
        context: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<String>,
        alternatives: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            context: context.into(),
            description: description.into(),
            default: default.into(),
            alternatives: alternatives.into_iter().map(Into::into).collect(),
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.alternatives.iter().any(|alt| alt == value)
    }
}

/// Parameters declared by one recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterList {
    parameters: Vec<ParameterEnum>,
}

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, parameter: ParameterEnum) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParameterEnum> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParameterEnum> {
        self.parameters.iter()
    }

    /// Resolve `settings` against the declarations.
    ///
    /// Every setting must name a declared parameter and hold one of its
    /// alternatives; declared parameters absent from `settings` take their
    /// default.
    pub fn resolve(&self, settings: &Settings) -> Result<ResolvedParameters> {
        if let Some(unknown) = settings.names().find(|name| self.get(name).is_none()) {
            return Err(Error::UnknownParameter(unknown.to_string()));
        }

        let mut values = BTreeMap::new();
        for parameter in &self.parameters {
            let value = match settings.get(&parameter.name) {
                Some(value) if parameter.accepts(value) => value.to_string(),
                Some(value) => {
                    return Err(Error::InvalidParameterValue {
                        name: parameter.name.clone(),
                        value: value.to_string(),
                        alternatives: parameter.alternatives.clone(),
                    });
                }
                None => parameter.default.clone(),
            };
            tracing::debug!(name = %parameter.name, %value, "Resolved parameter");
            values.insert(parameter.name.clone(), value);
        }

        Ok(ResolvedParameters { values })
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a ParameterEnum;
    type IntoIter = std::slice::Iter<'a, ParameterEnum>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

/// Host-provided parameter values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Parse settings text in `format`.
    pub fn parse(text: &str, format: FileFormat, path: &Path) -> Result<Self> {
        common::deserialize(text, format).map_err(|source| Error::SettingsFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a YAML or JSON settings file; the format follows the extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let format = FileFormat::from_file_name(&path.to_string_lossy())?;
        let text = std::fs::read_to_string(path).map_err(|source| Error::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::parse(&text, format, path)?;
        tracing::info!(path = %path.display(), count = settings.values.len(), "Loaded settings");
        Ok(settings)
    }
}

/// Parameter values of one run, after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedParameters {
    values: BTreeMap<String, String>,
}

impl ResolvedParameters {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render as YAML or JSON, e.g. to record alongside products.
    pub fn to_text(&self, format: FileFormat) -> Result<String> {
        common::serialize(self, format).map_err(|source| Error::SettingsFormat {
            path: "<resolved parameters>".into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use common::test_utils::test_output_path;

    use super::*;

    const METHOD: &str = "metis_det_dark.stacking.method";

    fn declared() -> ParameterList {
        ParameterList::new().with(ParameterEnum::new(
            METHOD,
            "metis_det_dark",
            "Name of the method used to combine the input images",
            "average",
            ["add", "average", "median", "sigclip"],
        ))
    }

    #[test]
    fn missing_settings_take_default() {
        let resolved = declared().resolve(&Settings::new()).unwrap();
        assert_eq!(resolved.get(METHOD), Some("average"));
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn declared_alternative_is_accepted() {
        let resolved = declared()
            .resolve(&Settings::new().with(METHOD, "sigclip"))
            .unwrap();
        assert_eq!(resolved.get(METHOD), Some("sigclip"));
    }

    #[test]
    fn value_outside_alternatives_is_rejected() {
        let err = declared()
            .resolve(&Settings::new().with(METHOD, "mode"))
            .unwrap_err();
        match err {
            Error::InvalidParameterValue {
                name,
                value,
                alternatives,
            } => {
                assert_eq!(name, METHOD);
                assert_eq!(value, "mode");
                assert_eq!(alternatives.len(), 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let err = declared()
            .resolve(&Settings::new().with("metis_det_dark.stacking.kappa", "3"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownParameter(ref n) if n == "metis_det_dark.stacking.kappa"));
    }

    #[test]
    fn settings_from_yaml_and_json_files() {
        let yaml = test_output_path("params_settings.yaml");
        std::fs::write(&yaml, format!("{METHOD}: median\n")).unwrap();
        let settings = Settings::from_file(&yaml).unwrap();
        assert_eq!(settings.get(METHOD), Some("median"));

        let json = test_output_path("params_settings.json");
        std::fs::write(&json, format!("{{\"{METHOD}\": \"add\"}}")).unwrap();
        let settings = Settings::from_file(&json).unwrap();
        assert_eq!(settings.get(METHOD), Some("add"));
    }

    #[test]
    fn settings_file_errors() {
        let missing = test_output_path("params_missing.yaml");
        let _ = std::fs::remove_file(&missing);
        assert!(matches!(
            Settings::from_file(&missing),
            Err(Error::SettingsIo { .. })
        ));

        assert!(matches!(
            Settings::from_file(Path::new("settings.toml")),
            Err(Error::SettingsExtension(_))
        ));

        let broken = test_output_path("params_broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            Settings::from_file(&broken),
            Err(Error::SettingsFormat { .. })
        ));
    }

    #[test]
    fn resolved_parameters_render_as_yaml() {
        let resolved = declared().resolve(&Settings::new()).unwrap();
        let text = resolved.to_text(FileFormat::Yaml).unwrap();
        assert_eq!(text, format!("{METHOD}: average\n"));
    }
}
