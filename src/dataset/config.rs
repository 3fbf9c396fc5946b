/*!
 * Dataset configuration (section -> key -> value)
 *
 * Built from the remote `metadata` object. A `filtering` section is always
 * present so that filters can be configured before they are applied.
 */

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

use super::parse::{fbool, fint, fintlist, lcstr};
use crate::error::{DcorError, Result};

/// One configuration section
pub type Section = Map<String, Value>;

/// Name of the section holding filter settings
pub const FILTERING: &str = "filtering";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Configuration {
    sections: BTreeMap<String, Section>,
}

impl Configuration {
    /// Build from a raw metadata object
    pub fn new(metadata: &Value) -> Result<Self> {
        let object = metadata.as_object().ok_or_else(|| {
            DcorError::Config(format!("Metadata must be an object, got {}", metadata))
        })?;

        let mut sections = BTreeMap::new();
        for (name, section) in object {
            match section.as_object() {
                Some(section) => {
                    sections.insert(name.clone(), section.clone());
                }
                None => warn!(section = %name, "Ignoring non-object metadata section"),
            }
        }

        let mut config = Self { sections };
        config.insert_filtering_defaults();
        Ok(config)
    }

    fn insert_filtering_defaults(&mut self) {
        let filtering = self.section_mut(FILTERING);
        filtering
            .entry("enable filters")
            .or_insert(Value::Bool(true));
        filtering
            .entry("remove invalid events")
            .or_insert(Value::Bool(false));
        filtering.entry("limit events").or_insert(Value::from(0));
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Mutable section, created when missing
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        self.sections.entry(name.to_string()).or_default()
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn contains(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.sections.get(section).and_then(|s| s.get(key))
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<Value>) {
        self.section_mut(section).insert(key.to_string(), value.into());
    }

    fn require(&self, section: &str, key: &str) -> Result<&Value> {
        self.get(section, key).ok_or_else(|| {
            DcorError::Config(format!(
                "Missing configuration key '{}' in section [{}]",
                key, section
            ))
        })
    }

    /// Value as text (strings verbatim, everything else in JSON notation)
    pub fn get_str(&self, section: &str, key: &str) -> Result<String> {
        Ok(match self.require(section, key)? {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn get_lower_str(&self, section: &str, key: &str) -> Result<String> {
        lcstr(self.require(section, key)?)
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool> {
        fbool(self.require(section, key)?)
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<i64> {
        fint(self.require(section, key)?)
    }

    pub fn get_int_list(&self, section: &str, key: &str) -> Result<Vec<i64>> {
        fintlist(self.require(section, key)?)
    }

    pub fn get_f64(&self, section: &str, key: &str) -> Result<f64> {
        let value = self.require(section, key)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| DcorError::Config(format!("Cannot convert {} to float", value)))
    }

    /// Display title, `"<sample> - M<run index>"`
    pub fn title(&self) -> Result<String> {
        let sample = self.get_str("experiment", "sample")?;
        let run = self.get_int("experiment", "run index")?;
        Ok(format!("{} - M{}", sample, run))
    }
}
