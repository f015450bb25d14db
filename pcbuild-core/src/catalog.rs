//! Read-only parts catalog.
//!
//! Loaded once at startup and shared between sessions behind an `Arc`.
//! Nothing here takes `&mut self` after construction, so concurrent sessions
//! read it without locking.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::CatalogError;
use crate::model::{ComponentClass, ComponentSpec};

/// A CPU socket and the memory generations its platform supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub socket: String,
    pub memory_types: Vec<String>,
}

impl Platform {
    pub fn new(socket: &str, memory_types: &[&str]) -> Self {
        Self {
            socket: socket.to_string(),
            memory_types: memory_types.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn supports_memory(&self, memory_type: &str) -> bool {
        self.memory_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(memory_type))
    }
}

/// Sockets known without a catalog file.
fn builtin_platforms() -> Vec<Platform> {
    vec![
        Platform::new("AM4", &["DDR4"]),
        Platform::new("AM5", &["DDR5"]),
        Platform::new("LGA1200", &["DDR4"]),
        Platform::new("LGA1700", &["DDR4", "DDR5"]),
        Platform::new("LGA1851", &["DDR5"]),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct PartsCatalog {
    platforms: Vec<Platform>,
    parts: BTreeMap<ComponentClass, Vec<ComponentSpec>>,
}

impl PartsCatalog {
    /// Platform table only, no parts.
    pub fn builtin() -> Self {
        Self {
            platforms: builtin_platforms(),
            parts: BTreeMap::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            platforms = catalog.platforms.len(),
            parts = catalog.len(),
            "Loaded parts catalog"
        );
        Ok(catalog)
    }

    /// Parse a catalog document.
    ///
    /// Sections are named after component classes. Each entry may carry its
    /// price as `price_usd` (number) or as scraped `price: ["USD", "229.99"]`.
    /// Entries priced exactly zero are listing artifacts and are dropped.
    /// Platforms declared in the document override the built-in table by
    /// socket.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let doc: BTreeMap<String, Value> = serde_json::from_str(json)?;
        let mut catalog = Self::builtin();
        let mut dropped = 0usize;

        for (section, value) in doc {
            if section == "platforms" {
                let declared: Vec<Platform> = serde_json::from_value(value)?;
                for platform in declared {
                    catalog
                        .platforms
                        .retain(|p| !p.socket.eq_ignore_ascii_case(&platform.socket));
                    catalog.platforms.push(platform);
                }
                continue;
            }

            let class = section_class(&section)
                .ok_or_else(|| CatalogError::UnknownSection(section.clone()))?;
            let entries = match value {
                Value::Array(entries) => entries,
                _ => {
                    return Err(CatalogError::Entry {
                        section,
                        index: 0,
                        reason: "section must be an array".to_string(),
                    })
                }
            };

            let slot = catalog.parts.entry(class).or_default();
            for (index, entry) in entries.into_iter().enumerate() {
                match parse_entry(class, entry) {
                    Ok(Some(spec)) => slot.push(spec),
                    Ok(None) => dropped += 1,
                    Err(reason) => {
                        return Err(CatalogError::Entry {
                            section,
                            index,
                            reason,
                        })
                    }
                }
            }
        }

        if dropped > 0 {
            debug!(dropped, "Dropped zero-priced catalog entries");
        }
        Ok(catalog)
    }

    pub fn platform(&self, socket: &str) -> Option<&Platform> {
        self.platforms
            .iter()
            .find(|p| p.socket.eq_ignore_ascii_case(socket))
    }

    /// Memory types for a socket, if the socket is known.
    pub fn supported_memory_types(&self, socket: &str) -> Option<&[String]> {
        self.platform(socket).map(|p| p.memory_types.as_slice())
    }

    pub fn parts(&self, class: ComponentClass) -> &[ComponentSpec] {
        self.parts.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Case-insensitive lookup by model name (or synthesised label).
    pub fn find(&self, class: ComponentClass, model: &str) -> Option<&ComponentSpec> {
        self.parts(class)
            .iter()
            .find(|spec| spec.label().eq_ignore_ascii_case(model))
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Total number of parts across all classes.
    pub fn len(&self) -> usize {
        self.parts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn section_class(section: &str) -> Option<ComponentClass> {
    ComponentClass::ALL
        .iter()
        .copied()
        .find(|class| class.as_str() == section || format!("{}s", class.as_str()) == section)
}

/// Returns `Ok(None)` for zero-priced entries.
fn parse_entry(class: ComponentClass, entry: Value) -> Result<Option<ComponentSpec>, String> {
    let mut object = match entry {
        Value::Object(object) => object,
        other => return Err(format!("expected an object, got {other}")),
    };

    let price = match (object.remove("price"), object.get("price_usd")) {
        (_, Some(existing)) => existing
            .as_f64()
            .ok_or_else(|| format!("price_usd is not a number: {existing}"))?,
        (Some(raw), None) => parse_price(&raw)?,
        (None, None) => return Err("entry has no price".to_string()),
    };
    if price == 0.0 {
        return Ok(None);
    }

    object.insert("price_usd".to_string(), Value::from(price));
    object.insert("class".to_string(), Value::from(class.as_str()));

    let mut spec: ComponentSpec =
        serde_json::from_value(Value::Object(object)).map_err(|e| e.to_string())?;
    spec.set_price(price);
    Ok(Some(spec))
}

/// Accepts `229.99`, `"229.99"`, or `["USD", "229.99"]`.
fn parse_price(raw: &Value) -> Result<f64, String> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) => items
            .get(1)
            .and_then(|v| match v {
                Value::String(s) => s.trim().parse().ok(),
                Value::Number(n) => n.as_f64(),
                _ => None,
            }),
        _ => None,
    };
    match parsed {
        Some(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(format!("unrecognised price {raw}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "platforms": [{"socket": "AM5", "memory_types": ["DDR5"]},
                      {"socket": "TR5", "memory_types": ["DDR5"]}],
        "cpu": [
            {"model": "Ryzen 5 7600", "brand": "amd", "socket": "AM5", "cores": 6,
             "threads": 12, "base_clock_ghz": 3.8, "tdp_w": 65,
             "integrated_graphics": true, "price": ["USD", "229.99"]},
            {"model": "Ryzen 5 7500F", "brand": "amd", "socket": "AM5", "cores": 6,
             "threads": 12, "base_clock_ghz": 3.7, "tdp_w": 65,
             "price": ["USD", "0.00"]}
        ],
        "psus": [
            {"model": "Corsair RM750e", "wattage": 750, "efficiency": "80+ Gold",
             "modular": "full", "price_usd": 109.99}
        ]
    }"#;

    #[test]
    fn builtin_platforms_cover_common_sockets() {
        let catalog = PartsCatalog::builtin();
        assert_eq!(
            catalog.supported_memory_types("lga1700"),
            Some(&["DDR4".to_string(), "DDR5".to_string()][..])
        );
        assert!(catalog.platform("AM4").unwrap().supports_memory("ddr4"));
        assert!(catalog.platform("LGA775").is_none());
        assert!(catalog.is_empty());
    }

    #[test]
    fn loads_scraped_prices_and_drops_zero_priced() {
        let catalog = PartsCatalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.parts(ComponentClass::Cpu).len(), 1);
        assert_eq!(catalog.parts(ComponentClass::Psu).len(), 1);
        let cpu = catalog
            .find(ComponentClass::Cpu, "ryzen 5 7600")
            .expect("cpu present");
        assert!((cpu.price_usd() - 229.99).abs() < 1e-9);
        assert!(catalog.find(ComponentClass::Cpu, "Ryzen 5 7500F").is_none());
    }

    #[test]
    fn declared_platforms_extend_builtin() {
        let catalog = PartsCatalog::from_json_str(SAMPLE).unwrap();
        assert!(catalog.platform("TR5").is_some());
        assert!(catalog.platform("LGA1851").is_some());
        assert_eq!(
            catalog
                .platforms()
                .iter()
                .filter(|p| p.socket == "AM5")
                .count(),
            1
        );
    }

    #[test]
    fn unknown_section_is_rejected() {
        let err = PartsCatalog::from_json_str(r#"{"fans": []}"#).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownSection(s) if s == "fans"));
    }

    #[test]
    fn bad_entry_reports_position() {
        let err = PartsCatalog::from_json_str(
            r#"{"psu": [{"model": "X", "wattage": "lots", "efficiency": "80+",
                          "modular": "non", "price_usd": 50.0}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Entry { index: 0, .. }));
    }

    #[test]
    fn price_forms() {
        assert_eq!(parse_price(&serde_json::json!(12.5)), Ok(12.5));
        assert_eq!(parse_price(&serde_json::json!("99.90")), Ok(99.9));
        assert_eq!(parse_price(&serde_json::json!(["USD", "0.00"])), Ok(0.0));
        assert!(parse_price(&serde_json::json!(["USD"])).is_err());
    }
}
