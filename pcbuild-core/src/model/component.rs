//! Component classes and their typed specifications.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The slots a build is made of.
///
/// Declaration order is the canonical order used for affected sets, history
/// records, and every other ordered listing of classes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ComponentClass {
    Cpu,
    Gpu,
    Motherboard,
    Ram,
    Storage,
    Psu,
    Cooling,
    Chassis,
    Peripheral,
}

impl ComponentClass {
    /// Every class, in canonical order.
    pub const ALL: [ComponentClass; 9] = [
        Self::Cpu,
        Self::Gpu,
        Self::Motherboard,
        Self::Ram,
        Self::Storage,
        Self::Psu,
        Self::Cooling,
        Self::Chassis,
        Self::Peripheral,
    ];

    /// Classes a build cannot exist without. GPU is conditional on the CPU's
    /// integrated graphics and peripherals are zero-or-more.
    pub const REQUIRED: [ComponentClass; 7] = [
        Self::Cpu,
        Self::Motherboard,
        Self::Ram,
        Self::Storage,
        Self::Psu,
        Self::Cooling,
        Self::Chassis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::Motherboard => "motherboard",
            Self::Ram => "ram",
            Self::Storage => "storage",
            Self::Psu => "psu",
            Self::Cooling => "cooling",
            Self::Chassis => "chassis",
            Self::Peripheral => "peripheral",
        }
    }
}

impl std::fmt::Display for ComponentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Case size classes a user can ask for.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ChassisSize {
    MiniItx,
    MicroAtx,
    #[default]
    MidTower,
    FullTower,
}

impl ChassisSize {
    /// Classify a free-form chassis form factor string as found in parts
    /// listings ("ATX Mid Tower", "Mini-ITX", "mATX", "Full-Tower").
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        if normalized.contains("full") {
            Some(Self::FullTower)
        } else if normalized.contains("mid") {
            Some(Self::MidTower)
        } else if normalized.contains("micro") || normalized.contains("matx") {
            Some(Self::MicroAtx)
        } else if normalized.contains("mini") || normalized.contains("itx") {
            Some(Self::MiniItx)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ChassisSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MiniItx => write!(f, "mini-itx"),
            Self::MicroAtx => write!(f, "micro-atx"),
            Self::MidTower => write!(f, "mid-tower"),
            Self::FullTower => write!(f, "full-tower"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CpuSpec {
    pub model: String,
    pub brand: String,
    /// e.g. "AM5", "LGA1700"
    pub socket: String,
    pub cores: u32,
    pub threads: u32,
    pub base_clock_ghz: f64,
    #[serde(default)]
    pub boost_clock_ghz: Option<f64>,
    pub tdp_w: u32,
    #[serde(default)]
    pub integrated_graphics: bool,
    pub price_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GpuSpec {
    pub model: String,
    pub brand: String,
    pub chipset: String,
    pub vram_gb: u32,
    pub vram_type: String,
    pub tdp_w: u32,
    #[serde(default)]
    pub length_mm: Option<u32>,
    #[serde(default = "default_gpu_slots")]
    pub pcie_slots: u8,
    #[serde(default)]
    pub power_connectors: Option<String>,
    pub price_usd: f64,
}

fn default_gpu_slots() -> u8 {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MotherboardSpec {
    pub model: String,
    pub chipset: String,
    pub socket: String,
    /// "Mini-ITX", "Micro-ATX", "ATX", "E-ATX"
    pub form_factor: String,
    /// "DDR4" or "DDR5"
    pub ram_type: String,
    pub ram_slots: u32,
    pub max_ram_gb: u32,
    pub m2_slots: u32,
    pub sata_ports: u32,
    pub price_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RamSpec {
    pub capacity_gb: u32,
    #[serde(rename = "type")]
    pub memory_type: String,
    pub speed_mhz: u32,
    pub modules: u32,
    #[serde(default)]
    pub cas_latency: Option<u32>,
    pub price_usd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Nvme,
    Ssd,
    Hdd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StorageSpec {
    #[serde(rename = "type")]
    pub kind: StorageKind,
    pub capacity_tb: f64,
    #[serde(default)]
    pub interface: Option<String>,
    pub price_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PsuSpec {
    pub model: String,
    pub wattage: u32,
    /// "80+ Bronze", "80+ Gold", ...
    pub efficiency: String,
    /// "full", "semi", "non"
    pub modular: String,
    /// PCIe power leads by connector name, e.g. {"8-pin": 2, "12VHPWR": 1}.
    /// Absent when the listing does not say.
    #[serde(default)]
    pub pcie_connectors: Option<BTreeMap<String, u32>>,
    pub price_usd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CoolingType {
    Air,
    #[serde(alias = "liquid")]
    Aio,
    Custom,
}

impl std::fmt::Display for CoolingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Air => write!(f, "air"),
            Self::Aio => write!(f, "aio"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CoolingSpec {
    #[serde(rename = "type")]
    pub kind: CoolingType,
    pub model: String,
    /// Highest CPU TDP the cooler is rated for.
    pub tdp_rating_w: u32,
    #[serde(default)]
    pub height_mm: Option<u32>,
    #[serde(default)]
    pub radiator_size_mm: Option<u32>,
    #[serde(default = "default_fan_count")]
    pub fan_count: u32,
    #[serde(default)]
    pub noise_level_db: Option<f64>,
    pub price_usd: f64,
}

fn default_fan_count() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChassisSpec {
    pub model: String,
    /// "Mini-ITX", "Micro-ATX", "Mid-Tower", "Full-Tower"
    pub form_factor: String,
    pub motherboard_support: Vec<String>,
    #[serde(default)]
    pub max_gpu_length_mm: Option<u32>,
    #[serde(default)]
    pub max_cpu_cooler_height_mm: Option<u32>,
    #[serde(default)]
    pub radiator_support: Vec<u32>,
    #[serde(default)]
    pub included_fans: u32,
    pub price_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PeripheralSpec {
    /// "monitor", "keyboard", "mouse", "headphones", "speakers"
    #[serde(rename = "type")]
    pub kind: String,
    pub model: String,
    pub price_usd: f64,
}

/// One component of any class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum ComponentSpec {
    Cpu(CpuSpec),
    Gpu(GpuSpec),
    Motherboard(MotherboardSpec),
    Ram(RamSpec),
    Storage(StorageSpec),
    Psu(PsuSpec),
    Cooling(CoolingSpec),
    Chassis(ChassisSpec),
    Peripheral(PeripheralSpec),
}

impl ComponentSpec {
    pub fn class(&self) -> ComponentClass {
        match self {
            Self::Cpu(_) => ComponentClass::Cpu,
            Self::Gpu(_) => ComponentClass::Gpu,
            Self::Motherboard(_) => ComponentClass::Motherboard,
            Self::Ram(_) => ComponentClass::Ram,
            Self::Storage(_) => ComponentClass::Storage,
            Self::Psu(_) => ComponentClass::Psu,
            Self::Cooling(_) => ComponentClass::Cooling,
            Self::Chassis(_) => ComponentClass::Chassis,
            Self::Peripheral(_) => ComponentClass::Peripheral,
        }
    }

    pub fn price_usd(&self) -> f64 {
        match self {
            Self::Cpu(c) => c.price_usd,
            Self::Gpu(c) => c.price_usd,
            Self::Motherboard(c) => c.price_usd,
            Self::Ram(c) => c.price_usd,
            Self::Storage(c) => c.price_usd,
            Self::Psu(c) => c.price_usd,
            Self::Cooling(c) => c.price_usd,
            Self::Chassis(c) => c.price_usd,
            Self::Peripheral(c) => c.price_usd,
        }
    }

    /// Model name used for catalog lookups. RAM and storage have no model
    /// string, so a descriptive label is synthesised for them.
    pub fn label(&self) -> String {
        match self {
            Self::Cpu(c) => c.model.clone(),
            Self::Gpu(c) => c.model.clone(),
            Self::Motherboard(c) => c.model.clone(),
            Self::Ram(c) => format!("{}GB {} {}MHz", c.capacity_gb, c.memory_type, c.speed_mhz),
            Self::Storage(c) => format!("{}TB {:?}", c.capacity_tb, c.kind),
            Self::Psu(c) => c.model.clone(),
            Self::Cooling(c) => c.model.clone(),
            Self::Chassis(c) => c.model.clone(),
            Self::Peripheral(c) => c.model.clone(),
        }
    }

    pub(crate) fn set_price(&mut self, price_usd: f64) {
        match self {
            Self::Cpu(c) => c.price_usd = price_usd,
            Self::Gpu(c) => c.price_usd = price_usd,
            Self::Motherboard(c) => c.price_usd = price_usd,
            Self::Ram(c) => c.price_usd = price_usd,
            Self::Storage(c) => c.price_usd = price_usd,
            Self::Psu(c) => c.price_usd = price_usd,
            Self::Cooling(c) => c.price_usd = price_usd,
            Self::Chassis(c) => c.price_usd = price_usd,
            Self::Peripheral(c) => c.price_usd = price_usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chassis_size_parse_loose() {
        assert_eq!(
            ChassisSize::parse_loose("ATX Mid Tower"),
            Some(ChassisSize::MidTower)
        );
        assert_eq!(
            ChassisSize::parse_loose("Mid-Tower"),
            Some(ChassisSize::MidTower)
        );
        assert_eq!(
            ChassisSize::parse_loose("Full-Tower"),
            Some(ChassisSize::FullTower)
        );
        assert_eq!(ChassisSize::parse_loose("mATX"), Some(ChassisSize::MicroAtx));
        assert_eq!(
            ChassisSize::parse_loose("Micro-ATX Mini Tower"),
            Some(ChassisSize::MicroAtx)
        );
        assert_eq!(ChassisSize::parse_loose("Mini-ITX"), Some(ChassisSize::MiniItx));
        assert_eq!(ChassisSize::parse_loose("Cube"), None);
    }

    #[test]
    fn test_component_class_order_is_canonical() {
        let mut shuffled = vec![
            ComponentClass::Chassis,
            ComponentClass::Cpu,
            ComponentClass::Psu,
            ComponentClass::Gpu,
        ];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![
                ComponentClass::Cpu,
                ComponentClass::Gpu,
                ComponentClass::Psu,
                ComponentClass::Chassis
            ]
        );
    }

    #[test]
    fn test_component_spec_tagged_serialization() {
        let spec = ComponentSpec::Psu(PsuSpec {
            model: "Corsair RM750e".into(),
            wattage: 750,
            efficiency: "80+ Gold".into(),
            modular: "full".into(),
            pcie_connectors: None,
            price_usd: 109.99,
        });
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["class"], "psu");
        assert_eq!(json["wattage"], 750);

        let back: ComponentSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back.class(), ComponentClass::Psu);
    }

    #[test]
    fn test_liquid_alias_maps_to_aio() {
        let kind: CoolingType = serde_json::from_str("\"liquid\"").unwrap();
        assert_eq!(kind, CoolingType::Aio);
    }
}
