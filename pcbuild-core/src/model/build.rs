//! Candidate builds.
//!
//! [`BuildDraft`] is what a planner hands back: every section optional, no
//! guarantees. [`Build`] is the checked form. The only way to get a `Build`
//! is `Build::try_from(draft)`, which reports every missing class and every
//! invalid attribute in one [`StructuralFailure`].

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::component::{
    ChassisSpec, ComponentClass, ComponentSpec, CoolingSpec, CpuSpec, GpuSpec, MotherboardSpec,
    PeripheralSpec, PsuSpec, RamSpec, StorageSpec,
};

/// Planner output before structural checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BuildDraft {
    #[serde(default)]
    pub cpu: Option<CpuSpec>,
    #[serde(default)]
    pub gpu: Option<GpuSpec>,
    #[serde(default)]
    pub motherboard: Option<MotherboardSpec>,
    #[serde(default)]
    pub ram: Option<RamSpec>,
    #[serde(default)]
    pub storage: Vec<StorageSpec>,
    #[serde(default)]
    pub psu: Option<PsuSpec>,
    #[serde(default)]
    pub cooling: Option<CoolingSpec>,
    #[serde(default)]
    pub chassis: Option<ChassisSpec>,
    #[serde(default)]
    pub peripherals: Vec<PeripheralSpec>,
    /// Case fans beyond the ones the chassis ships with.
    #[serde(default)]
    pub case_fans: u32,
}

/// A draft that cannot be validated.
///
/// Never a rule outcome: it short-circuits the session before any rule runs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("structurally incomplete build: {}", self.describe())]
pub struct StructuralFailure {
    /// Required classes with no component.
    pub missing: Vec<ComponentClass>,
    /// Present components with out-of-range attributes.
    pub invalid: Vec<String>,
}

impl StructuralFailure {
    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            let names: Vec<&str> = self.missing.iter().map(|c| c.as_str()).collect();
            parts.push(format!("missing [{}]", names.join(", ")));
        }
        if !self.invalid.is_empty() {
            parts.push(format!("invalid [{}]", self.invalid.join("; ")));
        }
        parts.join(", ")
    }
}

/// A fully-specified build. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BuildDraft")]
pub struct Build {
    cpu: CpuSpec,
    gpu: Option<GpuSpec>,
    motherboard: MotherboardSpec,
    ram: RamSpec,
    storage: Vec<StorageSpec>,
    psu: PsuSpec,
    cooling: CoolingSpec,
    chassis: ChassisSpec,
    peripherals: Vec<PeripheralSpec>,
    case_fans: u32,
    estimated_cost_usd: f64,
}

impl TryFrom<BuildDraft> for Build {
    type Error = StructuralFailure;

    fn try_from(draft: BuildDraft) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let mut invalid = Vec::new();

        if draft.cpu.is_none() {
            missing.push(ComponentClass::Cpu);
        }
        if draft.motherboard.is_none() {
            missing.push(ComponentClass::Motherboard);
        }
        if draft.ram.is_none() {
            missing.push(ComponentClass::Ram);
        }
        if draft.storage.is_empty() {
            missing.push(ComponentClass::Storage);
        }
        if draft.psu.is_none() {
            missing.push(ComponentClass::Psu);
        }
        if draft.cooling.is_none() {
            missing.push(ComponentClass::Cooling);
        }
        if draft.chassis.is_none() {
            missing.push(ComponentClass::Chassis);
        }

        check_attributes(&draft, &mut invalid);

        match draft {
            BuildDraft {
                cpu: Some(cpu),
                gpu,
                motherboard: Some(motherboard),
                ram: Some(ram),
                storage,
                psu: Some(psu),
                cooling: Some(cooling),
                chassis: Some(chassis),
                peripherals,
                case_fans,
            } if missing.is_empty() && invalid.is_empty() => {
                let mut build = Build {
                    cpu,
                    gpu,
                    motherboard,
                    ram,
                    storage,
                    psu,
                    cooling,
                    chassis,
                    peripherals,
                    case_fans,
                    estimated_cost_usd: 0.0,
                };
                build.estimated_cost_usd = build.components().iter().map(|c| c.price_usd()).sum();
                Ok(build)
            }
            _ => Err(StructuralFailure { missing, invalid }),
        }
    }
}

fn check_price(label: &str, price: f64, invalid: &mut Vec<String>) {
    if !price.is_finite() || price < 0.0 {
        invalid.push(format!("{label}: price {price} is not a valid amount"));
    }
}

fn check_positive(label: &str, field: &str, value: u32, invalid: &mut Vec<String>) {
    if value == 0 {
        invalid.push(format!("{label}: {field} must be positive"));
    }
}

fn check_attributes(draft: &BuildDraft, invalid: &mut Vec<String>) {
    if let Some(cpu) = &draft.cpu {
        check_positive("cpu", "tdp_w", cpu.tdp_w, invalid);
        check_positive("cpu", "cores", cpu.cores, invalid);
        check_price("cpu", cpu.price_usd, invalid);
    }
    if let Some(gpu) = &draft.gpu {
        check_positive("gpu", "tdp_w", gpu.tdp_w, invalid);
        check_price("gpu", gpu.price_usd, invalid);
    }
    if let Some(mb) = &draft.motherboard {
        check_positive("motherboard", "ram_slots", mb.ram_slots, invalid);
        check_positive("motherboard", "max_ram_gb", mb.max_ram_gb, invalid);
        check_price("motherboard", mb.price_usd, invalid);
    }
    if let Some(ram) = &draft.ram {
        check_positive("ram", "capacity_gb", ram.capacity_gb, invalid);
        check_positive("ram", "modules", ram.modules, invalid);
        check_price("ram", ram.price_usd, invalid);
    }
    for (i, drive) in draft.storage.iter().enumerate() {
        if !drive.capacity_tb.is_finite() || drive.capacity_tb <= 0.0 {
            invalid.push(format!("storage[{i}]: capacity_tb must be positive"));
        }
        check_price(&format!("storage[{i}]"), drive.price_usd, invalid);
    }
    if let Some(psu) = &draft.psu {
        check_positive("psu", "wattage", psu.wattage, invalid);
        check_price("psu", psu.price_usd, invalid);
    }
    if let Some(cooling) = &draft.cooling {
        check_positive("cooling", "tdp_rating_w", cooling.tdp_rating_w, invalid);
        check_price("cooling", cooling.price_usd, invalid);
    }
    if let Some(chassis) = &draft.chassis {
        if chassis.motherboard_support.is_empty() {
            invalid.push("chassis: motherboard_support must not be empty".to_string());
        }
        check_price("chassis", chassis.price_usd, invalid);
    }
    for (i, p) in draft.peripherals.iter().enumerate() {
        check_price(&format!("peripheral[{i}]"), p.price_usd, invalid);
    }
}

impl Build {
    pub fn cpu(&self) -> &CpuSpec {
        &self.cpu
    }

    pub fn gpu(&self) -> Option<&GpuSpec> {
        self.gpu.as_ref()
    }

    pub fn motherboard(&self) -> &MotherboardSpec {
        &self.motherboard
    }

    pub fn ram(&self) -> &RamSpec {
        &self.ram
    }

    pub fn storage(&self) -> &[StorageSpec] {
        &self.storage
    }

    pub fn psu(&self) -> &PsuSpec {
        &self.psu
    }

    pub fn cooling(&self) -> &CoolingSpec {
        &self.cooling
    }

    pub fn chassis(&self) -> &ChassisSpec {
        &self.chassis
    }

    pub fn peripherals(&self) -> &[PeripheralSpec] {
        &self.peripherals
    }

    pub fn case_fans(&self) -> u32 {
        self.case_fans
    }

    /// Sum of all component prices.
    pub fn estimated_cost_usd(&self) -> f64 {
        self.estimated_cost_usd
    }

    /// Convert back into a draft, the starting point for a revised build.
    pub fn to_draft(&self) -> BuildDraft {
        BuildDraft {
            cpu: Some(self.cpu.clone()),
            gpu: self.gpu.clone(),
            motherboard: Some(self.motherboard.clone()),
            ram: Some(self.ram.clone()),
            storage: self.storage.clone(),
            psu: Some(self.psu.clone()),
            cooling: Some(self.cooling.clone()),
            chassis: Some(self.chassis.clone()),
            peripherals: self.peripherals.clone(),
            case_fans: self.case_fans,
        }
    }

    /// Every component, in canonical class order.
    pub fn components(&self) -> Vec<ComponentSpec> {
        ComponentClass::ALL
            .iter()
            .flat_map(|class| self.section(*class))
            .collect()
    }

    /// The components occupying one class slot (zero or more).
    pub fn section(&self, class: ComponentClass) -> Vec<ComponentSpec> {
        match class {
            ComponentClass::Cpu => vec![ComponentSpec::Cpu(self.cpu.clone())],
            ComponentClass::Gpu => self.gpu.iter().cloned().map(ComponentSpec::Gpu).collect(),
            ComponentClass::Motherboard => {
                vec![ComponentSpec::Motherboard(self.motherboard.clone())]
            }
            ComponentClass::Ram => vec![ComponentSpec::Ram(self.ram.clone())],
            ComponentClass::Storage => self
                .storage
                .iter()
                .cloned()
                .map(ComponentSpec::Storage)
                .collect(),
            ComponentClass::Psu => vec![ComponentSpec::Psu(self.psu.clone())],
            ComponentClass::Cooling => vec![ComponentSpec::Cooling(self.cooling.clone())],
            ComponentClass::Chassis => vec![ComponentSpec::Chassis(self.chassis.clone())],
            ComponentClass::Peripheral => self
                .peripherals
                .iter()
                .cloned()
                .map(ComponentSpec::Peripheral)
                .collect(),
        }
    }

    /// Canonical serialized form of one class slot. Two builds hold the same
    /// component in a slot iff their fingerprints are byte-identical.
    pub fn fingerprint(&self, class: ComponentClass) -> String {
        serde_json::to_string(&self.section(class)).unwrap_or_default()
    }

    /// Classes whose fingerprint differs between `self` and `other`.
    pub fn changed_classes(&self, other: &Build) -> BTreeSet<ComponentClass> {
        ComponentClass::ALL
            .iter()
            .copied()
            .filter(|class| self.fingerprint(*class) != other.fingerprint(*class))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::component::{CoolingType, StorageKind};

    fn complete_draft() -> BuildDraft {
        BuildDraft {
            cpu: Some(CpuSpec {
                model: "Ryzen 5 7600".into(),
                brand: "amd".into(),
                socket: "AM5".into(),
                cores: 6,
                threads: 12,
                base_clock_ghz: 3.8,
                boost_clock_ghz: Some(5.1),
                tdp_w: 65,
                integrated_graphics: true,
                price_usd: 229.99,
            }),
            gpu: None,
            motherboard: Some(MotherboardSpec {
                model: "MSI B650 TOMAHAWK".into(),
                chipset: "B650".into(),
                socket: "AM5".into(),
                form_factor: "ATX".into(),
                ram_type: "DDR5".into(),
                ram_slots: 4,
                max_ram_gb: 128,
                m2_slots: 2,
                sata_ports: 4,
                price_usd: 199.99,
            }),
            ram: Some(RamSpec {
                capacity_gb: 32,
                memory_type: "DDR5".into(),
                speed_mhz: 6000,
                modules: 2,
                cas_latency: Some(30),
                price_usd: 99.99,
            }),
            storage: vec![StorageSpec {
                kind: StorageKind::Nvme,
                capacity_tb: 1.0,
                interface: Some("PCIe 4.0 x4".into()),
                price_usd: 89.99,
            }],
            psu: Some(PsuSpec {
                model: "Corsair RM750e".into(),
                wattage: 750,
                efficiency: "80+ Gold".into(),
                modular: "full".into(),
                pcie_connectors: None,
                price_usd: 109.99,
            }),
            cooling: Some(CoolingSpec {
                kind: CoolingType::Air,
                model: "Thermalright Peerless Assassin 120".into(),
                tdp_rating_w: 220,
                height_mm: Some(155),
                radiator_size_mm: None,
                fan_count: 2,
                noise_level_db: Some(25.0),
                price_usd: 39.99,
            }),
            chassis: Some(ChassisSpec {
                model: "Fractal Design Meshify 2".into(),
                form_factor: "Mid-Tower".into(),
                motherboard_support: vec!["Mini-ITX".into(), "Micro-ATX".into(), "ATX".into()],
                max_gpu_length_mm: Some(315),
                max_cpu_cooler_height_mm: Some(185),
                radiator_support: vec![240, 280, 360],
                included_fans: 3,
                price_usd: 139.99,
            }),
            peripherals: vec![],
            case_fans: 0,
        }
    }

    #[test]
    fn test_complete_draft_converts_with_derived_cost() {
        let build = Build::try_from(complete_draft()).unwrap();
        let expected = 229.99 + 199.99 + 99.99 + 89.99 + 109.99 + 39.99 + 139.99;
        assert!((build.estimated_cost_usd() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_missing_classes_are_all_reported() {
        let mut draft = complete_draft();
        draft.cpu = None;
        draft.psu = None;
        draft.storage.clear();

        let err = Build::try_from(draft).unwrap_err();
        assert_eq!(
            err.missing,
            vec![
                ComponentClass::Cpu,
                ComponentClass::Storage,
                ComponentClass::Psu
            ]
        );
        assert!(err.to_string().contains("missing [cpu, storage, psu]"));
    }

    #[test]
    fn test_invalid_attributes_are_structural() {
        let mut draft = complete_draft();
        if let Some(psu) = draft.psu.as_mut() {
            psu.wattage = 0;
        }
        if let Some(cpu) = draft.cpu.as_mut() {
            cpu.price_usd = -5.0;
        }

        let err = Build::try_from(draft).unwrap_err();
        assert!(err.missing.is_empty());
        assert_eq!(err.invalid.len(), 2);
        assert!(err.invalid.iter().any(|m| m.contains("wattage")));
    }

    #[test]
    fn test_gpu_is_optional() {
        let build = Build::try_from(complete_draft()).unwrap();
        assert!(build.gpu().is_none());
        assert!(build.section(ComponentClass::Gpu).is_empty());
    }

    #[test]
    fn test_deserialize_runs_structural_checks() {
        let mut json = serde_json::to_value(complete_draft()).unwrap();
        json.as_object_mut().unwrap().remove("ram");
        let result: Result<Build, _> = serde_json::from_value(json);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("ram"), "unexpected error: {err}");
    }

    #[test]
    fn test_changed_classes_detects_only_edited_slot() {
        let before = Build::try_from(complete_draft()).unwrap();
        let mut draft = before.to_draft();
        if let Some(psu) = draft.psu.as_mut() {
            psu.wattage = 850;
        }
        let after = Build::try_from(draft).unwrap();

        let changed = after.changed_classes(&before);
        assert_eq!(changed.into_iter().collect::<Vec<_>>(), vec![ComponentClass::Psu]);
        assert_eq!(
            before.fingerprint(ComponentClass::Cpu),
            after.fingerprint(ComponentClass::Cpu)
        );
    }
}
