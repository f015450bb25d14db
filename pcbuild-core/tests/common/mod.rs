//! Shared fixtures and deterministic collaborator stand-ins.
#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pcbuild_core::config::{EngineConfig, RevisionConfig};
use pcbuild_core::model::{
    ChassisSpec, CoolingSpec, CoolingType, CpuSpec, GpuSpec, MotherboardSpec, PsuSpec, RamSpec,
    StorageKind, StorageSpec,
};
use pcbuild_core::{
    BuildDraft, CollaboratorError, Constraints, Critic, PartsCatalog, PlanRequest, Planner,
    ValidationEngine, ValidationResult,
};

pub fn am5_cpu() -> CpuSpec {
    CpuSpec {
        model: "AMD Ryzen 5 7600".into(),
        brand: "amd".into(),
        socket: "AM5".into(),
        cores: 6,
        threads: 12,
        base_clock_ghz: 3.8,
        boost_clock_ghz: Some(5.1),
        tdp_w: 65,
        integrated_graphics: true,
        price_usd: 229.99,
    }
}

pub fn lga1700_cpu() -> CpuSpec {
    CpuSpec {
        model: "Intel Core i5-14600K".into(),
        brand: "intel".into(),
        socket: "LGA1700".into(),
        cores: 14,
        threads: 20,
        base_clock_ghz: 3.5,
        boost_clock_ghz: Some(5.3),
        tdp_w: 125,
        integrated_graphics: true,
        price_usd: 289.99,
    }
}

pub fn gpu(tdp_w: u32) -> GpuSpec {
    GpuSpec {
        model: "GeForce RTX 4060 Ti".into(),
        brand: "nvidia".into(),
        chipset: "AD106".into(),
        vram_gb: 8,
        vram_type: "GDDR6".into(),
        tdp_w,
        length_mm: Some(240),
        pcie_slots: 2,
        power_connectors: Some("1x 8-pin".into()),
        price_usd: 329.99,
    }
}

pub fn psu(wattage: u32) -> PsuSpec {
    PsuSpec {
        model: format!("Generic {wattage}W"),
        wattage,
        efficiency: "80+ Gold".into(),
        modular: "full".into(),
        pcie_connectors: Some(BTreeMap::from([
            ("8-pin".to_string(), 2),
            ("6-pin".to_string(), 2),
        ])),
        price_usd: 109.99,
    }
}

/// AM5 build, 65W CPU + 160W GPU, 750W PSU, air cooled, mid-tower.
/// Costs $1239.92 and passes every rule against [`gaming_constraints`].
pub fn balanced_draft() -> BuildDraft {
    BuildDraft {
        cpu: Some(am5_cpu()),
        gpu: Some(gpu(160)),
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
        psu: Some(psu(750)),
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

pub fn draft_with(edit: impl FnOnce(&mut BuildDraft)) -> BuildDraft {
    let mut draft = balanced_draft();
    edit(&mut draft);
    draft
}

pub fn gaming_constraints() -> Constraints {
    Constraints::new(1500.0, "gaming")
}

pub fn engine() -> ValidationEngine {
    ValidationEngine::new(
        Arc::new(PartsCatalog::builtin()),
        EngineConfig::default().validation,
    )
}

/// Default revision settings without retry delays.
pub fn fast_revision_config() -> RevisionConfig {
    RevisionConfig {
        retry_backoff_ms: 0,
        collaborator_timeout_secs: 5,
        ..RevisionConfig::default()
    }
}

/// One scripted planner response.
pub enum PlanStep {
    Draft(BuildDraft),
    Malformed(&'static str),
    Fatal(&'static str),
    /// Never returns; only a timeout or cancellation ends the call.
    Hang,
}

/// Plays back a fixed script, then repeats the last draft it returned.
pub struct ScriptedPlanner {
    steps: Mutex<VecDeque<PlanStep>>,
    last: Mutex<Option<BuildDraft>>,
    requests: Mutex<Vec<PlanRequest>>,
    calls: AtomicUsize,
}

impl ScriptedPlanner {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn repeating(draft: BuildDraft) -> Self {
        Self::new(vec![PlanStep::Draft(draft)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PlanRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn propose(&self, request: &PlanRequest) -> Result<BuildDraft, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(PlanStep::Draft(draft)) => {
                *self.last.lock().unwrap() = Some(draft.clone());
                Ok(draft)
            }
            Some(PlanStep::Malformed(detail)) => Err(CollaboratorError::malformed(detail)),
            Some(PlanStep::Fatal(detail)) => Err(CollaboratorError::Fatal(detail.to_string())),
            Some(PlanStep::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| CollaboratorError::Fatal("script exhausted".into())),
        }
    }
}

type PlanFn = dyn Fn(&PlanRequest) -> Result<BuildDraft, CollaboratorError> + Send + Sync;

/// Planner driven by a closure over the request.
pub struct FnPlanner {
    plan: Box<PlanFn>,
    requests: Mutex<Vec<PlanRequest>>,
}

impl FnPlanner {
    pub fn new(
        plan: impl Fn(&PlanRequest) -> Result<BuildDraft, CollaboratorError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            plan: Box::new(plan),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PlanRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Planner for FnPlanner {
    async fn propose(&self, request: &PlanRequest) -> Result<BuildDraft, CollaboratorError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.plan)(request)
    }
}

/// Names the failing codes.
pub struct EchoCritic;

#[async_trait]
impl Critic for EchoCritic {
    async fn diagnose(&self, result: &ValidationResult) -> Result<String, CollaboratorError> {
        let codes: Vec<&str> = result
            .outcomes()
            .iter()
            .filter(|o| !o.is_pass())
            .map(|o| o.code.as_str())
            .collect();
        Ok(format!("failing: {}", codes.join(", ")))
    }
}
