//! Power and thermal estimation.
//!
//! Wattages come from planner output, so every sum saturates at `u32::MAX`
//! instead of wrapping.

use crate::model::{Build, CoolingType, StorageKind};

use super::{BuildRule, RuleContext, RuleOutcome};

const RAM_W_PER_8GB: u32 = 4;
const NVME_W: u32 = 8;
const SATA_SSD_W: u32 = 3;
const HDD_W: u32 = 8;
const MOTHERBOARD_W: u32 = 60;
const FAN_W: u32 = 5;
const AIO_PUMP_W: u32 = 10;

/// Load above which a basic 80+ or 80+ Bronze unit is worth upgrading.
const EFFICIENCY_UPGRADE_LOAD_W: u32 = 400;
/// GPU draw above which an unknown PSU lead inventory is worth flagging.
const CONNECTOR_CHECK_GPU_W: u32 = 150;

/// Estimated electrical load of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerEstimate {
    pub cpu_w: u32,
    pub gpu_w: u32,
    /// RAM, storage, board, fans, pump. Zero unless requested.
    pub auxiliary_w: u32,
}

impl PowerEstimate {
    pub fn for_build(build: &Build, include_auxiliary: bool) -> Self {
        Self {
            cpu_w: build.cpu().tdp_w,
            gpu_w: build.gpu().map_or(0, |g| g.tdp_w),
            auxiliary_w: if include_auxiliary {
                auxiliary_load_w(build)
            } else {
                0
            },
        }
    }

    pub fn load_w(&self) -> u32 {
        self.cpu_w
            .saturating_add(self.gpu_w)
            .saturating_add(self.auxiliary_w)
    }

    /// CPU and GPU heat output, the part the case has to exhaust.
    pub fn heat_w(&self) -> u32 {
        self.cpu_w.saturating_add(self.gpu_w)
    }

    /// Wattage needed to keep `margin` headroom over the load.
    pub fn required_psu_w(&self, margin: f64) -> f64 {
        f64::from(self.load_w()) * (1.0 + margin)
    }
}

/// Draw of everything other than CPU and GPU.
pub fn auxiliary_load_w(build: &Build) -> u32 {
    let ram = (build.ram().capacity_gb / 8).saturating_mul(RAM_W_PER_8GB);
    let storage = build
        .storage()
        .iter()
        .map(|drive| match drive.kind {
            StorageKind::Nvme => NVME_W,
            StorageKind::Ssd => SATA_SSD_W,
            StorageKind::Hdd => HDD_W,
        })
        .fold(0u32, u32::saturating_add);
    let fans = build
        .cooling()
        .fan_count
        .saturating_add(build.case_fans())
        .saturating_add(build.chassis().included_fans);
    let pump = if build.cooling().kind == CoolingType::Aio {
        AIO_PUMP_W
    } else {
        0
    };
    [ram, storage, MOTHERBOARD_W, fans.saturating_mul(FAN_W), pump]
        .into_iter()
        .fold(0u32, u32::saturating_add)
}

/// Percentage by which `wattage` falls short of `required`, rounded.
pub fn shortfall_pct(wattage: u32, required: f64) -> u32 {
    if required <= 0.0 {
        return 0;
    }
    let short = (required - f64::from(wattage)) / required * 100.0;
    short.max(0.0).round() as u32
}

/// PSU must cover the load, and should cover it with `psu_margin` to spare.
pub struct PsuHeadroom;

impl BuildRule for PsuHeadroom {
    fn id(&self) -> &'static str {
        "psu_headroom"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let estimate = PowerEstimate::for_build(ctx.build, ctx.config.include_auxiliary_load);
        let load = estimate.load_w();
        let required = estimate.required_psu_w(ctx.config.psu_margin);
        let wattage = ctx.build.psu().wattage;
        let margin_pct = (ctx.config.psu_margin * 100.0).round() as u32;

        if wattage < load {
            RuleOutcome::error(
                self.id(),
                "insufficient_psu",
                format!(
                    "{load}W estimated load exceeds {wattage}W PSU capacity by {}W",
                    load - wattage
                ),
            )
        } else if f64::from(wattage) < required {
            RuleOutcome::warning(
                self.id(),
                "psu_headroom_low",
                format!(
                    "{load}W load exceeds PSU headroom by {}%: {wattage}W PSU, {required:.1}W recommended at {margin_pct}% margin",
                    shortfall_pct(wattage, required)
                ),
            )
        } else {
            RuleOutcome::pass(
                self.id(),
                format!("{wattage}W PSU covers {required:.1}W required for {load}W load"),
            )
        }
    }
}

/// Combined CPU+GPU heat against the cooling type's threshold tier.
pub struct ThermalRisk;

impl BuildRule for ThermalRisk {
    fn id(&self) -> &'static str {
        "thermal_risk"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let heat = PowerEstimate::for_build(ctx.build, false).heat_w();
        let kind = ctx.build.cooling().kind;
        let threshold = ctx.config.thermal_threshold_w(kind);

        if heat > threshold {
            RuleOutcome::warning(
                self.id(),
                "thermal_risk",
                format!(
                    "combined CPU+GPU TDP {heat}W exceeds the {threshold}W threshold for {kind} cooling"
                ),
            )
        } else {
            RuleOutcome::pass(
                self.id(),
                format!("{heat}W within the {threshold}W threshold for {kind} cooling"),
            )
        }
    }
}

/// Basic 80+ and 80+ Bronze units waste enough at high load to be worth a
/// warning.
pub struct PsuEfficiency;

impl BuildRule for PsuEfficiency {
    fn id(&self) -> &'static str {
        "psu_efficiency"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let psu = ctx.build.psu();
        let load = PowerEstimate::for_build(ctx.build, ctx.config.include_auxiliary_load).load_w();
        let rating = psu.efficiency.trim();
        let basic =
            rating.eq_ignore_ascii_case("80+") || rating.eq_ignore_ascii_case("80+ Bronze");

        if basic && load > EFFICIENCY_UPGRADE_LOAD_W {
            RuleOutcome::warning(
                self.id(),
                "efficiency_suboptimal",
                format!(
                    "{rating} PSU is inefficient for a {load}W load; 80+ Gold or better runs cooler and quieter"
                ),
            )
        } else {
            RuleOutcome::pass(self.id(), format!("{rating} PSU suits a {load}W load"))
        }
    }
}

/// A GPU asking for a 12VHPWR / 12V-2x6 lead needs a PSU that provides one.
pub struct PowerConnectors;

fn is_high_power_lead(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.contains("12vhpwr") || name.contains("12v-2x6")
}

impl BuildRule for PowerConnectors {
    fn id(&self) -> &'static str {
        "power_connectors"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let Some(gpu) = ctx.build.gpu() else {
            return RuleOutcome::pass(self.id(), "no discrete GPU to power");
        };
        let Some(required) = gpu.power_connectors.as_deref() else {
            return RuleOutcome::pass(self.id(), "GPU power leads not specified");
        };
        let psu = ctx.build.psu();

        match &psu.pcie_connectors {
            None if gpu.tdp_w > CONNECTOR_CHECK_GPU_W => RuleOutcome::warning(
                self.id(),
                "power_connectors_unverified",
                format!(
                    "PSU '{}' does not list its PCIe leads; {} needs {required}",
                    psu.model, gpu.model
                ),
            ),
            None => RuleOutcome::pass(self.id(), format!("{required} assumed available")),
            Some(leads) => {
                let provides_high_power = leads
                    .iter()
                    .any(|(name, count)| *count > 0 && is_high_power_lead(name));
                if is_high_power_lead(required) && !provides_high_power {
                    RuleOutcome::error(
                        self.id(),
                        "missing_power_connectors",
                        format!(
                            "{} requires a 12VHPWR lead ({required}) but PSU '{}' provides {}",
                            gpu.model,
                            psu.model,
                            leads
                                .iter()
                                .map(|(name, count)| format!("{count}x {name}"))
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                    )
                } else {
                    RuleOutcome::pass(self.id(), format!("PSU provides {required}"))
                }
            }
        }
    }
}
