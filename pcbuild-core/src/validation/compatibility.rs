//! Physical and electrical compatibility rules.
//!
//! Rules whose inputs are unknown (no GPU length, no chassis clearance
//! figure) pass rather than guess. The one exception is an AIO radiator in a
//! chassis that lists no radiator mounts, which warns.

use crate::model::{ChassisSize, CoolingType, StorageKind};

use super::{BuildRule, RuleContext, RuleOutcome};

/// GPU clearance under this many millimetres is flagged as a tight fit.
const GPU_TIGHT_FIT_MM: u32 = 10;
/// Same for air cooler height.
const COOLER_TIGHT_FIT_MM: u32 = 5;
/// Cooler rating should exceed CPU TDP by this factor.
const COOLER_HEADROOM_FACTOR: f64 = 1.2;
/// DDR4 kits faster than this usually run beyond board and CPU validation.
const DDR4_SPEED_LIMIT_MHZ: u32 = 4000;
/// GPUs this thick cover neighbouring expansion slots.
const THICK_GPU_SLOTS: u8 = 3;

/// CPU and motherboard sockets must match.
pub struct SocketCompatibility;

impl BuildRule for SocketCompatibility {
    fn id(&self) -> &'static str {
        "socket_compatibility"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let cpu = &ctx.build.cpu().socket;
        let board = &ctx.build.motherboard().socket;
        if cpu.eq_ignore_ascii_case(board) {
            RuleOutcome::pass(self.id(), format!("CPU and motherboard share socket {cpu}"))
        } else {
            RuleOutcome::error(
                self.id(),
                "socket_mismatch",
                format!("CPU socket '{cpu}' does not match motherboard socket '{board}'"),
            )
        }
    }
}

/// RAM generation must be supported by the motherboard and, when the
/// catalog knows the CPU's platform, by that platform too.
pub struct MemoryCompatibility;

impl BuildRule for MemoryCompatibility {
    fn id(&self) -> &'static str {
        "memory_compatibility"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let ram = &ctx.build.ram().memory_type;
        let board = ctx.build.motherboard();

        if !ram.eq_ignore_ascii_case(&board.ram_type) {
            return RuleOutcome::error(
                self.id(),
                "ram_type_mismatch",
                format!(
                    "RAM type '{ram}' incompatible with motherboard '{}' which takes {}",
                    board.model, board.ram_type
                ),
            );
        }

        let socket = &ctx.build.cpu().socket;
        if let Some(platform) = ctx.catalog.platform(socket) {
            if !platform.supports_memory(ram) {
                return RuleOutcome::error(
                    self.id(),
                    "ram_type_mismatch",
                    format!(
                        "RAM type '{ram}' not supported by the {} platform ({})",
                        platform.socket,
                        platform.memory_types.join(", ")
                    ),
                );
            }
        }

        RuleOutcome::pass(self.id(), format!("{ram} supported by motherboard"))
    }
}

/// Normalise board form factor names so "mATX" and "Micro-ATX" compare equal.
fn board_form_factor_key(raw: &str) -> String {
    let key: String = raw
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    match key.as_str() {
        "matx" | "uatx" => "microatx".to_string(),
        "itx" => "miniitx".to_string(),
        _ => key,
    }
}

/// Chassis must take the motherboard and be no larger than the requested
/// case size.
pub struct FormFactorFit;

impl BuildRule for FormFactorFit {
    fn id(&self) -> &'static str {
        "form_factor_fit"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let board = ctx.build.motherboard();
        let chassis = ctx.build.chassis();
        let board_key = board_form_factor_key(&board.form_factor);

        let supported = chassis
            .motherboard_support
            .iter()
            .any(|ff| board_form_factor_key(ff) == board_key);
        if !supported {
            return RuleOutcome::error(
                self.id(),
                "form_factor_mismatch",
                format!(
                    "motherboard form factor '{}' not supported by chassis '{}' (supports {})",
                    board.form_factor,
                    chassis.model,
                    chassis.motherboard_support.join(", ")
                ),
            );
        }

        let requested = ctx.constraints.form_factor;
        if let Some(size) = ChassisSize::parse_loose(&chassis.form_factor) {
            if size > requested {
                return RuleOutcome::error(
                    self.id(),
                    "form_factor_mismatch",
                    format!(
                        "chassis '{}' is {size}, larger than the requested {requested}",
                        chassis.model
                    ),
                );
            }
        }

        RuleOutcome::pass(
            self.id(),
            format!(
                "{} board fits {} chassis",
                board.form_factor, chassis.form_factor
            ),
        )
    }
}

/// Cooler must be rated for the CPU's TDP, and should leave 20% to spare.
pub struct CoolingCapacity;

impl BuildRule for CoolingCapacity {
    fn id(&self) -> &'static str {
        "cooling_capacity"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let rating = ctx.build.cooling().tdp_rating_w;
        let tdp = ctx.build.cpu().tdp_w;
        if rating < tdp {
            RuleOutcome::error(
                self.id(),
                "cooling_insufficient",
                format!(
                    "cooler rated {rating}W cannot handle {tdp}W CPU TDP ({}W short)",
                    tdp - rating
                ),
            )
        } else if f64::from(rating) < f64::from(tdp) * COOLER_HEADROOM_FACTOR {
            let headroom = (f64::from(rating) - f64::from(tdp)) / f64::from(tdp) * 100.0;
            RuleOutcome::warning(
                self.id(),
                "thermal_risk",
                format!(
                    "cooler rated {rating}W leaves only {headroom:.1}% headroom over {tdp}W CPU TDP; may run hot under sustained load"
                ),
            )
        } else {
            RuleOutcome::pass(self.id(), format!("cooler rated {rating}W for {tdp}W CPU"))
        }
    }
}

pub struct GpuClearance;

impl BuildRule for GpuClearance {
    fn id(&self) -> &'static str {
        "gpu_clearance"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let length = ctx.build.gpu().and_then(|g| g.length_mm);
        let max = ctx.build.chassis().max_gpu_length_mm;
        match (length, max) {
            (Some(length), Some(max)) if length > max => RuleOutcome::error(
                self.id(),
                "gpu_too_long",
                format!(
                    "GPU length {length}mm exceeds chassis maximum {max}mm by {}mm",
                    length - max
                ),
            ),
            (Some(length), Some(max)) if max - length < GPU_TIGHT_FIT_MM => RuleOutcome::warning(
                self.id(),
                "tight_fit",
                format!(
                    "GPU clearance very tight: {length}mm card leaves {}mm of {max}mm",
                    max - length
                ),
            ),
            (Some(length), Some(max)) => {
                RuleOutcome::pass(self.id(), format!("GPU {length}mm fits {max}mm clearance"))
            }
            _ => RuleOutcome::pass(self.id(), "GPU clearance not constrained"),
        }
    }
}

/// Air cooler height or AIO radiator size against the chassis.
pub struct CoolerClearance;

impl BuildRule for CoolerClearance {
    fn id(&self) -> &'static str {
        "cooler_clearance"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let cooling = ctx.build.cooling();
        let chassis = ctx.build.chassis();

        match cooling.kind {
            CoolingType::Air => {
                if let (Some(height), Some(max)) =
                    (cooling.height_mm, chassis.max_cpu_cooler_height_mm)
                {
                    if height > max {
                        return RuleOutcome::error(
                            self.id(),
                            "cooler_too_tall",
                            format!(
                                "CPU cooler height {height}mm exceeds chassis maximum {max}mm"
                            ),
                        );
                    }
                    if max - height < COOLER_TIGHT_FIT_MM {
                        return RuleOutcome::warning(
                            self.id(),
                            "tight_fit",
                            format!(
                                "CPU cooler clearance very tight: {}mm left under the {max}mm limit",
                                max - height
                            ),
                        );
                    }
                }
            }
            CoolingType::Aio => {
                if let Some(size) = cooling.radiator_size_mm {
                    if chassis.radiator_support.is_empty() {
                        return RuleOutcome::warning(
                            self.id(),
                            "clearance_minimal",
                            format!(
                                "chassis '{}' lists no radiator mounts; verify the {size}mm radiator fits",
                                chassis.model
                            ),
                        );
                    }
                    if !chassis.radiator_support.contains(&size) {
                        let supported: Vec<String> = chassis
                            .radiator_support
                            .iter()
                            .map(|s| format!("{s}mm"))
                            .collect();
                        return RuleOutcome::error(
                            self.id(),
                            "radiator_not_supported",
                            format!(
                                "chassis does not mount a {size}mm radiator (supports {})",
                                supported.join(", ")
                            ),
                        );
                    }
                }
            }
            CoolingType::Custom => {}
        }

        RuleOutcome::pass(self.id(), format!("{} cooler fits chassis", cooling.kind))
    }
}

/// Drives must have somewhere to plug in.
pub struct StorageConnectivity;

impl BuildRule for StorageConnectivity {
    fn id(&self) -> &'static str {
        "storage_connectivity"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let board = ctx.build.motherboard();
        let drives = ctx.build.storage();
        let m2 = drives.iter().filter(|d| d.kind == StorageKind::Nvme).count() as u32;
        let sata = drives.len() as u32 - m2;

        let mut problems = Vec::new();
        let mut code = None;
        if m2 > board.m2_slots {
            code = Some("insufficient_m2_slots");
            problems.push(format!(
                "{m2} NVMe drives but only {} M.2 slots",
                board.m2_slots
            ));
        }
        if sata > board.sata_ports {
            code.get_or_insert("insufficient_sata_ports");
            problems.push(format!(
                "{sata} SATA drives but only {} SATA ports",
                board.sata_ports
            ));
        }

        match code {
            Some(code) => RuleOutcome::error(self.id(), code, problems.join("; ")),
            None => RuleOutcome::pass(
                self.id(),
                format!("{m2} M.2 and {sata} SATA drives connected"),
            ),
        }
    }
}

/// A build needs a GPU unless the CPU has integrated graphics.
pub struct DisplayOutput;

impl BuildRule for DisplayOutput {
    fn id(&self) -> &'static str {
        "display_output"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let cpu = ctx.build.cpu();
        match ctx.build.gpu() {
            Some(gpu) => RuleOutcome::pass(self.id(), format!("display via {}", gpu.model)),
            None if cpu.integrated_graphics => RuleOutcome::pass(
                self.id(),
                format!("display via {} integrated graphics", cpu.model),
            ),
            None => RuleOutcome::error(
                self.id(),
                "missing_gpu",
                format!(
                    "no discrete GPU and CPU '{}' lacks integrated graphics",
                    cpu.model
                ),
            ),
        }
    }
}

/// RAM kit must fit the board's capacity and slot count.
pub struct MemoryCapacity;

impl BuildRule for MemoryCapacity {
    fn id(&self) -> &'static str {
        "memory_capacity"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let ram = ctx.build.ram();
        let board = ctx.build.motherboard();

        let mut problems = Vec::new();
        let mut code = None;
        if ram.capacity_gb > board.max_ram_gb {
            code = Some("ram_capacity_exceeded");
            problems.push(format!(
                "{}GB exceeds motherboard maximum {}GB",
                ram.capacity_gb, board.max_ram_gb
            ));
        }
        if ram.modules > board.ram_slots {
            code.get_or_insert("insufficient_ram_slots");
            problems.push(format!(
                "{} modules need more than the {} slots available",
                ram.modules, board.ram_slots
            ));
        }

        match code {
            Some(code) => RuleOutcome::error(self.id(), code, problems.join("; ")),
            None => RuleOutcome::pass(
                self.id(),
                format!(
                    "{}GB in {} of {} slots",
                    ram.capacity_gb, ram.modules, board.ram_slots
                ),
            ),
        }
    }
}

/// DDR4 kits rated far above JEDEC speeds rarely run at their rating.
pub struct MemorySpeed;

impl BuildRule for MemorySpeed {
    fn id(&self) -> &'static str {
        "memory_speed"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let ram = ctx.build.ram();
        let board = ctx.build.motherboard();
        if board.ram_type.eq_ignore_ascii_case("DDR4") && ram.speed_mhz > DDR4_SPEED_LIMIT_MHZ {
            RuleOutcome::warning(
                self.id(),
                "ram_speed_mismatch",
                format!(
                    "{}MHz is very fast for DDR4; check that '{}' and the CPU support it",
                    ram.speed_mhz, board.model
                ),
            )
        } else {
            RuleOutcome::pass(
                self.id(),
                format!("{}MHz {} within board support", ram.speed_mhz, ram.memory_type),
            )
        }
    }
}

/// Upgrade path: free RAM slots, free M.2 slots, and a GPU that does not
/// bury the other expansion slots.
pub struct ExpansionHeadroom;

impl BuildRule for ExpansionHeadroom {
    fn id(&self) -> &'static str {
        "expansion_headroom"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let board = ctx.build.motherboard();
        let ram = ctx.build.ram();
        let m2 = ctx
            .build
            .storage()
            .iter()
            .filter(|d| d.kind == StorageKind::Nvme)
            .count() as u32;

        let mut full = Vec::new();
        if ram.modules == board.ram_slots {
            full.push(format!(
                "all {} RAM slots used, no upgrade path without replacement",
                board.ram_slots
            ));
        }
        if m2 > 0 && m2 == board.m2_slots {
            full.push(format!("all {} M.2 slots used", board.m2_slots));
        }
        if let Some(gpu) = ctx.build.gpu().filter(|g| g.pcie_slots >= THICK_GPU_SLOTS) {
            full.push(format!(
                "GPU occupies {} PCIe slots and may block other cards",
                gpu.pcie_slots
            ));
        }

        if full.is_empty() {
            RuleOutcome::pass(self.id(), "spare RAM and M.2 slots available")
        } else {
            RuleOutcome::warning(self.id(), "no_spare_slots", full.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_form_factor_aliases() {
        assert_eq!(board_form_factor_key("mATX"), board_form_factor_key("Micro-ATX"));
        assert_eq!(board_form_factor_key("ITX"), board_form_factor_key("Mini-ITX"));
        assert_ne!(board_form_factor_key("ATX"), board_form_factor_key("E-ATX"));
    }
}
