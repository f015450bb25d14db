//! Human-readable rendering of a finished session.

use std::fmt::Write;

use pcbuild_core::model::StorageKind;
use pcbuild_core::{Build, Formatter, SessionOutcome, SessionStatus};

const RULE: &str = "======================================================================";

#[derive(Debug, Clone, Copy)]
pub struct TextFormatter {
    /// Per-component spec lines under each part.
    pub technical_details: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            technical_details: true,
        }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, outcome: &SessionOutcome) -> String {
        let mut out = String::new();
        let title = match outcome.status {
            SessionStatus::Approved => "PC BUILD RECOMMENDATION",
            SessionStatus::Exhausted => "BEST EFFORT BUILD (NOT APPROVED)",
            SessionStatus::StructuralFailure => "NO BUILD PRODUCED",
        };
        let _ = writeln!(out, "{RULE}\n{title}\n{RULE}\n");
        let _ = writeln!(
            out,
            "Status: {} after {} iteration(s)",
            outcome.status, outcome.iteration_count
        );
        if let Some(error) = &outcome.error {
            let _ = writeln!(out, "Stopped by: {error}");
        }
        if let Some(failure) = &outcome.structural_failure {
            let _ = writeln!(out, "Last proposal: {failure}");
        }

        let Some(build) = &outcome.build else {
            return out;
        };
        let metrics = outcome.validation_result.as_ref().map(|r| r.metrics());

        let _ = writeln!(out, "Total Cost: ${:.2}", build.estimated_cost_usd());
        if let Some(m) = metrics {
            let _ = writeln!(out, "Budget Used: {:.1}%", m.budget_utilisation_pct);
        }
        let _ = writeln!(out, "\nCOMPONENTS\n{}\n", "-".repeat(RULE.len()));
        self.components(&mut out, build);

        if let Some(m) = metrics {
            let _ = writeln!(out, "Estimated Power Draw: {}W", m.estimated_load_w);
            let _ = writeln!(out, "PSU Headroom: {:.1}%\n", m.psu_headroom_pct);
        }

        if let Some(result) = &outcome.validation_result {
            let issues: Vec<String> = result
                .errors()
                .chain(result.warnings())
                .map(|o| format!("  [{}] {}", o.verdict, o.message))
                .collect();
            if !issues.is_empty() {
                let _ = writeln!(out, "OUTSTANDING ISSUES\n{}\n", issues.join("\n"));
            }
        }

        let diagnoses = outcome.diagnoses();
        if !diagnoses.is_empty() {
            let _ = writeln!(out, "{RULE}\nREVISION NOTES\n{RULE}");
            for (i, note) in diagnoses.iter().enumerate() {
                let _ = writeln!(out, "{}. {note}", i + 1);
            }
        }
        out
    }
}

impl TextFormatter {
    fn components(&self, out: &mut String, build: &Build) {
        let detail = |out: &mut String, line: String| {
            if self.technical_details {
                let _ = writeln!(out, "  • {line}");
            }
        };

        let cpu = build.cpu();
        let _ = writeln!(out, "CPU: {}", cpu.model);
        detail(out, format!("{} cores / {} threads", cpu.cores, cpu.threads));
        detail(out, format!("{}W TDP, ${:.2}", cpu.tdp_w, cpu.price_usd));

        match build.gpu() {
            Some(gpu) => {
                let _ = writeln!(out, "GPU: {}", gpu.model);
                detail(out, format!("{}GB {}", gpu.vram_gb, gpu.vram_type));
                detail(out, format!("{}W TDP, ${:.2}", gpu.tdp_w, gpu.price_usd));
            }
            None => {
                let _ = writeln!(out, "GPU: Integrated Graphics");
            }
        }

        let board = build.motherboard();
        let _ = writeln!(out, "Motherboard: {}", board.model);
        detail(
            out,
            format!("{} {}, {} up to {}GB", board.socket, board.form_factor, board.ram_type, board.max_ram_gb),
        );

        let ram = build.ram();
        let _ = writeln!(out, "RAM: {}GB {}", ram.capacity_gb, ram.memory_type);
        detail(out, format!("{} MHz, {} modules", ram.speed_mhz, ram.modules));

        let total_tb: f64 = build.storage().iter().map(|s| s.capacity_tb).sum();
        let _ = writeln!(out, "Storage: {total_tb:.1}TB total");
        for (i, drive) in build.storage().iter().enumerate() {
            let kind = match drive.kind {
                StorageKind::Nvme => "NVMe",
                StorageKind::Ssd => "SATA SSD",
                StorageKind::Hdd => "HDD",
            };
            let _ = writeln!(out, "  Drive {}: {}TB {kind}", i + 1, drive.capacity_tb);
        }

        let psu = build.psu();
        let _ = writeln!(out, "PSU: {}W {}", psu.wattage, psu.efficiency);

        let cooling = build.cooling();
        let _ = writeln!(out, "Cooling: {} ({})", cooling.model, cooling.kind);
        detail(out, format!("rated for {}W TDP", cooling.tdp_rating_w));

        let chassis = build.chassis();
        let _ = writeln!(out, "Case: {} ({})", chassis.model, chassis.form_factor);

        for peripheral in build.peripherals() {
            let _ = writeln!(out, "{}: {}", peripheral.kind, peripheral.model);
        }
        out.push('\n');
    }
}
