//! Console rendering of plans and run reports.

use std::fmt::Write;

use geoinit_core::{Criticality, ProvisionReport, StepStatus, StepSummary};

const RULE_WIDTH: usize = 70;

fn rule(c: char) -> String {
    std::iter::repeat(c).take(RULE_WIDTH).collect()
}

fn codes(statuses: &[u16]) -> String {
    statuses
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Human-readable plan.
pub fn render_plan(base_url: &str, steps: &[StepSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Target GeoServer: {}", base_url);
    let _ = writeln!(out, "{}", rule('='));
    for (index, step) in steps.iter().enumerate() {
        let criticality = match step.criticality {
            Criticality::Required => "required",
            Criticality::BestEffort => "best-effort",
        };
        let _ = writeln!(
            out,
            "[{}] {:<12} {} {} (expects {}, {})",
            index + 1,
            step.name,
            step.method,
            step.path,
            codes(&step.expected),
            criticality
        );
        let _ = writeln!(out, "    {}", step.description);
        if let Some(on_conflict) = &step.on_conflict {
            let _ = writeln!(out, "    on 409: {}", on_conflict);
        }
        if let Some(write) = &step.write {
            let _ = writeln!(
                out,
                "    then {} {} (expects {})",
                write.method,
                write.path,
                codes(&write.expected)
            );
        }
    }
    out
}

/// Human-readable run summary.
pub fn render_report(report: &ProvisionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('='));
    for step in &report.steps {
        let line = match &step.status {
            StepStatus::Created => "created".to_string(),
            StepStatus::Updated => "updated".to_string(),
            StepStatus::UpdatedExisting => "already exists, updated".to_string(),
            StepStatus::AlreadyExists => "already exists".to_string(),
            StepStatus::Warning(message) => format!("WARNING: {}", message),
        };
        let _ = writeln!(out, "  {:<12} {}", step.name, line);
    }
    let _ = writeln!(out, "{}", rule('='));

    let warnings = report.warnings().count();
    if warnings == 0 {
        let _ = writeln!(out, "Setup complete.");
    } else {
        let _ = writeln!(out, "Setup complete with {} warning(s).", warnings);
    }
    let elapsed = report.finished_at - report.started_at;
    let _ = writeln!(out, "Finished in {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);

    let _ = writeln!(out);
    let _ = writeln!(out, "You can now access your layer at:");
    let _ = writeln!(out, "  WMS: {}", report.links.wms);
    let _ = writeln!(out, "  WFS: {}", report.links.wfs);
    let _ = writeln!(out);
    let _ = writeln!(out, "Layer preview:");
    let _ = writeln!(out, "  {}", report.links.preview);
    let _ = writeln!(out, "{}", rule('='));
    out
}
