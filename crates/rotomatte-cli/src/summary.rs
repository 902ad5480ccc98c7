use std::time::SystemTime;

use console::Style;
use rotomatte_core::frame::FrameIndex;
use rotomatte_core::io::StageInventory;
use rotomatte_core::pipeline::{PipelineConfig, RunReport, StageKind, StageReport, StageStatus};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    good: Style,
    warn: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            good: Style::new().green().bold(),
            warn: Style::new().yellow().bold(),
        }
    }
}

fn rule(s: &Styles, width: usize) {
    println!("  {}", s.title.apply_to("\u{2550}".repeat(width)));
}

pub fn print_pipeline_summary(config: &PipelineConfig, selected: &[String]) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Rotomatte Pipeline"));
    rule(&s, 18);
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Layout"),
        s.value.apply_to(config.layout.sequence_pattern())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Sources"),
        s.value.apply_to(config.sources.join(", "))
    );
    let workers = if config.workers == 0 {
        "auto".to_string()
    } else {
        config.workers.to_string()
    };
    println!(
        "  {:<14}{}",
        s.label.apply_to("Workers"),
        s.value.apply_to(workers)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Existing"),
        s.method.apply_to(&config.existing)
    );
    println!();

    for stage in &config.stages {
        let header = format!("{} ({})", stage.name, stage.kind);
        if !selected.is_empty() && !selected.contains(&stage.name) {
            println!(
                "  {:<30}{}",
                s.header.apply_to(header),
                s.disabled.apply_to("not selected")
            );
            continue;
        }
        println!("  {}", s.header.apply_to(header));
        println!(
            "    {:<12}{}",
            s.label.apply_to("Reads"),
            s.value.apply_to(stage.kind.inputs().join(", "))
        );
        print_stage_options(&s, &stage.kind);
    }
    println!();
}

fn print_stage_options(s: &Styles, kind: &StageKind) {
    let line = |label: &str, value: String| {
        println!("    {:<12}{}", s.label.apply_to(label), s.method.apply_to(value));
    };
    match kind {
        StageKind::Refine { refine, .. } => {
            line("Threshold", refine.threshold.to_string());
            line(
                "Cleanup",
                format!(
                    "close {0}x{0}, open {1}x{1}",
                    refine.morphology.close_kernel, refine.morphology.open_kernel
                ),
            );
            match refine.smoothing {
                Some(ref smoothing) => line("Smoothing", format!("sigma {}", smoothing.sigma)),
                None => println!(
                    "    {:<12}{}",
                    s.label.apply_to("Smoothing"),
                    s.disabled.apply_to("disabled")
                ),
            }
            line("No motion", refine.missing_motion.to_string());
        }
        StageKind::Cutout { cleanup, .. } => {
            line("Close", format!("{0}x{0}", cleanup.close_kernel));
        }
        StageKind::EdgeRefine { edges, .. } => {
            line(
                "Edges",
                format!(
                    "color {}/{}, alpha {}/{}",
                    edges.color_low, edges.color_high, edges.alpha_low, edges.alpha_high
                ),
            );
            line("Feather", format!("{:.0}%", edges.strength * 100.0));
        }
        StageKind::Background { plate, .. } => {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Plate"),
                s.path.apply_to(plate.display())
            );
        }
        StageKind::Overlay { weight, .. } => {
            line("Weight", format!("{:.0}%", weight * 100.0));
        }
        StageKind::Segment { segment, .. } => {
            if let Some(t) = segment.confidence_threshold {
                line("Confidence", format!(">= {t}"));
            }
            line("Close", format!("{0}x{0}", segment.cleanup.close_kernel));
        }
        StageKind::Subtract { .. } => {}
    }
}

fn status_style<'a>(s: &'a Styles, report: &StageReport) -> &'a Style {
    match report.status {
        StageStatus::Completed => &s.good,
        _ => &s.warn,
    }
}

pub fn print_run_report(run: &RunReport) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Run Report"));
    rule(&s, 10);
    println!();

    for report in &run.stages {
        println!(
            "  {:<24}{}",
            s.header.apply_to(&report.stage),
            status_style(&s, report).apply_to(report.status)
        );
        if report.aborted {
            if let Some(ref note) = report.note {
                println!("    {}", s.warn.apply_to(note));
            }
            continue;
        }
        println!(
            "    {:<12}{} of {} ({} written, {} unchanged, {} kept) in {:.2}s",
            s.label.apply_to("Produced"),
            s.value.apply_to(report.produced.len()),
            report.available,
            report.written(),
            report.unchanged(),
            report.kept(),
            report.elapsed_secs
        );
        let fallbacks = report.fallbacks();
        if !fallbacks.is_empty() {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Fallback"),
                s.warn.apply_to(format_indices(&fallbacks))
            );
        }
        for skipped in &report.skipped {
            println!(
                "    {:<12}frame {} ({}): {}",
                s.label.apply_to("Skipped"),
                s.value.apply_to(skipped.index),
                s.warn.apply_to(skipped.reason),
                skipped.detail
            );
        }
    }

    println!();
    let failures = run.stage_failures();
    let totals = format!(
        "{} artifact(s), {} skipped, {} stage(s) without input",
        run.total_produced(),
        run.total_skipped(),
        failures
    );
    if run.is_clean() {
        println!("  {}", s.good.apply_to(totals));
    } else {
        println!("  {}", s.warn.apply_to(totals));
    }
    if run.cancelled {
        println!("  {}", s.warn.apply_to("Run was cancelled"));
    }
    println!();
}

fn format_indices(indices: &[FrameIndex]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_age(modified: Option<SystemTime>) -> String {
    let Some(elapsed) = modified.and_then(|m| m.elapsed().ok()) else {
        return "-".into();
    };
    let secs = elapsed.as_secs();
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

pub fn print_inventory(root: &std::path::Path, inventory: &[StageInventory]) {
    let s = Styles::new();

    println!();
    println!(
        "  {} {}",
        s.title.apply_to("Stages under"),
        s.path.apply_to(root.display())
    );
    println!();
    if inventory.is_empty() {
        println!("  {}", s.disabled.apply_to("no stage directories"));
        println!();
        return;
    }

    println!(
        "  {:<24}{:>8}  {:<14}{:>10}  {}",
        s.label.apply_to("Stage"),
        s.label.apply_to("Frames"),
        s.label.apply_to("Range"),
        s.label.apply_to("Sample"),
        s.label.apply_to("Updated")
    );
    for entry in inventory {
        let range = match (entry.first, entry.last) {
            (Some(first), Some(last)) => format!("{first}-{last}"),
            _ => "-".into(),
        };
        println!(
            "  {:<24}{:>8}  {:<14}{:>10}  {}",
            s.header.apply_to(&entry.stage),
            s.value.apply_to(entry.frames),
            range,
            format!("{:.1} KB", entry.sample_bytes as f64 / 1024.0),
            format_age(entry.sample_modified)
        );
    }
    println!();
}
