//! Stages command handler.

use super::{OutputFormat, TargetArgs, build_pruner, resolve_config};
use stageprune::{StageReport, StagepruneConfig};

/// Lists the manageable stages of a secret, oldest first.
///
/// Never removes anything.
pub async fn cmd_stages(
    file: &StagepruneConfig,
    args: TargetArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(file, &args, false);
    let pruner = build_pruner(config).await?;

    let report = pruner.report().await?;

    match args.format {
        OutputFormat::Text => display_stage_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn display_stage_report(report: &StageReport) {
    println!("{}", render_stage_report(report));
}

fn render_stage_report(report: &StageReport) -> String {
    let mut lines = vec![
        format!("Secret: {}", report.secret_id),
        format!(
            "Labels: {} total, {} excluded, {} manageable (threshold {})",
            report.total_label_count,
            report.excluded_label_count,
            report.manageable_count(),
            report.threshold
        ),
        String::new(),
    ];

    if report.stages.is_empty() {
        lines.push("No manageable stages.".to_string());
        return lines.join("\n");
    }

    lines.push("Stages (oldest first):".to_string());
    for record in &report.stages {
        lines.push(format!(
            "  {}  {:<32}  {}",
            record.created_date.format("%Y-%m-%d %H:%M:%S"),
            record.stage,
            record.version_id
        ));
    }
    lines.push(String::new());

    match &report.candidate {
        Some(candidate) if report.over_threshold() => lines.push(format!(
            "Next to remove: '{}' on version {}",
            candidate.stage, candidate.version_id
        )),
        _ => lines.push("Within threshold, nothing to remove.".to_string()),
    }

    lines.join("\n")
}
