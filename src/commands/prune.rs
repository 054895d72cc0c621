//! Prune command handler.

use super::{OutputFormat, TargetArgs, build_pruner, resolve_config};
use stageprune::{RunResult, StagepruneConfig};

/// Prune command implementation.
///
/// Runs one pass: removes the oldest manageable stage if the secret carries
/// more than the threshold allows.
///
/// # Examples
///
/// ```bash
/// # See what would be removed
/// stageprune prune --secret-id prod/db-password --dry-run
///
/// # Keep at most 10 release labels, never touching "pinned"
/// stageprune prune -s prod/db-password -t 10 --exclude AWSCURRENT,AWSPREVIOUS,AWSPENDING,pinned
/// ```
pub async fn cmd_prune(
    file: &StagepruneConfig,
    args: TargetArgs,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(file, &args, dry_run);
    let pruner = build_pruner(config).await?;

    let result = pruner.run().await?;

    match args.format {
        OutputFormat::Text => display_run_result(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}

/// Displays a run result to the user.
fn display_run_result(result: &RunResult) {
    println!("{}", render_run_result(result));
}

fn render_run_result(result: &RunResult) -> String {
    let mut lines = vec![
        result.summary(),
        format!(
            "Manageable stages: {} of {} labels (threshold {})",
            result.manageable_count, result.total_label_count, result.threshold
        ),
    ];
    if result.has_candidate() && !result.trimmed {
        lines.push("Dry run: re-run without --dry-run to remove it.".to_string());
    }
    lines.push(format!(
        "Run {} finished in {}ms",
        result.run_id, result.duration_ms
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use stageprune::RemovedStage;

    fn result(removed: Option<RemovedStage>, trimmed: bool) -> RunResult {
        RunResult {
            run_id: "run-1".to_string(),
            secret_id: "prod/db".to_string(),
            trimmed,
            removed,
            total_label_count: 4,
            manageable_count: 3,
            threshold: 2,
            dry_run: !trimmed,
            duration_ms: 12,
        }
    }

    fn stage() -> Option<RemovedStage> {
        Some(RemovedStage {
            stage: "release-1".to_string(),
            version_id: "v1".to_string(),
        })
    }

    #[test]
    fn test_dry_run_with_candidate_shows_hint() {
        let text = render_run_result(&result(stage(), false));
        assert!(text.contains("Would remove stage 'release-1'"));
        assert!(text.contains("re-run without --dry-run"));
    }

    #[test]
    fn test_trimmed_run_has_no_hint() {
        let text = render_run_result(&result(stage(), true));
        assert!(text.starts_with("Removed stage 'release-1'"));
        assert!(!text.contains("--dry-run"));
    }

    #[test]
    fn test_no_candidate_has_no_hint() {
        let text = render_run_result(&result(None, false));
        assert!(text.starts_with("No pruning needed"));
        assert!(!text.contains("--dry-run"));
        assert!(text.ends_with("Run run-1 finished in 12ms"));
    }
}
