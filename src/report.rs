use std::fmt::Write;

use crate::config::{ModuleGate, ScoringConfig};
use crate::loader::EventTable;
use crate::models::{EventRow, PlaybackModeSummary, UserBreakdown};

pub fn summarize_by_mode(events: &[EventRow]) -> Vec<PlaybackModeSummary> {
    let mut map: std::collections::BTreeMap<Option<i64>, usize> =
        std::collections::BTreeMap::new();

    for event in events {
        *map.entry(event.pb_type).or_insert(0) += 1;
    }

    let total = events.len();
    let mut summaries: Vec<PlaybackModeSummary> = map
        .into_iter()
        .map(|(pb_type, count)| PlaybackModeSummary {
            pb_type,
            count,
            share_pct: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

fn format_cell(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn preview_row(event: &EventRow) -> String {
    format!(
        "| {} | {} | {} | {} | {} | {} | {} |",
        event.user_id,
        format_cell(event.lesson_id.as_deref()),
        event.start_time,
        event.end_time,
        format_cell(event.pause),
        format_cell(event.seek),
        format_cell(event.pb_type),
    )
}

fn mode_label(pb_type: Option<i64>) -> String {
    match pb_type {
        Some(crate::engine::OFFLINE_PB_TYPE) => "offline (2)".to_string(),
        Some(code) => format!("mode {code}"),
        None => "unknown".to_string(),
    }
}

pub fn build_report(
    source: &str,
    config: &ScoringConfig,
    table: &EventTable,
    breakdowns: &[UserBreakdown],
    preview_rows: usize,
) -> String {
    let summaries = summarize_by_mode(&table.events);

    let mut output = String::new();

    let _ = writeln!(output, "# Engagement Score Report");
    let _ = writeln!(
        output,
        "Generated from {} ({} rows, {} users, {})",
        source,
        table.events.len(),
        breakdowns.len(),
        config.completion.label()
    );
    if table.skipped_rows > 0 {
        let _ = writeln!(
            output,
            "{} rows without a user_id were skipped.",
            table.skipped_rows
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Uploaded Data");

    if table.events.is_empty() {
        let _ = writeln!(output, "No playback events in this upload.");
    } else {
        let _ = writeln!(
            output,
            "| user_id | lesson_id | start_time | end_time | _pause | _seek | _pb_type |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|");
        for event in table.events.iter().take(preview_rows) {
            let _ = writeln!(output, "{}", preview_row(event));
        }
        if table.events.len() > preview_rows {
            let _ = writeln!(
                output,
                "\n_{} more rows not shown._",
                table.events.len() - preview_rows
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Playback Modes");

    if summaries.is_empty() {
        let _ = writeln!(output, "No playback events in this upload.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} rows ({:.1}%)",
                mode_label(summary.pb_type),
                summary.count,
                summary.share_pct
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Calculated Scores");

    if breakdowns.is_empty() {
        let _ = writeln!(output, "No users to score.");
    } else {
        let _ = writeln!(
            output,
            "| user_id | interaction_score | offline_score | session_score | total_score |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|");
        for breakdown in breakdowns {
            let score = &breakdown.score;
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {:.2} |",
                score.user_id,
                score.interaction_score,
                score.offline_score,
                score.session_score,
                score.total_score
            );
        }
    }

    let fragmented: Vec<&UserBreakdown> = breakdowns
        .iter()
        .filter(|breakdown| !breakdown.fragmented_lessons.is_empty())
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Fragmented Lessons");

    if fragmented.is_empty() {
        let _ = writeln!(output, "No lesson was watched in more than five sessions.");
    } else {
        for breakdown in fragmented {
            for lesson in breakdown.fragmented_lessons.iter() {
                let _ = writeln!(
                    output,
                    "- {} / {}: {} sessions",
                    breakdown.score.user_id, lesson.lesson_id, lesson.session_count
                );
            }
        }
    }

    if config.catalog.is_some() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Module Coverage");
        let _ = match config.module_gate {
            ModuleGate::Report => writeln!(output, "Coverage is reported only; scores are unaffected."),
            ModuleGate::Enforce => writeln!(
                output,
                "Modules below 70% coverage are excluded from interaction scoring."
            ),
        };

        let mut any = false;
        for breakdown in breakdowns {
            for module in breakdown.module_coverage.iter() {
                any = true;
                let _ = writeln!(
                    output,
                    "- {} / {}: {} of {} videos ({:.1}%){}",
                    breakdown.score.user_id,
                    module.topic_title,
                    module.watched_lessons,
                    module.expected_videos,
                    module.coverage_pct,
                    if module.passed { "" } else { " below threshold" }
                );
            }
        }
        if !any {
            let _ = writeln!(output, "No catalogued modules among eligible rows.");
        }
    }

    output
}
