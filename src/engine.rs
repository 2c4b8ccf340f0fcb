use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::catalog::ModuleCatalog;
use crate::config::{CompletionPolicy, ModuleGate, ScoringConfig};
use crate::models::{EventRow, FragmentedLesson, ModuleCoverage, ScoreRow, UserBreakdown};
use crate::timestamp::MILLIS_PER_MINUTE;

pub const MAX_SUBSCORE: i32 = 10;
pub const COMPLETION_THRESHOLD_PCT: f64 = 90.0;
pub const MODULE_COVERAGE_THRESHOLD_PCT: f64 = 70.0;
pub const LOW_INTERACTION_LIMIT: i64 = 3;
pub const OFFLINE_PB_TYPE: i64 = 2;
pub const SESSION_GAP_MILLIS: i64 = MILLIS_PER_MINUTE;
pub const MAX_SESSIONS_PER_LESSON: usize = 5;

/// Per-call view of an input row with its parsed and derived values.
#[derive(Debug)]
struct DerivedRow<'a> {
    event: &'a EventRow,
    start: Option<i64>,
    end: Option<i64>,
    completion_pct: Option<f64>,
}

impl<'a> DerivedRow<'a> {
    fn new(event: &'a EventRow, config: &ScoringConfig) -> Self {
        let completion_pct = match config.completion {
            CompletionPolicy::Speed => {
                completion_percentage(event.actual_hours, event.speed, event.duration)
            }
            CompletionPolicy::Unfiltered | CompletionPolicy::Duration => None,
        };

        Self {
            event,
            start: config.time_unit.parse(&event.start_time),
            end: config.time_unit.parse(&event.end_time),
            completion_pct,
        }
    }

    fn lesson_id(&self) -> Option<&'a str> {
        self.event.lesson_id.as_deref()
    }

    fn is_low_interaction(&self) -> bool {
        match (self.event.pause, self.event.seek) {
            (Some(pause), Some(seek)) => pause.saturating_add(seek) < LOW_INTERACTION_LIMIT,
            _ => false,
        }
    }

    fn is_offline(&self) -> bool {
        self.event.pb_type == Some(OFFLINE_PB_TYPE)
    }
}

/// Scores every user in `events`, one row per distinct `user_id`, ordered by id.
pub fn compute_scores(events: &[EventRow], config: &ScoringConfig) -> Vec<ScoreRow> {
    score_users(events, config)
        .into_iter()
        .map(|breakdown| breakdown.score)
        .collect()
}

/// Same computation as [`compute_scores`], keeping the intermediate figures.
pub fn score_users(events: &[EventRow], config: &ScoringConfig) -> Vec<UserBreakdown> {
    let mut users: BTreeMap<&str, Vec<&EventRow>> = BTreeMap::new();
    for event in events {
        users.entry(event.user_id.as_str()).or_default().push(event);
    }

    users
        .into_iter()
        .map(|(user_id, rows)| score_user(user_id, &rows, config))
        .collect()
}

fn score_user(user_id: &str, rows: &[&EventRow], config: &ScoringConfig) -> UserBreakdown {
    let derived: Vec<DerivedRow> = rows
        .iter()
        .map(|event| DerivedRow::new(*event, config))
        .collect();
    let lessons = group_by_lesson(&derived);

    let mut eligible = eligible_rows(&derived, &lessons, config.completion);
    let module_coverage = match &config.catalog {
        Some(catalog) => {
            let coverage = module_coverage(&eligible, catalog);
            if config.module_gate == ModuleGate::Enforce {
                eligible.retain(|row| {
                    row.event
                        .topic_title
                        .as_deref()
                        .and_then(|topic| coverage.iter().find(|c| c.topic_title == topic.trim()))
                        .is_none_or(|c| c.passed)
                });
            }
            coverage
        }
        None => Vec::new(),
    };

    let low_interaction_pct = percentage(
        eligible.iter().filter(|row| row.is_low_interaction()).count(),
        eligible.len(),
    );
    let interaction_score = interaction_tier(low_interaction_pct);

    let offline_pct = percentage(
        derived.iter().filter(|row| row.is_offline()).count(),
        derived.len(),
    );
    let offline_score = offline_tier(offline_pct);

    let fragmented_lessons: Vec<FragmentedLesson> = lessons
        .iter()
        .map(|(lesson_id, rows)| FragmentedLesson {
            lesson_id: lesson_id.to_string(),
            session_count: session_count(rows),
        })
        .filter(|lesson| lesson.session_count > MAX_SESSIONS_PER_LESSON)
        .collect();

    let mut session_score = MAX_SUBSCORE - fragmented_lessons.len() as i32;
    if config.clamp_session_score {
        session_score = session_score.max(0);
    }

    let total_score = f64::from(interaction_score + offline_score + session_score) / 3.0;

    debug!(
        user_id,
        rows = derived.len(),
        eligible = eligible.len(),
        low_interaction_pct,
        offline_pct,
        fragmented = fragmented_lessons.len(),
        total_score,
        "scored user"
    );

    UserBreakdown {
        score: ScoreRow {
            user_id: user_id.to_string(),
            interaction_score,
            offline_score,
            session_score,
            total_score,
        },
        row_count: derived.len(),
        lesson_count: lessons.len(),
        eligible_count: eligible.len(),
        low_interaction_pct,
        offline_pct,
        fragmented_lessons,
        module_coverage,
    }
}

fn group_by_lesson<'r, 'a>(
    rows: &'r [DerivedRow<'a>],
) -> BTreeMap<&'a str, Vec<&'r DerivedRow<'a>>> {
    let mut lessons: BTreeMap<&'a str, Vec<&'r DerivedRow<'a>>> = BTreeMap::new();
    for row in rows {
        if let Some(lesson_id) = row.lesson_id() {
            lessons.entry(lesson_id).or_default().push(row);
        }
    }
    lessons
}

fn eligible_rows<'r, 'a>(
    rows: &'r [DerivedRow<'a>],
    lessons: &BTreeMap<&'a str, Vec<&'r DerivedRow<'a>>>,
    policy: CompletionPolicy,
) -> Vec<&'r DerivedRow<'a>> {
    match policy {
        CompletionPolicy::Unfiltered => rows.iter().collect(),
        CompletionPolicy::Speed => rows
            .iter()
            .filter(|row| {
                row.completion_pct
                    .is_some_and(|pct| pct >= COMPLETION_THRESHOLD_PCT)
            })
            .collect(),
        CompletionPolicy::Duration => lessons
            .values()
            .filter(|lesson| watched_percentage(lesson) >= COMPLETION_THRESHOLD_PCT)
            .flat_map(|lesson| lesson.iter().copied())
            .collect(),
    }
}

/// Per-row completion: `actual_hours * speed / duration * 100`, 0 when the
/// duration is 0 and unknown when any input is blank.
pub fn completion_percentage(
    actual_hours: Option<f64>,
    speed: Option<f64>,
    duration: Option<f64>,
) -> Option<f64> {
    let (hours, speed, duration) = (actual_hours?, speed?, duration?);
    if duration == 0.0 {
        return Some(0.0);
    }
    Some(hours * speed / duration * 100.0)
}

/// Played minutes of a lesson over its span from first start to last end.
fn watched_percentage(lesson: &[&DerivedRow]) -> f64 {
    let played: f64 = lesson
        .iter()
        .filter_map(|row| row.event.playback_minutes)
        .sum();
    let first_start = lesson.iter().filter_map(|row| row.start).min();
    let last_end = lesson.iter().filter_map(|row| row.end).max();

    let span_minutes = match (first_start, last_end) {
        (Some(start), Some(end)) => end
            .checked_sub(start)
            .map_or(0.0, |span| span as f64 / MILLIS_PER_MINUTE as f64),
        _ => 0.0,
    };

    if span_minutes > 0.0 {
        played / span_minutes * 100.0
    } else {
        0.0
    }
}

fn module_coverage(eligible: &[&DerivedRow], catalog: &ModuleCatalog) -> Vec<ModuleCoverage> {
    let mut watched: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for row in eligible {
        let Some(topic) = row.event.topic_title.as_deref().map(str::trim) else {
            continue;
        };
        if catalog.expected_videos(topic).is_none() {
            continue;
        }
        let lessons = watched.entry(topic).or_default();
        if let Some(lesson_id) = row.lesson_id() {
            lessons.insert(lesson_id);
        }
    }

    watched
        .into_iter()
        .filter_map(|(topic, lessons)| {
            let expected_videos = catalog.expected_videos(topic)?;
            let coverage_pct = percentage(lessons.len(), expected_videos as usize);
            Some(ModuleCoverage {
                topic_title: topic.to_string(),
                watched_lessons: lessons.len(),
                expected_videos,
                coverage_pct,
                passed: coverage_pct >= MODULE_COVERAGE_THRESHOLD_PCT,
            })
        })
        .collect()
}

/// Counts sessions in one lesson: rows ordered by start, a new session begins
/// whenever the gap since the previous row's end exceeds one minute.
fn session_count(lesson: &[&DerivedRow]) -> usize {
    let mut ordered = lesson.to_vec();
    ordered.sort_by_key(|row| (row.start.is_none(), row.start));

    let breaks = ordered
        .windows(2)
        .filter_map(|pair| pair[1].start?.checked_sub(pair[0].end?))
        .filter(|gap| *gap > SESSION_GAP_MILLIS)
        .count();

    breaks + 1
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn interaction_tier(low_interaction_pct: f64) -> i32 {
    if low_interaction_pct >= 80.0 {
        10
    } else if low_interaction_pct >= 50.0 {
        8
    } else {
        5
    }
}

pub fn offline_tier(offline_pct: f64) -> i32 {
    if offline_pct >= 90.0 {
        10
    } else if offline_pct >= 50.0 {
        9
    } else {
        5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeUnit;

    fn event(user: &str, lesson: &str, start: &str, end: &str) -> EventRow {
        EventRow {
            user_id: user.to_string(),
            lesson_id: Some(lesson.to_string()),
            start_time: start.to_string(),
            end_time: end.to_string(),
            pause: Some(0),
            seek: Some(0),
            pb_type: Some(1),
            ..EventRow::default()
        }
    }

    fn unfiltered() -> ScoringConfig {
        ScoringConfig::default().with_completion(CompletionPolicy::Unfiltered)
    }

    /// Rows for one lesson split into `parts` one-minute intervals, each
    /// followed by a five-minute pause.
    fn fragmented_lesson(user: &str, lesson: &str, parts: usize) -> Vec<EventRow> {
        (0..parts)
            .map(|i| {
                let start = (i * 6) as i64 * MILLIS_PER_MINUTE;
                let end = start + MILLIS_PER_MINUTE;
                event(user, lesson, &start.to_string(), &end.to_string())
            })
            .collect()
    }

    fn millis(completion: CompletionPolicy) -> ScoringConfig {
        ScoringConfig::default()
            .with_completion(completion)
            .with_time_unit(TimeUnit::Millis)
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(interaction_tier(100.0), 10);
        assert_eq!(interaction_tier(80.0), 10);
        assert_eq!(interaction_tier(79.9), 8);
        assert_eq!(interaction_tier(50.0), 8);
        assert_eq!(interaction_tier(49.9), 5);
        assert_eq!(interaction_tier(0.0), 5);

        assert_eq!(offline_tier(90.0), 10);
        assert_eq!(offline_tier(89.9), 9);
        assert_eq!(offline_tier(50.0), 9);
        assert_eq!(offline_tier(10.0), 5);
    }

    #[test]
    fn single_offline_row_scores_full_marks() {
        let mut row = event("u1", "l1", "2024-03-01 10:00:00", "2024-03-01 10:20:00");
        row.pb_type = Some(2);

        let scores = compute_scores(&[row], &unfiltered());
        assert_eq!(scores.len(), 1);
        let score = &scores[0];
        assert_eq!(score.interaction_score, 10);
        assert_eq!(score.offline_score, 10);
        assert_eq!(score.session_score, 10);
        assert_eq!(score.total_score, 10.0);
    }

    #[test]
    fn seven_sessions_in_one_lesson_cost_a_point() {
        let rows = fragmented_lesson("u1", "l1", 7);
        let breakdown = score_users(&rows, &millis(CompletionPolicy::Unfiltered));
        assert_eq!(breakdown[0].score.session_score, 9);
        assert_eq!(
            breakdown[0].fragmented_lessons,
            vec![FragmentedLesson {
                lesson_id: "l1".to_string(),
                session_count: 7
            }]
        );
    }

    #[test]
    fn five_sessions_are_tolerated() {
        let rows = fragmented_lesson("u1", "l1", 5);
        let scores = compute_scores(&rows, &millis(CompletionPolicy::Unfiltered));
        assert_eq!(scores[0].session_score, 10);
    }

    #[test]
    fn gaps_of_exactly_one_minute_do_not_split_sessions() {
        let rows: Vec<EventRow> = (0..8)
            .map(|i| {
                let start = i as i64 * 2 * MILLIS_PER_MINUTE;
                let end = start + MILLIS_PER_MINUTE;
                event("u1", "l1", &start.to_string(), &end.to_string())
            })
            .collect();
        let scores = compute_scores(&rows, &millis(CompletionPolicy::Unfiltered));
        assert_eq!(scores[0].session_score, 10);
    }

    #[test]
    fn session_rows_are_ordered_by_start_time() {
        let mut rows = fragmented_lesson("u1", "l1", 7);
        rows.reverse();
        let scores = compute_scores(&rows, &millis(CompletionPolicy::Unfiltered));
        assert_eq!(scores[0].session_score, 9);
    }

    #[test]
    fn session_penalty_accumulates_and_may_go_negative() {
        let mut rows = Vec::new();
        for lesson in 0..12 {
            rows.extend(fragmented_lesson("u1", &format!("l{lesson}"), 6));
        }

        let scores = compute_scores(&rows, &millis(CompletionPolicy::Unfiltered));
        assert_eq!(scores[0].session_score, -2);

        let mut clamped = millis(CompletionPolicy::Unfiltered);
        clamped.clamp_session_score = true;
        let scores = compute_scores(&rows, &clamped);
        assert_eq!(scores[0].session_score, 0);
    }

    #[test]
    fn unparseable_timestamps_drop_out_of_gap_counting() {
        let mut rows = fragmented_lesson("u1", "l1", 7);
        rows[3].start_time = "garbage".to_string();
        rows[5].end_time = String::new();

        // Row 3 sorts last with no start and row 5 has no end, so two gaps
        // drop out and five sessions remain.
        let scores = compute_scores(&rows, &millis(CompletionPolicy::Unfiltered));
        assert_eq!(scores[0].session_score, 10);
    }

    #[test]
    fn speed_policy_with_zero_duration_leaves_nothing_eligible() {
        let rows: Vec<EventRow> = (0..3)
            .map(|_| EventRow {
                actual_hours: Some(1.0),
                speed: Some(1.5),
                duration: Some(0.0),
                ..event("u1", "l1", "2024-03-01 10:00:00", "2024-03-01 10:10:00")
            })
            .collect();

        let config = ScoringConfig::default().with_completion(CompletionPolicy::Speed);
        let breakdown = score_users(&rows, &config);
        assert_eq!(breakdown[0].eligible_count, 0);
        assert_eq!(breakdown[0].score.interaction_score, 5);
    }

    #[test]
    fn speed_policy_filters_rows_individually() {
        let complete = EventRow {
            actual_hours: Some(0.5),
            speed: Some(2.0),
            duration: Some(1.0),
            ..event("u1", "l1", "2024-03-01 10:00:00", "2024-03-01 10:10:00")
        };
        let partial = EventRow {
            actual_hours: Some(0.25),
            speed: Some(1.0),
            duration: Some(1.0),
            pause: Some(4),
            ..complete.clone()
        };
        let missing = EventRow {
            actual_hours: None,
            pause: Some(9),
            ..complete.clone()
        };

        let config = ScoringConfig::default().with_completion(CompletionPolicy::Speed);
        let breakdown = score_users(&[complete, partial, missing], &config);
        assert_eq!(breakdown[0].eligible_count, 1);
        assert_eq!(breakdown[0].score.interaction_score, 10);
    }

    #[test]
    fn completion_percentage_handles_zero_and_blank() {
        assert_eq!(completion_percentage(Some(1.0), Some(1.0), Some(0.0)), Some(0.0));
        assert_eq!(completion_percentage(Some(0.9), Some(1.0), Some(1.0)), Some(90.0));
        assert_eq!(completion_percentage(None, Some(1.0), Some(1.0)), None);
    }

    #[test]
    fn duration_policy_keeps_only_watched_lessons() {
        // l1: 10 played minutes over a 10 minute span, low interaction.
        let watched = EventRow {
            playback_minutes: Some(10.0),
            ..event("u1", "l1", "2024-03-01 10:00:00", "2024-03-01 10:10:00")
        };
        // l2: 2 played minutes over a 10 minute span, heavy interaction.
        let skimmed = EventRow {
            playback_minutes: Some(2.0),
            pause: Some(5),
            seek: Some(5),
            ..event("u1", "l2", "2024-03-01 11:00:00", "2024-03-01 11:10:00")
        };

        let config = ScoringConfig::default();
        let breakdown = score_users(&[watched.clone(), skimmed.clone()], &config);
        assert_eq!(breakdown[0].eligible_count, 1);
        assert_eq!(breakdown[0].score.interaction_score, 10);

        let breakdown = score_users(&[watched, skimmed], &unfiltered());
        assert_eq!(breakdown[0].eligible_count, 2);
        assert_eq!(breakdown[0].score.interaction_score, 8);
    }

    #[test]
    fn duration_policy_sums_across_lesson_rows() {
        let rows = vec![
            EventRow {
                playback_minutes: Some(5.0),
                ..event("u1", "l1", "2024-03-01 10:00:00", "2024-03-01 10:05:00")
            },
            EventRow {
                playback_minutes: Some(4.5),
                ..event("u1", "l1", "2024-03-01 10:05:00", "2024-03-01 10:10:00")
            },
        ];
        let breakdown = score_users(&rows, &ScoringConfig::default());
        assert_eq!(breakdown[0].eligible_count, 2);
    }

    #[test]
    fn duration_policy_with_no_span_is_not_eligible() {
        let row = EventRow {
            playback_minutes: Some(10.0),
            ..event("u1", "l1", "bad", "2024-03-01 10:10:00")
        };
        let breakdown = score_users(&[row], &ScoringConfig::default());
        assert_eq!(breakdown[0].eligible_count, 0);
        assert_eq!(breakdown[0].score.interaction_score, 5);
    }

    #[test]
    fn offline_share_uses_every_row() {
        let mut rows: Vec<EventRow> = (0..4)
            .map(|i| event("u1", &format!("l{i}"), "bad", "bad"))
            .collect();
        rows[0].pb_type = Some(2);
        rows[1].pb_type = Some(2);

        let breakdown = score_users(&rows, &ScoringConfig::default());
        assert_eq!(breakdown[0].offline_pct, 50.0);
        assert_eq!(breakdown[0].score.offline_score, 9);
        assert_eq!(breakdown[0].eligible_count, 0);
    }

    #[test]
    fn no_offline_rows_score_five() {
        let rows = vec![
            event("u1", "l1", "2024-03-01 10:00:00", "2024-03-01 10:10:00"),
            event("u1", "l2", "2024-03-01 11:00:00", "2024-03-01 11:10:00"),
        ];
        let scores = compute_scores(&rows, &unfiltered());
        assert_eq!(scores[0].offline_score, 5);
    }

    #[test]
    fn blank_counts_are_not_low_interaction() {
        let rows = vec![
            EventRow {
                pause: None,
                ..event("u1", "l1", "2024-03-01 10:00:00", "2024-03-01 10:10:00")
            },
            event("u1", "l1", "2024-03-01 10:10:00", "2024-03-01 10:20:00"),
        ];
        let breakdown = score_users(&rows, &unfiltered());
        assert_eq!(breakdown[0].low_interaction_pct, 50.0);
        assert_eq!(breakdown[0].score.interaction_score, 8);
    }

    #[test]
    fn rows_without_lesson_count_for_offline_but_not_sessions() {
        let mut rows = fragmented_lesson("u1", "l1", 7);
        for row in rows.iter_mut() {
            row.lesson_id = None;
            row.pb_type = Some(2);
        }
        let breakdown = score_users(&rows, &millis(CompletionPolicy::Unfiltered));
        assert_eq!(breakdown[0].lesson_count, 0);
        assert_eq!(breakdown[0].score.session_score, 10);
        assert_eq!(breakdown[0].score.offline_score, 10);
    }

    #[test]
    fn one_row_per_user_sorted_by_id() {
        let rows = vec![
            event("carol", "l1", "2024-03-01 10:00:00", "2024-03-01 10:10:00"),
            event("alice", "l1", "2024-03-01 10:00:00", "2024-03-01 10:10:00"),
            event("carol", "l2", "2024-03-01 11:00:00", "2024-03-01 11:10:00"),
            event("bob", "l3", "2024-03-01 12:00:00", "2024-03-01 12:10:00"),
        ];
        let scores = compute_scores(&rows, &ScoringConfig::default());
        let ids: Vec<&str> = scores.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn empty_input_yields_no_scores() {
        assert!(compute_scores(&[], &ScoringConfig::default()).is_empty());
    }

    #[test]
    fn total_is_exact_mean_within_subscore_bounds() {
        let mut rows = fragmented_lesson("u1", "l1", 7);
        rows.extend(fragmented_lesson("u2", "l1", 2));
        rows[0].pb_type = Some(2);
        rows[8].pause = Some(10);

        for score in compute_scores(&rows, &millis(CompletionPolicy::Unfiltered)) {
            let subscores = [
                score.interaction_score,
                score.offline_score,
                score.session_score,
            ];
            let mean = f64::from(subscores.iter().sum::<i32>()) / 3.0;
            assert!((score.total_score - mean).abs() < 1e-12);
            assert!(score.total_score >= f64::from(*subscores.iter().min().unwrap()));
            assert!(score.total_score <= f64::from(*subscores.iter().max().unwrap()));
            assert!([5, 8, 10].contains(&score.interaction_score));
            assert!([5, 9, 10].contains(&score.offline_score));
            assert!(score.session_score <= 10);
        }
    }

    #[test]
    fn extreme_counts_saturate_instead_of_overflowing() {
        let rows = vec![
            EventRow {
                pause: Some(i64::MAX),
                seek: Some(1),
                ..event("u1", "l1", "0", "60000")
            },
            EventRow {
                pause: Some(i64::MIN),
                seek: Some(-1),
                ..event("u1", "l1", "60000", "120000")
            },
        ];
        let breakdown = score_users(&rows, &millis(CompletionPolicy::Unfiltered));
        // The saturated minimum still counts as low interaction.
        assert_eq!(breakdown[0].low_interaction_pct, 50.0);
    }

    #[test]
    fn extreme_millis_spans_do_not_overflow() {
        let wide = EventRow {
            playback_minutes: Some(10.0),
            ..event("u1", "l1", "-9000000000000000000", "9000000000000000000")
        };
        let breakdown = score_users(&[wide], &millis(CompletionPolicy::Duration));
        assert_eq!(breakdown[0].eligible_count, 0);
        assert_eq!(breakdown[0].score.session_score, 10);

        let rows = vec![
            event("u1", "l1", "-9000000000000000000", "9000000000000000000"),
            event("u1", "l1", "-9000000000000000000", "9000000000000000000"),
            event("u1", "l1", "9000000000000000000", "9100000000000000000"),
        ];
        let scores = compute_scores(&rows, &millis(CompletionPolicy::Unfiltered));
        assert_eq!(scores[0].session_score, 10);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut rows = fragmented_lesson("u1", "l1", 7);
        rows.extend(fragmented_lesson("u2", "l9", 3));
        let config = millis(CompletionPolicy::Duration);
        assert_eq!(compute_scores(&rows, &config), compute_scores(&rows, &config));
    }

    fn topic_rows() -> Vec<EventRow> {
        let topic = |lesson: &str, topic: &str, pause: i64| EventRow {
            topic_title: Some(topic.to_string()),
            pause: Some(pause),
            ..event("u1", lesson, "2024-03-01 10:00:00", "2024-03-01 10:10:00")
        };
        vec![
            topic("a1", "Algebra", 0),
            topic("a2", "Algebra", 0),
            topic("a3", "Algebra", 0),
            topic("g1", "Geometry", 9),
            topic("x1", "Unlisted", 9),
        ]
    }

    #[test]
    fn module_gate_reports_without_changing_scores() {
        let catalog = ModuleCatalog::new([("Algebra", 4), ("Geometry", 5)]);
        let config = unfiltered().with_catalog(catalog, ModuleGate::Report);
        let breakdown = score_users(&topic_rows(), &config);
        let user = &breakdown[0];

        assert_eq!(user.module_coverage.len(), 2);
        let algebra = &user.module_coverage[0];
        assert_eq!(algebra.topic_title, "Algebra");
        assert_eq!(algebra.watched_lessons, 3);
        assert_eq!(algebra.coverage_pct, 75.0);
        assert!(algebra.passed);
        let geometry = &user.module_coverage[1];
        assert_eq!(geometry.coverage_pct, 20.0);
        assert!(!geometry.passed);

        assert_eq!(user.eligible_count, 5);
        assert_eq!(
            user.score,
            compute_scores(&topic_rows(), &unfiltered())[0]
        );
    }

    #[test]
    fn module_gate_enforce_drops_uncovered_modules() {
        let catalog = ModuleCatalog::new([("Algebra", 4), ("Geometry", 5)]);
        let config = unfiltered().with_catalog(catalog, ModuleGate::Enforce);
        let breakdown = score_users(&topic_rows(), &config);
        let user = &breakdown[0];

        // Geometry falls below coverage; the uncatalogued row stays.
        assert_eq!(user.eligible_count, 4);
        assert_eq!(user.low_interaction_pct, 75.0);
        assert_eq!(user.score.interaction_score, 8);
    }
}
