use serde::Serialize;

/// One playback interaction as read from the uploaded table.
///
/// Timestamps are kept as the raw cell text; the engine parses them
/// according to the active [`crate::config::TimeUnit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRow {
    pub user_id: String,
    pub lesson_id: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub playback_minutes: Option<f64>,
    pub actual_hours: Option<f64>,
    pub speed: Option<f64>,
    pub duration: Option<f64>,
    pub pause: Option<i64>,
    pub seek: Option<i64>,
    pub pb_type: Option<i64>,
    pub topic_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub user_id: String,
    pub interaction_score: i32,
    pub offline_score: i32,
    pub session_score: i32,
    pub total_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleCoverage {
    pub topic_title: String,
    pub watched_lessons: usize,
    pub expected_videos: u32,
    pub coverage_pct: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentedLesson {
    pub lesson_id: String,
    pub session_count: usize,
}

/// A user's score together with the figures it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct UserBreakdown {
    pub score: ScoreRow,
    pub row_count: usize,
    pub lesson_count: usize,
    pub eligible_count: usize,
    pub low_interaction_pct: f64,
    pub offline_pct: f64,
    pub fragmented_lessons: Vec<FragmentedLesson>,
    pub module_coverage: Vec<ModuleCoverage>,
}

#[derive(Debug, Clone)]
pub struct PlaybackModeSummary {
    pub pb_type: Option<i64>,
    pub count: usize,
    pub share_pct: f64,
}
