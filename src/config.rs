use clap::ValueEnum;

use crate::catalog::ModuleCatalog;
use crate::timestamp;

/// Which completion filter gates rows into interaction scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CompletionPolicy {
    /// Every row is eligible.
    #[value(name = "none")]
    Unfiltered,
    /// Per lesson: played minutes over the lesson's wall-clock span.
    #[default]
    Duration,
    /// Per row: `actual_hours * speed / duration`.
    Speed,
}

impl CompletionPolicy {
    /// Columns the input table must carry for this policy.
    pub fn required_columns(self) -> Vec<&'static str> {
        let mut columns = vec![
            "user_id",
            "_pause",
            "_seek",
            "_pb_type",
            "start_time",
            "end_time",
            "lesson_id",
        ];
        match self {
            CompletionPolicy::Unfiltered => {}
            CompletionPolicy::Duration => columns.push("playback_minutes"),
            CompletionPolicy::Speed => columns.extend(["actual_hours", "speed", "duration"]),
        }
        columns
    }

    pub fn label(self) -> &'static str {
        match self {
            CompletionPolicy::Unfiltered => "no completion filter",
            CompletionPolicy::Duration => "duration-based completion",
            CompletionPolicy::Speed => "speed-based completion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TimeUnit {
    /// Textual calendar timestamps.
    #[default]
    Calendar,
    /// Raw epoch-millisecond numbers.
    Millis,
}

impl TimeUnit {
    /// Maps a raw timestamp cell onto a millisecond scale shared by both units.
    pub fn parse(self, raw: &str) -> Option<i64> {
        match self {
            TimeUnit::Calendar => timestamp::parse_calendar(raw),
            TimeUnit::Millis => timestamp::parse_millis(raw),
        }
    }
}

/// What the module-coverage check does once it has been computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModuleGate {
    /// Coverage is reported but does not change any score.
    #[default]
    Report,
    /// Rows of modules below the coverage threshold lose interaction eligibility.
    Enforce,
}

#[derive(Debug, Clone, Default)]
pub struct ScoringConfig {
    pub completion: CompletionPolicy,
    pub time_unit: TimeUnit,
    pub clamp_session_score: bool,
    pub module_gate: ModuleGate,
    pub catalog: Option<ModuleCatalog>,
}

impl ScoringConfig {
    pub fn with_completion(mut self, completion: CompletionPolicy) -> Self {
        self.completion = completion;
        self
    }

    pub fn with_time_unit(mut self, time_unit: TimeUnit) -> Self {
        self.time_unit = time_unit;
        self
    }

    pub fn with_catalog(mut self, catalog: ModuleCatalog, gate: ModuleGate) -> Self {
        self.catalog = Some(catalog);
        self.module_gate = gate;
        self
    }
}

/// Validate scoring configuration before any input is read.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    match &config.catalog {
        None if config.module_gate == ModuleGate::Enforce => {
            errors.push("module_gate: 'enforce' requires a module catalog".to_string());
        }
        None => {}
        Some(catalog) => {
            if catalog.is_empty() {
                errors.push("module_catalog: contains no modules".to_string());
            }
            for (title, count) in catalog.iter() {
                if count == 0 {
                    errors.push(format!(
                        "module_catalog['{}']: video_count must be greater than zero",
                        title
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
