//! Privilege decay: as an agent loop runs longer, the set of tools it
//! may call shrinks on a fixed schedule.

/// `(step_threshold, fraction)` pairs, evaluated largest-threshold-first.
/// At step `s`, the schedule entry with the largest `step_threshold <= s`
/// applies; below the smallest threshold, no decay applies at all.
#[derive(Debug, Clone)]
pub struct DecaySchedule {
    steps: Vec<(u64, f64)>,
}

impl Default for DecaySchedule {
    fn default() -> Self {
        Self {
            steps: vec![(10, 0.75), (15, 0.5), (20, 0.25)],
        }
    }
}

impl DecaySchedule {
    pub fn new(mut steps: Vec<(u64, f64)>) -> Self {
        steps.sort_by_key(|(threshold, _)| *threshold);
        Self { steps }
    }

    fn fraction_for(&self, step: u64) -> f64 {
        self.steps
            .iter()
            .rev()
            .find(|(threshold, _)| step >= *threshold)
            .map(|(_, fraction)| *fraction)
            .unwrap_or(1.0)
    }
}

/// Apply the decay schedule to `tools` at the given loop `step`,
/// preserving order (earlier entries are treated as higher priority).
/// Monotone non-increasing in `step`; always keeps at least one tool
/// when `tools` is non-empty.
pub fn apply_decay<T: Clone>(tools: &[T], step: u64, schedule: &DecaySchedule) -> Vec<T> {
    if tools.is_empty() {
        return Vec::new();
    }
    let fraction = schedule.fraction_for(step);
    let keep = ((tools.len() as f64) * fraction).floor() as usize;
    let keep = keep.max(1).min(tools.len());
    tools[..keep].to_vec()
}
