//! Pathway unlock calculation.

/// Derived unlock state of a pathway's module sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct UnlockState {
    /// Prefix length of the module sequence the learner may access
    pub unlocked_count: usize,

    /// Index of the first unlocked, incomplete module. `None` when the
    /// learner has completed everything currently unlocked.
    pub current_module: Option<usize>,
}

/// Compute how far into a pathway a learner may go.
///
/// `completed` holds the per-module completion flags in pathway order;
/// `progress_percent` is the stored pathway percentage. The learner is
/// always allowed to attempt the module right after their last completed
/// one, even when the stored percentage lags behind; conversely a
/// percentage override can unlock further ahead than completions alone
/// would.
pub fn unlock(completed: &[bool], progress_percent: f32) -> UnlockState {
    let total = completed.len();
    if total == 0 {
        return UnlockState {
            unlocked_count: 0,
            current_module: None,
        };
    }

    let completed_count = completed.iter().filter(|c| **c).count();
    let ratio = progress_percent.clamp(0.0, 100.0) / 100.0;
    let by_progress = (ratio * total as f32).ceil() as usize;
    let unlocked_count = (completed_count + 1).max(by_progress).min(total);

    let current_module = completed
        .iter()
        .take(unlocked_count)
        .position(|done| !done);

    UnlockState {
        unlocked_count,
        current_module,
    }
}
