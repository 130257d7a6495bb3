use crate::workflow::Step;

/// Base estimate per step, in seconds.
const BASE_STEP_SECS: u64 = 30;

/// Estimates a job's duration from its step list.
///
/// Heuristic weights for ranking, not a scheduler's SLA: 30 seconds per step,
/// plus a bonus per step classified by keyword. Action references get a
/// flat 120s for build/test; command text distinguishes build (120s) from
/// test (90s) because test commands in the wild tend to be shorter than
/// full builds.
pub fn estimate_duration(steps: &[Step]) -> u64 {
    let mut estimate = steps.len() as u64 * BASE_STEP_SECS;

    for step in steps {
        if let Some(action) = &step.uses {
            if action.contains("setup-") || action.contains("cache") {
                estimate += 30;
            } else if action.contains("build") || action.contains("test") {
                estimate += 120;
            }
        } else if let Some(run) = &step.run {
            let command = run.to_lowercase();
            if command.contains("npm install") || command.contains("yarn install") {
                estimate += 60;
            } else if command.contains("build") {
                estimate += 120;
            } else if command.contains("test") {
                estimate += 90;
            }
        }
    }

    estimate
}

/// Whether a job is safe to run in parallel with its siblings.
///
/// Deployment and release steps are assumed to be order-sensitive.
pub fn can_parallelize(steps: &[Step]) -> bool {
    !steps.iter().any(|step| {
        let text = step.text().to_lowercase();
        text.contains("deploy") || text.contains("release")
    })
}
