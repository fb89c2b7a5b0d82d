use super::config::RewardConfig;

/// Everything one step's reward depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardInputs {
    /// Hunter/prey distance before the step, in cells
    pub prev_distance: f32,
    /// Hunter/prey distance after the step, in cells
    pub new_distance: f32,
    pub caught: bool,
    /// Step budget exhausted without a capture
    pub timed_out: bool,
    pub hunter_blocked: bool,
    pub prey_blocked: bool,
}

/// Compute the `(hunter, prey)` reward pair for one step
///
/// A capture pays the flat capture reward and nothing else. Otherwise the
/// hunter earns the scaled reduction in distance and the prey the exact
/// negation, each mover pays its own wall penalty, and a timeout moves the
/// flat timeout reward from hunter to prey.
pub fn compute_rewards(config: &RewardConfig, inputs: RewardInputs) -> (f32, f32) {
    if inputs.caught {
        return (config.capture_reward, -config.capture_reward);
    }

    let shaping = config.shaping_scale * (inputs.prev_distance - inputs.new_distance);
    let mut hunter = shaping;
    let mut prey = -shaping;

    // Only the mover pays, so the pair stops summing to zero here
    if inputs.hunter_blocked {
        hunter += config.wall_penalty;
    }
    if inputs.prey_blocked {
        prey += config.wall_penalty;
    }

    if inputs.timed_out {
        hunter -= config.timeout_reward;
        prey += config.timeout_reward;
    }

    (hunter, prey)
}
