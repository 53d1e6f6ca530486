use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use boid_shared::{BehaviorState, ControlUpdate, ParameterState, SimulationConfig};

use crate::behavior::{AvoidanceParams, BiasParams, NeighborParams, SpeedLimits, TickParameters};
use crate::{Behavior, Parameter, ParameterGroup};

/// Parameter names, as shown to control surfaces
pub mod names {
    pub const AVOIDANCE_RANGE: &str = "Avoidance Range";
    pub const AVOIDANCE_FACTOR: &str = "Avoidance Factor";
    pub const AVOIDANCE_FOV: &str = "Avoidance FOV";
    pub const ALIGNMENT_RANGE: &str = "Alignment Range";
    pub const ALIGNMENT_FACTOR: &str = "Alignment Factor";
    pub const COHESION_RANGE: &str = "Cohesion Range";
    pub const COHESION_FACTOR: &str = "Cohesion Factor";
    pub const MIN_SPEED: &str = "Min Speed";
    pub const MAX_SPEED: &str = "Max Speed";
    pub const BIAS_PERCENTAGE: &str = "Percentage";
    pub const BIAS_POSITION_X: &str = "Position X";
    pub const BIAS_POSITION_Y: &str = "Position Y";
    pub const BIAS_STRENGTH: &str = "Strength";
    pub const BIAS_RADIUS: &str = "Radius";
}

struct BehaviorControl {
    enabled: AtomicBool,
    debugging: AtomicBool,
    group: Arc<ParameterGroup>,
}

impl BehaviorControl {
    fn new(behavior: Behavior) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            debugging: AtomicBool::new(false),
            group: Arc::new(default_group(behavior)),
        }
    }
}

fn default_group(behavior: Behavior) -> ParameterGroup {
    use names::*;

    let category = behavior.name();
    let mut group = ParameterGroup::new(category);
    let mut add = |name: &str, description: &str, min: f32, default: f32, max: f32| {
        group.add_parameter(Parameter::new(category, name, description, min, default, max));
    };

    match behavior {
        Behavior::Avoidance => {
            add(AVOIDANCE_RANGE, "Perception range for avoidance", 0.0, 30.0, 100.0);
            add(AVOIDANCE_FACTOR, "Strength of avoidance", 0.0, 0.5, 1.0);
            add(AVOIDANCE_FOV, "Field of view for avoidance, in degrees", 0.0, 270.0, 360.0);
        }
        Behavior::Alignment => {
            add(ALIGNMENT_RANGE, "Perception range for alignment", 0.0, 50.0, 100.0);
            add(
                ALIGNMENT_FACTOR,
                "How strongly a boid matches the average velocity of its neighbors",
                0.0,
                0.1,
                0.2,
            );
        }
        Behavior::Cohesion => {
            add(COHESION_RANGE, "Perception range for cohesion", 0.0, 50.0, 100.0);
            add(
                COHESION_FACTOR,
                "How strongly a boid steers toward the center of its neighbors",
                0.0,
                0.025,
                0.05,
            );
        }
        Behavior::SpeedLimiter => {
            add(MIN_SPEED, "Minimum speed a boid can travel at", 0.0, 3.0, 10.0);
            add(MAX_SPEED, "Maximum speed a boid can travel at", 0.0, 6.0, 10.0);
        }
        Behavior::Bias => {
            add(BIAS_PERCENTAGE, "Percentage of boids the bias applies to", 0.0, 50.0, 100.0);
            add(
                BIAS_POSITION_X,
                "X position of the bias target, as a fraction of the width",
                0.0,
                0.5,
                1.0,
            );
            add(
                BIAS_POSITION_Y,
                "Y position of the bias target, as a fraction of the height",
                0.0,
                0.5,
                1.0,
            );
            add(
                BIAS_STRENGTH,
                "How strongly biased boids are pulled toward the target",
                0.0,
                0.05,
                1.0,
            );
            add(
                BIAS_RADIUS,
                "Radius of the target area around the bias position",
                0.0,
                50.0,
                250.0,
            );
        }
        Behavior::Wrap => {}
    }

    group
}

/// Flock-wide behavior settings shared by every boid.
///
/// One parameter group and one pair of enabled/debugging flags exist per
/// behavior kind. The struct is `Send + Sync`; share it with an `Arc` between
/// the tick driver and any control surface.
pub struct FlockParameters {
    controls: [BehaviorControl; 6],
}

impl Default for FlockParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl FlockParameters {
    /// Default values for every behavior, all behaviors enabled.
    pub fn new() -> Self {
        Self {
            controls: Behavior::ALL.map(BehaviorControl::new),
        }
    }

    fn control(&self, behavior: Behavior) -> &BehaviorControl {
        &self.controls[behavior.index()]
    }

    pub fn group(&self, behavior: Behavior) -> &Arc<ParameterGroup> {
        &self.control(behavior).group
    }

    /// All groups, in [`Behavior::ALL`] order
    pub fn groups(&self) -> impl Iterator<Item = (Behavior, &Arc<ParameterGroup>)> {
        Behavior::ALL.into_iter().map(move |b| (b, self.group(b)))
    }

    pub fn is_enabled(&self, behavior: Behavior) -> bool {
        self.control(behavior).enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, behavior: Behavior, enabled: bool) {
        log::debug!("{} enabled = {}", behavior, enabled);
        self.control(behavior)
            .enabled
            .store(enabled, Ordering::Release);
    }

    pub fn is_debugging(&self, behavior: Behavior) -> bool {
        self.control(behavior).debugging.load(Ordering::Acquire)
    }

    pub fn set_debugging(&self, behavior: Behavior, debugging: bool) {
        self.control(behavior)
            .debugging
            .store(debugging, Ordering::Release);
    }

    /// First parameter with this name in any group
    pub fn find_parameter(&self, name: &str) -> Option<&Arc<Parameter>> {
        self.controls
            .iter()
            .find_map(|control| control.group.parameter(name))
    }

    /// Writes a parameter by name. Returns `false` when no parameter has that
    /// name or the value is out of range.
    pub fn update_parameter(&self, name: &str, value: f32) -> bool {
        match self.find_parameter(name) {
            Some(parameter) => parameter.set_value(value),
            None => {
                log::debug!("No parameter named '{}'", name);
                false
            }
        }
    }

    /// Applies a parameter or flag message from a control surface.
    ///
    /// Returns `None` for messages that need the flock itself (resize,
    /// rebias), otherwise whether the message was accepted.
    pub fn apply_update(&self, update: &ControlUpdate) -> Option<bool> {
        let applied = match update {
            ControlUpdate::Parameter { name, value } => self.update_parameter(name, *value),
            ControlUpdate::Enabled { behavior, enabled } => behavior
                .parse()
                .map(|behavior| self.set_enabled(behavior, *enabled))
                .is_ok(),
            ControlUpdate::Debugging {
                behavior,
                debugging,
            } => behavior
                .parse()
                .map(|behavior| self.set_debugging(behavior, *debugging))
                .is_ok(),
            ControlUpdate::Resize { .. } | ControlUpdate::Rebias => return None,
        };
        Some(applied)
    }

    /// Applies the flags and parameter values of a startup config.
    ///
    /// Returns the config keys that could not be applied.
    pub fn apply_config(&self, config: &SimulationConfig) -> Vec<String> {
        let mut rejected = Vec::new();

        for (name, &enabled) in &config.enabled {
            match name.parse::<Behavior>() {
                Ok(behavior) => self.set_enabled(behavior, enabled),
                Err(_) => rejected.push(name.clone()),
            }
        }
        for (name, &debugging) in &config.debugging {
            match name.parse::<Behavior>() {
                Ok(behavior) => self.set_debugging(behavior, debugging),
                Err(_) => rejected.push(name.clone()),
            }
        }
        for (name, &value) in &config.parameters {
            if !self.update_parameter(name, value) {
                rejected.push(name.clone());
            }
        }

        rejected
    }

    fn read(&self, behavior: Behavior, name: &str) -> f32 {
        self.group(behavior).value(name).unwrap_or_default()
    }

    /// Reads every flag and parameter once.
    ///
    /// Each scalar is read atomically; a tick driver takes one snapshot per
    /// tick so all boids in the tick see the same values.
    pub fn snapshot(&self) -> TickParameters {
        use names::*;

        let on = |behavior| self.is_enabled(behavior);

        TickParameters {
            avoidance: on(Behavior::Avoidance).then(|| AvoidanceParams {
                range: self.read(Behavior::Avoidance, AVOIDANCE_RANGE),
                factor: self.read(Behavior::Avoidance, AVOIDANCE_FACTOR),
                fov_degrees: self.read(Behavior::Avoidance, AVOIDANCE_FOV),
            }),
            alignment: on(Behavior::Alignment).then(|| NeighborParams {
                range: self.read(Behavior::Alignment, ALIGNMENT_RANGE),
                factor: self.read(Behavior::Alignment, ALIGNMENT_FACTOR),
            }),
            cohesion: on(Behavior::Cohesion).then(|| NeighborParams {
                range: self.read(Behavior::Cohesion, COHESION_RANGE),
                factor: self.read(Behavior::Cohesion, COHESION_FACTOR),
            }),
            speed_limit: on(Behavior::SpeedLimiter).then(|| SpeedLimits {
                min: self.read(Behavior::SpeedLimiter, MIN_SPEED),
                max: self.read(Behavior::SpeedLimiter, MAX_SPEED),
            }),
            bias: on(Behavior::Bias).then(|| BiasParams {
                percentage: self.read(Behavior::Bias, BIAS_PERCENTAGE),
                target_x: self.read(Behavior::Bias, BIAS_POSITION_X),
                target_y: self.read(Behavior::Bias, BIAS_POSITION_Y),
                strength: self.read(Behavior::Bias, BIAS_STRENGTH),
                radius: self.read(Behavior::Bias, BIAS_RADIUS),
            }),
            wrap: on(Behavior::Wrap),
        }
    }

    /// Flags and parameters of every behavior, for control surfaces
    pub fn states(&self) -> Vec<BehaviorState> {
        self.groups()
            .map(|(behavior, group)| BehaviorState {
                name: behavior.name().to_string(),
                enabled: self.is_enabled(behavior),
                debugging: self.is_debugging(behavior),
                parameters: group
                    .parameters()
                    .map(|p| ParameterState {
                        category: p.category().to_string(),
                        name: p.name().to_string(),
                        description: p.description().to_string(),
                        min: p.min(),
                        max: p.max(),
                        value: p.value(),
                    })
                    .collect(),
            })
            .collect()
    }
}

impl core::fmt::Debug for FlockParameters {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.states()).finish()
    }
}
