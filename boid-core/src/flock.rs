use std::sync::Arc;

use boid_shared::{AgentState, ControlUpdate, FlockSnapshot, Point, SimulationConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::settings::names;
use crate::{Behavior, Boid, FlockParameters, Vector2D, DEFAULT_SCREEN_SIZE};

/// A fixed population of boids and the shared settings they steer by
pub struct Flock {
    boids: Vec<Boid>,
    parameters: Arc<FlockParameters>,
    screen_size: Vector2D,
    ticks: u64,
    /// Source for bias re-rolls, seeded from the construction RNG
    rng: StdRng,
}

impl Flock {
    /// An empty flock; add boids with [`Flock::add_boid`].
    pub fn empty(width: f32, height: f32, parameters: Arc<FlockParameters>) -> Self {
        Self {
            boids: Vec::new(),
            parameters,
            screen_size: Vector2D::new(width, height),
            ticks: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// `count` random boids with default parameters.
    pub fn new(width: f32, height: f32, count: usize) -> Self {
        Self::with_rng(
            width,
            height,
            count,
            Arc::new(FlockParameters::new()),
            &mut rand::thread_rng(),
        )
    }

    /// `count` random boids drawn from `rng`. The first boid is the debug
    /// boid; biased boids are picked according to the bias percentage.
    pub fn with_rng<R: Rng + ?Sized>(
        width: f32,
        height: f32,
        count: usize,
        parameters: Arc<FlockParameters>,
        rng: &mut R,
    ) -> Self {
        let mut flock = Self::empty(width, height, parameters);
        flock.rng = StdRng::seed_from_u64(rng.gen());
        for _ in 0..count {
            flock.add_boid(Boid::random(rng, width, height));
        }
        if let Some(first) = flock.boids.first_mut() {
            first.set_debug(true);
        }
        flock.reassign_bias(rng);

        log::debug!(
            "Created flock of {} boids on {}x{}",
            flock.len(),
            width,
            height
        );
        flock
    }

    /// Builds a flock from a startup config.
    ///
    /// Config entries naming unknown behaviors or parameters, or carrying
    /// out-of-range values, are skipped and returned alongside the flock.
    /// A non-positive or non-finite screen size is rejected the same way and
    /// replaced by [`DEFAULT_SCREEN_SIZE`].
    pub fn from_config(config: &SimulationConfig) -> (Self, Vec<String>) {
        let parameters = Arc::new(FlockParameters::new());
        let mut rejected = parameters.apply_config(config);

        let (width, height) = if valid_size(config.width, config.height) {
            (config.width, config.height)
        } else {
            rejected.push("width".to_string());
            rejected.push("height".to_string());
            (DEFAULT_SCREEN_SIZE.x, DEFAULT_SCREEN_SIZE.y)
        };

        for key in &rejected {
            log::warn!("Ignoring config entry '{}'", key);
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut flock = Self::with_rng(
            width,
            height,
            config.boid_count,
            parameters,
            &mut rng,
        );
        if !config.debug_first_boid {
            if let Some(first) = flock.boids.first_mut() {
                first.set_debug(false);
            }
        }

        (flock, rejected)
    }

    /// Appends a boid, giving it the next id and the flock's screen size.
    pub fn add_boid(&mut self, mut boid: Boid) {
        boid.id = self.boids.len();
        boid.set_screen_size(self.screen_size.x, self.screen_size.y);
        self.boids.push(boid);
    }

    /// Marks a random subset of boids as biased, sized by the bias
    /// percentage parameter. Returns how many boids are biased.
    pub fn reassign_bias<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let bias_percentage = self.bias_percentage();
        assign_bias(&mut self.boids, bias_percentage, rng)
    }

    /// [`Flock::reassign_bias`] drawing from the flock's own RNG, so seeded
    /// flocks re-roll the same way.
    pub fn rebias(&mut self) -> usize {
        let percentage = self.bias_percentage();
        assign_bias(&mut self.boids, percentage, &mut self.rng)
    }

    fn bias_percentage(&self) -> f32 {
        self.parameters
            .group(Behavior::Bias)
            .value(names::BIAS_PERCENTAGE)
            .unwrap_or_default()
    }

    /// Advances every boid by one tick.
    ///
    /// Parameters are read once, and every boid steers against the same
    /// pre-tick copy of the flock, so update order never matters.
    pub fn tick(&mut self) {
        let params = self.parameters.snapshot();
        let population = self.boids.clone();

        #[cfg(feature = "parallel")]
        self.boids
            .par_iter_mut()
            .for_each(|boid| boid.update(&population, &params));

        #[cfg(not(feature = "parallel"))]
        for boid in self.boids.iter_mut() {
            boid.update(&population, &params);
        }

        self.ticks += 1;
    }

    /// Runs `count` ticks.
    pub fn run(&mut self, count: usize) {
        for _ in 0..count {
            self.tick();
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.screen_size = Vector2D::new(width, height);
        for boid in self.boids.iter_mut() {
            boid.set_screen_size(width, height);
        }
        log::debug!("Resized flock to {}x{}", width, height);
    }

    /// Applies one control-surface message. Returns `false` if it was
    /// rejected (unknown name, out-of-range value or invalid size).
    pub fn apply_update(&mut self, update: &ControlUpdate) -> bool {
        if let Some(applied) = self.parameters.apply_update(update) {
            return applied;
        }

        match update {
            ControlUpdate::Resize { width, height } => {
                if valid_size(*width, *height) {
                    self.resize(*width, *height);
                    true
                } else {
                    false
                }
            }
            ControlUpdate::Rebias => {
                self.rebias();
                true
            }
            _ => false,
        }
    }

    /// Per-boid and per-behavior state for renderers
    pub fn state(&self) -> FlockSnapshot {
        FlockSnapshot {
            tick: self.ticks,
            width: self.screen_size.x,
            height: self.screen_size.y,
            agents: self
                .boids
                .iter()
                .map(|boid| AgentState {
                    id: boid.id,
                    position: Point::new(boid.position.x, boid.position.y),
                    velocity: Point::new(boid.velocity.x, boid.velocity.y),
                    heading: boid.velocity.heading(),
                    debug: boid.debug,
                    biased: boid.biased,
                })
                .collect(),
            behaviors: self.parameters.states(),
        }
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    /// Mutable access to boid state; the population size stays fixed.
    pub fn boids_mut(&mut self) -> &mut [Boid] {
        &mut self.boids
    }

    pub fn parameters(&self) -> &Arc<FlockParameters> {
        &self.parameters
    }

    pub fn screen_size(&self) -> Vector2D {
        self.screen_size
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn biased_count(&self) -> usize {
        self.boids.iter().filter(|b| b.biased).count()
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }
}

fn valid_size(width: f32, height: f32) -> bool {
    width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
}

fn assign_bias<R: Rng + ?Sized>(boids: &mut [Boid], percentage: f32, rng: &mut R) -> usize {
    let count = ((boids.len() as f32 * percentage / 100.0).round() as usize).min(boids.len());

    for boid in boids.iter_mut() {
        boid.set_biased(false);
    }
    for index in rand::seq::index::sample(rng, boids.len(), count) {
        boids[index].set_biased(true);
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(count: usize) -> Flock {
        Flock::with_rng(
            800.0,
            600.0,
            count,
            Arc::new(FlockParameters::new()),
            &mut StdRng::seed_from_u64(11),
        )
    }

    #[test]
    fn test_flock_creation() {
        let flock = Flock::new(800.0, 600.0, 50);
        assert_eq!(flock.len(), 50);
        assert_eq!(flock.screen_size(), Vector2D::new(800.0, 600.0));
        assert!(flock.boids()[0].is_debug());
        assert!(flock.boids()[1..].iter().all(|b| !b.is_debug()));
        assert_eq!(flock.biased_count(), 25);
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let flock = seeded(10);
        for (index, boid) in flock.boids().iter().enumerate() {
            assert_eq!(boid.id, index);
        }
    }

    #[test]
    fn test_flock_update() {
        let mut flock = seeded(10);
        let initial_positions: Vec<_> = flock.boids().iter().map(|b| b.position).collect();

        flock.tick();

        // Positions should change after update
        let changed = flock
            .boids()
            .iter()
            .zip(initial_positions.iter())
            .any(|(b, &initial)| b.position != initial);

        assert!(changed);
        assert_eq!(flock.tick_count(), 1);
    }

    #[test]
    fn test_tick_keeps_boids_on_screen_and_in_speed_limits() {
        let mut flock = seeded(60);
        flock.run(200);

        for boid in flock.boids() {
            assert!(boid.position.x >= 0.0 && boid.position.x <= 800.0);
            assert!(boid.position.y >= 0.0 && boid.position.y <= 600.0);
            assert!(boid.speed() >= 3.0 - 1e-3 && boid.speed() <= 6.0 + 1e-3);
            assert!(!boid.velocity.x.is_nan() && !boid.velocity.y.is_nan());
        }
    }

    #[test]
    fn test_flock_add_boid() {
        let mut flock = seeded(10);
        let initial_count = flock.len();

        flock.add_boid(Boid::new(Vector2D::new(1.0, 1.0), Vector2D::new(1.0, 0.0)));

        assert_eq!(flock.len(), initial_count + 1);
        assert_eq!(flock.boids()[initial_count].id, initial_count);
    }

    #[test]
    fn test_resize_fans_out() {
        let mut flock = seeded(5);
        flock.resize(1024.0, 768.0);
        assert!(flock
            .boids()
            .iter()
            .all(|b| b.screen_size == Vector2D::new(1024.0, 768.0)));
    }

    #[test]
    fn test_reassign_bias_follows_percentage() {
        let mut flock = seeded(40);
        let mut rng = StdRng::seed_from_u64(5);

        flock
            .parameters()
            .update_parameter(names::BIAS_PERCENTAGE, 25.0);
        assert_eq!(flock.reassign_bias(&mut rng), 10);
        assert_eq!(flock.biased_count(), 10);

        flock.parameters().update_parameter(names::BIAS_PERCENTAGE, 0.0);
        assert_eq!(flock.reassign_bias(&mut rng), 0);
        assert_eq!(flock.biased_count(), 0);
    }

    #[test]
    fn test_apply_update_messages() {
        let mut flock = seeded(4);

        assert!(flock.apply_update(&ControlUpdate::Parameter {
            name: names::MIN_SPEED.to_string(),
            value: 1.0,
        }));
        assert!(!flock.apply_update(&ControlUpdate::Parameter {
            name: names::MIN_SPEED.to_string(),
            value: 11.0,
        }));
        assert!(flock.apply_update(&ControlUpdate::Enabled {
            behavior: "wrap".to_string(),
            enabled: false,
        }));
        assert!(!flock.apply_update(&ControlUpdate::Debugging {
            behavior: "Gravity".to_string(),
            debugging: true,
        }));
        assert!(!flock.apply_update(&ControlUpdate::Resize {
            width: 0.0,
            height: 10.0,
        }));

        let params = flock.parameters().snapshot();
        assert_eq!(params.speed_limit.map(|s| s.min), Some(1.0));
        assert!(!params.wrap);
    }

    #[test]
    fn test_state_exposes_agents_and_behaviors() {
        let flock = seeded(3);
        let state = flock.state();

        assert_eq!(state.tick, 0);
        assert_eq!(state.agents.len(), 3);
        assert!(state.agents[0].debug);
        assert_eq!(state.behaviors.len(), 6);
        assert!(state.behavior("Wrap").unwrap().enabled);
    }

    #[test]
    fn test_from_config_rejects_degenerate_screen() {
        let config = SimulationConfig {
            boid_count: 3,
            width: 0.0,
            seed: Some(1),
            ..SimulationConfig::default()
        };
        let (flock, rejected) = Flock::from_config(&config);

        assert_eq!(rejected, vec!["width".to_string(), "height".to_string()]);
        assert_eq!(flock.len(), 3);
        assert_eq!(flock.screen_size(), DEFAULT_SCREEN_SIZE);
    }

    #[test]
    fn test_degenerate_screen_does_not_panic() {
        let flock = Flock::new(-10.0, 600.0, 4);
        assert_eq!(flock.len(), 4);
        assert!(flock.boids().iter().all(|b| b.position.x == 0.0));
    }

    #[test]
    fn test_seeded_rebias_is_reproducible() {
        let config = SimulationConfig {
            boid_count: 40,
            seed: Some(21),
            ..SimulationConfig::default()
        };
        let (mut a, _) = Flock::from_config(&config);
        let (mut b, _) = Flock::from_config(&config);

        for _ in 0..3 {
            assert!(a.apply_update(&ControlUpdate::Rebias));
            assert!(b.apply_update(&ControlUpdate::Rebias));
            let biased_a: Vec<bool> = a.boids().iter().map(|boid| boid.biased).collect();
            let biased_b: Vec<bool> = b.boids().iter().map(|boid| boid.biased).collect();
            assert_eq!(biased_a, biased_b);
            assert_eq!(a.biased_count(), 20);
        }
    }

    #[test]
    fn test_from_config_is_reproducible() {
        let config = SimulationConfig {
            boid_count: 20,
            seed: Some(99),
            ..SimulationConfig::default()
        };
        let (mut a, rejected) = Flock::from_config(&config);
        let (mut b, _) = Flock::from_config(&config);
        assert!(rejected.is_empty());

        a.run(10);
        b.run(10);
        assert_eq!(a.boids(), b.boids());
    }
}
