use rand::Rng;

use crate::behavior::{Behavior, TickParameters};
use crate::Vector2D;

/// Screen size a boid assumes until told otherwise
pub const DEFAULT_SCREEN_SIZE: Vector2D = Vector2D { x: 800.0, y: 600.0 };

/// A single boid entity
#[derive(Debug, Clone, PartialEq)]
pub struct Boid {
    /// Stable index within the flock; used to skip self in neighbor scans
    pub id: usize,
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub acceleration: Vector2D,
    /// Size of the toroidal domain the boid wraps around
    pub screen_size: Vector2D,
    pub debug: bool,
    pub biased: bool,
}

impl Boid {
    pub fn new(position: Vector2D, velocity: Vector2D) -> Self {
        Self {
            id: 0,
            position,
            velocity,
            acceleration: Vector2D::zero(),
            screen_size: DEFAULT_SCREEN_SIZE,
            debug: false,
            biased: false,
        }
    }

    /// A boid at a random position inside the screen, heading in a random
    /// direction at unit speed. An axis with no usable extent spawns at 0.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, width: f32, height: f32) -> Self {
        let position = Vector2D::new(spawn_coord(rng, width), spawn_coord(rng, height));
        let mut boid = Self::new(position, Vector2D::random_unit(rng));
        boid.set_screen_size(width, height);
        boid
    }

    /// Adds a single-tick impulse. Acceleration only turns the boid; its
    /// speed is left to the speed limiter.
    pub fn apply_force(&mut self, force: Vector2D) {
        self.acceleration += force;
    }

    /// Advances the boid by one tick.
    ///
    /// `population` is the pre-tick state of the whole flock (it may contain
    /// this boid). Steering rules run first, then the velocity is turned by
    /// the accumulated acceleration without changing speed, the position is
    /// integrated, and finally speed limiting and wrapping are applied.
    pub fn update(&mut self, population: &[Boid], params: &TickParameters) {
        for behavior in Behavior::STEERING {
            behavior.apply(self, population, params);
        }

        let speed = self.velocity.magnitude();
        let mut velocity = self.velocity + self.acceleration;
        if velocity.magnitude() > 0.0 {
            velocity = velocity.normalize() * speed;
        }

        self.velocity = velocity;
        self.position += self.velocity;

        for behavior in Behavior::POST_MOVE {
            behavior.apply(self, population, params);
        }

        self.acceleration = Vector2D::zero();
    }

    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen_size = Vector2D::new(width, height);
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn set_biased(&mut self, biased: bool) {
        self.biased = biased;
    }

    pub fn is_biased(&self) -> bool {
        self.biased
    }

    pub fn speed(&self) -> f32 {
        self.velocity.magnitude()
    }
}

fn spawn_coord<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    if extent.is_finite() && extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}
