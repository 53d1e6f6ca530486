//! Steering rules applied to one boid per tick.
//!
//! Every rule reads the population snapshot and the tick's [`TickParameters`]
//! and mutates only the boid it is applied to.

use crate::{Boid, Vector2D};

/// The fixed set of behaviors every boid runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behavior {
    Avoidance,
    Alignment,
    Cohesion,
    SpeedLimiter,
    Bias,
    Wrap,
}

impl Behavior {
    pub const ALL: [Behavior; 6] = [
        Behavior::Avoidance,
        Behavior::Alignment,
        Behavior::Cohesion,
        Behavior::SpeedLimiter,
        Behavior::Bias,
        Behavior::Wrap,
    ];

    /// Rules that steer velocity before the position is integrated, in order
    pub const STEERING: [Behavior; 4] = [
        Behavior::Avoidance,
        Behavior::Alignment,
        Behavior::Cohesion,
        Behavior::Bias,
    ];

    /// Rules applied after the position is integrated, in order
    pub const POST_MOVE: [Behavior; 2] = [Behavior::SpeedLimiter, Behavior::Wrap];

    pub fn name(self) -> &'static str {
        match self {
            Behavior::Avoidance => "Avoidance",
            Behavior::Alignment => "Alignment",
            Behavior::Cohesion => "Cohesion",
            Behavior::SpeedLimiter => "Speed Limiter",
            Behavior::Bias => "Bias",
            Behavior::Wrap => "Wrap",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Behavior::Avoidance => 0,
            Behavior::Alignment => 1,
            Behavior::Cohesion => 2,
            Behavior::SpeedLimiter => 3,
            Behavior::Bias => 4,
            Behavior::Wrap => 5,
        }
    }

    /// Apply this rule to `boid`. A rule whose parameters are absent from
    /// `params` is disabled and does nothing.
    pub fn apply(self, boid: &mut Boid, population: &[Boid], params: &TickParameters) {
        match self {
            Behavior::Avoidance => {
                if let Some(p) = &params.avoidance {
                    let steer = avoidance(boid, population, p);
                    boid.velocity += steer;
                }
            }
            Behavior::Alignment => {
                if let Some(p) = &params.alignment {
                    let steer = alignment(boid, population, p);
                    boid.velocity += steer;
                }
            }
            Behavior::Cohesion => {
                if let Some(p) = &params.cohesion {
                    let steer = cohesion(boid, population, p);
                    boid.velocity += steer;
                }
            }
            Behavior::SpeedLimiter => {
                if let Some(p) = &params.speed_limit {
                    boid.velocity = boid.velocity.limit_range(p.min, p.max);
                }
            }
            Behavior::Bias => {
                if let Some(p) = &params.bias {
                    let steer = bias(boid, p);
                    boid.velocity += steer;
                }
            }
            Behavior::Wrap => {
                if params.wrap {
                    wrap(boid);
                }
            }
        }
    }
}

impl core::fmt::Display for Behavior {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no known behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBehavior(pub String);

impl core::fmt::Display for UnknownBehavior {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown behavior '{}'", self.0)
    }
}

impl std::error::Error for UnknownBehavior {}

impl core::str::FromStr for Behavior {
    type Err = UnknownBehavior;

    /// Case-insensitive; spaces, dashes and underscores are ignored so
    /// "Speed Limiter", "speed-limiter" and "speed_limiter" all match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        Behavior::ALL
            .into_iter()
            .find(|b| b.name().replace(' ', "").to_lowercase() == key)
            .ok_or_else(|| UnknownBehavior(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvoidanceParams {
    pub range: f32,
    pub factor: f32,
    /// Full field of view in degrees, centered on the heading
    pub fov_degrees: f32,
}

impl AvoidanceParams {
    pub fn half_fov(&self) -> f32 {
        self.fov_degrees.to_radians() / 2.0
    }
}

/// Range and strength of a neighbor-averaging rule (alignment, cohesion)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborParams {
    pub range: f32,
    pub factor: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedLimits {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasParams {
    /// Share of the flock that follows the target, in percent
    pub percentage: f32,
    /// Target position as a fraction of the screen size
    pub target_x: f32,
    pub target_y: f32,
    pub strength: f32,
    pub radius: f32,
}

impl BiasParams {
    pub fn target(&self, screen_size: Vector2D) -> Vector2D {
        Vector2D::new(self.target_x * screen_size.x, self.target_y * screen_size.y)
    }
}

/// Point-in-time copy of every behavior parameter, read once per tick.
///
/// `None` (or `wrap == false`) means the behavior is disabled for the tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickParameters {
    pub avoidance: Option<AvoidanceParams>,
    pub alignment: Option<NeighborParams>,
    pub cohesion: Option<NeighborParams>,
    pub speed_limit: Option<SpeedLimits>,
    pub bias: Option<BiasParams>,
    pub wrap: bool,
}

impl TickParameters {
    /// Every behavior disabled
    pub fn disabled() -> Self {
        Self {
            avoidance: None,
            alignment: None,
            cohesion: None,
            speed_limit: None,
            bias: None,
            wrap: false,
        }
    }
}

impl Default for TickParameters {
    fn default() -> Self {
        crate::FlockParameters::new().snapshot()
    }
}

fn neighbors<'a>(
    boid: &'a Boid,
    population: &'a [Boid],
    range: f32,
) -> impl Iterator<Item = &'a Boid> {
    population.iter().filter(move |other| {
        other.id != boid.id && boid.position.distance(&other.position) < range
    })
}

/// Velocity change pushing `boid` away from peers inside its avoidance cone.
///
/// Each peer contributes `range / distance * factor` along the direction from
/// the peer to `boid`, so a peer at the edge of the range pushes with
/// `factor` and closer peers push harder.
pub fn avoidance(boid: &Boid, population: &[Boid], params: &AvoidanceParams) -> Vector2D {
    let half_fov = params.half_fov();
    let mut steer = Vector2D::zero();

    for other in population.iter().filter(|other| other.id != boid.id) {
        let offset = other.position - boid.position;
        let distance = offset.magnitude();
        if distance >= params.range {
            continue;
        }
        if boid.velocity.angle_between(&offset) < half_fov {
            steer += (-offset).normalize() / distance * params.range * params.factor;
        }
    }

    steer
}

/// Velocity change toward the mean velocity of peers within range.
pub fn alignment(boid: &Boid, population: &[Boid], params: &NeighborParams) -> Vector2D {
    let mut sum = Vector2D::zero();
    let mut count = 0;

    for other in neighbors(boid, population, params.range) {
        sum += other.velocity;
        count += 1;
    }

    if count > 0 {
        let average = sum / count as f32;
        (average - boid.velocity) * params.factor
    } else {
        Vector2D::zero()
    }
}

/// Velocity change toward the mean position of peers within range.
pub fn cohesion(boid: &Boid, population: &[Boid], params: &NeighborParams) -> Vector2D {
    let mut sum = Vector2D::zero();
    let mut count = 0;

    for other in neighbors(boid, population, params.range) {
        sum += other.position;
        count += 1;
    }

    if count > 0 {
        let center = sum / count as f32;
        (center - boid.position) * params.factor
    } else {
        Vector2D::zero()
    }
}

/// Velocity change pulling a biased boid toward the bias target.
///
/// The pull is divided by the current speed so the turning effect stays
/// roughly constant; a boid at rest has no speed to divide by and gets no
/// pull.
pub fn bias(boid: &Boid, params: &BiasParams) -> Vector2D {
    if !boid.biased {
        return Vector2D::zero();
    }

    let to_target = params.target(boid.screen_size) - boid.position;
    if to_target.magnitude() <= params.radius {
        return Vector2D::zero();
    }

    let speed = boid.velocity.magnitude();
    if speed <= f32::EPSILON {
        return Vector2D::zero();
    }

    to_target.normalize() * params.strength / speed
}

/// Toroidal wrap of the position into the screen rectangle.
pub fn wrap(boid: &mut Boid) {
    let size = boid.screen_size;

    if boid.position.x < 0.0 {
        boid.position.x += size.x;
    }
    if boid.position.x > size.x {
        boid.position.x -= size.x;
    }

    if boid.position.y < 0.0 {
        boid.position.y += size.y;
    }
    if boid.position.y > size.y {
        boid.position.y -= size.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boid(id: usize, x: f32, y: f32, vx: f32, vy: f32) -> Boid {
        let mut boid = Boid::new(Vector2D::new(x, y), Vector2D::new(vx, vy));
        boid.id = id;
        boid
    }

    const AVOID: AvoidanceParams = AvoidanceParams {
        range: 10.0,
        factor: 0.1,
        fov_degrees: 360.0,
    };

    #[test]
    fn test_behavior_names_round_trip() {
        for behavior in Behavior::ALL {
            assert_eq!(behavior.name().parse::<Behavior>(), Ok(behavior));
        }
        assert_eq!("speed-limiter".parse(), Ok(Behavior::SpeedLimiter));
        assert_eq!("SPEED_LIMITER".parse(), Ok(Behavior::SpeedLimiter));
        assert!("flee".parse::<Behavior>().is_err());
    }

    #[test]
    fn test_avoidance_ignores_self_and_far_boids() {
        let me = boid(0, 0.0, 0.0, 1.0, 0.0);
        let population = vec![me.clone(), boid(1, 50.0, 0.0, 0.0, 0.0)];
        assert_eq!(avoidance(&me, &population, &AVOID), Vector2D::zero());
        assert_eq!(avoidance(&me, &[], &AVOID), Vector2D::zero());
    }

    #[test]
    fn test_avoidance_pushes_away() {
        let me = boid(0, 0.0, 0.0, 1.0, 0.0);
        let population = vec![me.clone(), boid(1, 5.0, 0.0, 0.0, 0.0)];
        let steer = avoidance(&me, &population, &AVOID);
        assert!((steer.x + 0.2).abs() < 1e-6);
        assert_eq!(steer.y, 0.0);
    }

    #[test]
    fn test_avoidance_grows_as_distance_shrinks() {
        let me = boid(0, 0.0, 0.0, 1.0, 0.0);
        let mut previous = 0.0;
        for d in [9.0, 7.0, 5.0, 3.0, 1.0, 0.5, 0.1] {
            let population = vec![me.clone(), boid(1, d, 0.0, 0.0, 0.0)];
            let magnitude = avoidance(&me, &population, &AVOID).magnitude();
            assert!(magnitude > previous, "d = {}", d);
            previous = magnitude;
        }
    }

    #[test]
    fn test_avoidance_respects_field_of_view() {
        let params = AvoidanceParams {
            fov_degrees: 90.0,
            ..AVOID
        };
        let me = boid(0, 0.0, 0.0, 1.0, 0.0);
        let behind = vec![me.clone(), boid(1, -5.0, 0.0, 0.0, 0.0)];
        assert_eq!(avoidance(&me, &behind, &params), Vector2D::zero());

        let ahead = vec![me.clone(), boid(1, 5.0, 1.0, 0.0, 0.0)];
        assert!(avoidance(&me, &ahead, &params).x < 0.0);
    }

    #[test]
    fn test_resting_boid_sees_only_with_wide_field_of_view() {
        let me = boid(0, 100.0, 100.0, 0.0, 0.0);
        let population = vec![me.clone(), boid(1, 95.0, 100.0, 0.0, 1.0)];

        let narrow = AvoidanceParams {
            fov_degrees: 10.0,
            ..AVOID
        };
        assert_eq!(avoidance(&me, &population, &narrow), Vector2D::zero());

        let wide = AvoidanceParams {
            fov_degrees: 270.0,
            ..AVOID
        };
        assert!(avoidance(&me, &population, &wide).x > 0.0);
    }

    #[test]
    fn test_avoidance_coincident_boid_contributes_nothing() {
        let me = boid(0, 3.0, 3.0, 1.0, 0.0);
        let population = vec![me.clone(), boid(1, 3.0, 3.0, 0.0, 1.0)];
        let steer = avoidance(&me, &population, &AVOID);
        assert_eq!(steer, Vector2D::zero());
    }

    #[test]
    fn test_alignment_without_neighbors_is_noop() {
        let me = boid(0, 0.0, 0.0, 1.0, 0.0);
        let population = vec![me.clone(), boid(1, 500.0, 0.0, 0.0, 3.0)];
        let params = NeighborParams {
            range: 50.0,
            factor: 0.1,
        };
        assert_eq!(alignment(&me, &population, &params), Vector2D::zero());
    }

    #[test]
    fn test_alignment_interpolates_toward_average_velocity() {
        let me = boid(0, 0.0, 0.0, 1.0, 0.0);
        let population = vec![
            me.clone(),
            boid(1, 10.0, 0.0, 0.0, 2.0),
            boid(2, 0.0, 10.0, 0.0, 4.0),
        ];
        let params = NeighborParams {
            range: 50.0,
            factor: 0.5,
        };
        let delta = alignment(&me, &population, &params);
        assert_eq!(delta, Vector2D::new(-0.5, 1.5));
    }

    #[test]
    fn test_cohesion_steers_toward_center() {
        let me = boid(0, 0.0, 0.0, 1.0, 0.0);
        let population = vec![
            me.clone(),
            boid(1, 10.0, 0.0, 0.0, 0.0),
            boid(2, 10.0, 10.0, 0.0, 0.0),
        ];
        let params = NeighborParams {
            range: 50.0,
            factor: 0.1,
        };
        assert_eq!(cohesion(&me, &population, &params), Vector2D::new(1.0, 0.5));

        let alone = vec![me.clone()];
        assert_eq!(cohesion(&me, &alone, &params), Vector2D::zero());
    }

    #[test]
    fn test_speed_limiter_raises_slow_boid_to_min() {
        let mut me = boid(0, 0.0, 0.0, 0.06, 0.08);
        let params = TickParameters {
            speed_limit: Some(SpeedLimits { min: 2.0, max: 4.0 }),
            ..TickParameters::disabled()
        };
        Behavior::SpeedLimiter.apply(&mut me, &[], &params);
        assert!((me.velocity.magnitude() - 2.0).abs() < 1e-5);
        assert!((me.velocity.x - 1.2).abs() < 1e-5);
        assert!((me.velocity.y - 1.6).abs() < 1e-5);
    }

    #[test]
    fn test_bias_pulls_toward_target_scaled_by_speed() {
        let mut me = boid(0, 0.0, 300.0, 2.0, 0.0);
        me.biased = true;
        let params = BiasParams {
            percentage: 100.0,
            target_x: 0.5,
            target_y: 0.5,
            strength: 0.1,
            radius: 50.0,
        };
        let pull = bias(&me, &params);
        assert!((pull.x - 0.05).abs() < 1e-6);
        assert!(pull.y.abs() < 1e-6);

        me.biased = false;
        assert_eq!(bias(&me, &params), Vector2D::zero());
    }

    #[test]
    fn test_bias_inside_radius_or_at_rest_is_noop() {
        let params = BiasParams {
            percentage: 100.0,
            target_x: 0.5,
            target_y: 0.5,
            strength: 0.1,
            radius: 50.0,
        };
        let mut inside = boid(0, 410.0, 300.0, 1.0, 0.0);
        inside.biased = true;
        assert_eq!(bias(&inside, &params), Vector2D::zero());

        let mut resting = boid(0, 0.0, 0.0, 0.0, 0.0);
        resting.biased = true;
        let pull = bias(&resting, &params);
        assert_eq!(pull, Vector2D::zero());
        assert!(!pull.x.is_nan());
    }

    #[test]
    fn test_wrap_each_edge() {
        let mut me = boid(0, 800.0 + 30.0, -20.0, 0.0, 0.0);
        wrap(&mut me);
        assert_eq!(me.position, Vector2D::new(30.0, 580.0));

        let mut me = boid(0, -15.0, 600.0 + 45.0, 0.0, 0.0);
        wrap(&mut me);
        assert_eq!(me.position, Vector2D::new(785.0, 45.0));
    }

    #[test]
    fn test_disabled_behaviors_do_nothing() {
        let mut me = boid(0, -5.0, 0.0, 0.01, 0.0);
        let population = vec![me.clone(), boid(1, -4.0, 0.0, 0.0, 1.0)];
        let before = me.clone();
        for behavior in Behavior::ALL {
            behavior.apply(&mut me, &population, &TickParameters::disabled());
        }
        assert_eq!(me.position, before.position);
        assert_eq!(me.velocity, before.velocity);
    }
}
