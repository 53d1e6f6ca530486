use rand::Rng;

/// A 2D vector used for position, velocity and acceleration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// A unit vector pointing in a uniformly random direction in `[0, 2π)`.
    pub fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let angle = rng.gen_range(0.0..core::f32::consts::TAU);
        Self::new(angle.cos(), angle.sin())
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude() <= f32::EPSILON
    }

    /// Returns the unit vector with the same direction, or `self` unchanged
    /// when the magnitude is zero.
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self {
                x: self.x / mag,
                y: self.y / mag,
            }
        } else {
            *self
        }
    }

    /// Caps the magnitude at `max`.
    pub fn limit(&self, max: f32) -> Self {
        let mag = self.magnitude();
        if mag > max {
            self.normalize() * max
        } else {
            *self
        }
    }

    /// Two-sided clamp of the magnitude into `[min, max]`, keeping direction.
    ///
    /// A zero vector has no direction to rescale along and stays zero.
    pub fn limit_range(&self, min: f32, max: f32) -> Self {
        let mag = self.magnitude();
        if mag < min {
            self.normalize() * min
        } else if mag > max {
            self.normalize() * max
        } else {
            *self
        }
    }

    pub fn dot(&self, other: &Vector2D) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance(&self, other: &Vector2D) -> f32 {
        (*self - *other).magnitude()
    }

    /// Unsigned angle in radians between two vectors, in `[0, π]`.
    ///
    /// The cosine is clamped to `[-1, 1]` before `acos` so rounding can never
    /// produce NaN. A zero vector normalizes to zero, so its dot product with
    /// anything is 0 and the angle is `π/2`.
    pub fn angle_between(&self, other: &Vector2D) -> f32 {
        let mags = self.magnitude() * other.magnitude();
        if mags <= 0.0 {
            return core::f32::consts::FRAC_PI_2;
        }
        (self.dot(other) / mags).clamp(-1.0, 1.0).acos()
    }

    /// Heading angle in radians, as `atan2(y, x)`.
    pub fn heading(&self) -> f32 {
        self.y.atan2(self.x)
    }
}

impl core::ops::Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl core::ops::Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl core::ops::Mul<f32> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// Division by zero leaves the vector unchanged.
impl core::ops::Div<f32> for Vector2D {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        if scalar == 0.0 {
            return self;
        }
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl core::ops::Neg for Vector2D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl core::ops::AddAssign for Vector2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl core::ops::SubAssign for Vector2D {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}
