//! Boid flocking engine.
//!
//! A [`Flock`] owns a fixed population of [`Boid`]s. Every tick each boid runs
//! the same ordered set of [`Behavior`]s (avoidance, alignment, cohesion,
//! bias, then speed limiting and wrapping), reading flock-wide tunables from a
//! shared [`FlockParameters`].

pub mod behavior;
mod boid;
mod flock;
mod parameter;
pub mod settings;
mod vector;

pub use behavior::{Behavior, TickParameters, UnknownBehavior};
pub use boid::{Boid, DEFAULT_SCREEN_SIZE};
pub use flock::Flock;
pub use parameter::{Observer, Parameter, ParameterGroup};
pub use settings::{names, FlockParameters};
pub use vector::Vector2D;
