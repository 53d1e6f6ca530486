use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A 2D point or direction in screen coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Per-agent state a renderer needs to draw one boid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentState {
    pub id: usize,
    pub position: Point,
    pub velocity: Point,
    /// Heading in radians, `atan2(velocity.y, velocity.x)`
    pub heading: f32,
    pub debug: bool,
    pub biased: bool,
}

/// A single tunable parameter as shown on a control surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterState {
    pub category: String,
    pub name: String,
    pub description: String,
    pub min: f32,
    pub max: f32,
    pub value: f32,
}

/// Flags and parameters of one behavior kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BehaviorState {
    pub name: String,
    pub enabled: bool,
    pub debugging: bool,
    pub parameters: Vec<ParameterState>,
}

impl BehaviorState {
    pub fn parameter(&self, name: &str) -> Option<&ParameterState> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Everything a renderer reads after a tick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlockSnapshot {
    pub tick: u64,
    pub width: f32,
    pub height: f32,
    pub agents: Vec<AgentState>,
    pub behaviors: Vec<BehaviorState>,
}

impl FlockSnapshot {
    pub fn behavior(&self, name: &str) -> Option<&BehaviorState> {
        self.behaviors.iter().find(|b| b.name == name)
    }
}

/// Update message sent from a control surface to the running simulation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlUpdate {
    /// Write a parameter, looked up by name across all behaviors
    Parameter { name: String, value: f32 },
    Enabled { behavior: String, enabled: bool },
    Debugging { behavior: String, debugging: bool },
    Resize { width: f32, height: f32 },
    /// Re-roll which boids follow the bias target
    Rebias,
}

impl ControlUpdate {
    /// Parse one JSON line, e.g. `{"type":"parameter","name":"Min Speed","value":2.5}`
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }
}

/// Status summary of a running simulation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub boid_count: usize,
    pub tick: u64,
    pub biased_count: usize,
    pub updates_applied: usize,
    pub updates_rejected: usize,
}

/// Startup configuration for a simulation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of boids created at startup
    pub boid_count: usize,
    pub width: f32,
    pub height: f32,
    /// Seed for reproducible runs; a random seed is used when absent
    pub seed: Option<u64>,
    /// Mark the first boid as the debug boid
    pub debug_first_boid: bool,
    /// Tick cadence for drivers that run in real time
    pub tick_interval_ms: u64,
    /// Behavior name to enabled flag
    pub enabled: BTreeMap<String, bool>,
    /// Behavior name to debugging flag
    pub debugging: BTreeMap<String, bool>,
    /// Parameter name to initial value
    pub parameters: BTreeMap<String, f32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            boid_count: 100,
            width: 800.0,
            height: 600.0,
            seed: None,
            debug_first_boid: true,
            tick_interval_ms: 16,
            enabled: BTreeMap::new(),
            debugging: BTreeMap::new(),
            parameters: BTreeMap::new(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
