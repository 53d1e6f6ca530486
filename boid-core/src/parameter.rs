use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Callback invoked after a parameter accepts a new value
pub type Observer = Box<dyn Fn(&Parameter) + Send + Sync>;

/// A named, bounded scalar that can be tuned while the simulation runs.
///
/// The value is stored as raw `f32` bits in an atomic, so a control surface
/// thread can write while the tick driver reads without locking.
pub struct Parameter {
    category: String,
    name: String,
    description: String,
    min: f32,
    max: f32,
    value: AtomicU32,
    observers: Mutex<Vec<Observer>>,
}

impl Parameter {
    /// A parameter starting at `default`, clamped into `[min, max]`.
    ///
    /// Inverted bounds are swapped. A NaN bound is replaced by the default
    /// (or 0 when the default is NaN too), and a NaN default starts at `min`.
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        min: f32,
        default: f32,
        max: f32,
    ) -> Self {
        let name = name.into();
        let (min, max) = ordered_bounds(&name, min, max, default);
        let value = if default.is_nan() {
            min
        } else {
            default.clamp(min, max)
        };

        Self {
            category: category.into(),
            name,
            description: description.into(),
            min,
            max,
            value: AtomicU32::new(value.to_bits()),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn value(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Acquire))
    }

    /// Stores `value` if it lies within `[min, max]`.
    ///
    /// Out-of-range (and NaN) writes leave the current value untouched and
    /// return `false`. Observers run only for accepted writes.
    pub fn set_value(&self, value: f32) -> bool {
        if !(self.min..=self.max).contains(&value) {
            log::debug!(
                "Rejected {} = {} (allowed {}..={})",
                self.name,
                value,
                self.min,
                self.max
            );
            return false;
        }

        self.value.store(value.to_bits(), Ordering::Release);
        self.notify();
        true
    }

    /// Position of the current value within the range, in `[0, 1]`.
    pub fn normalized(&self) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        (self.value() - self.min) / span
    }

    /// Maps a slider position in `[0, 1]` onto the range and writes it.
    pub fn set_normalized(&self, t: f32) -> bool {
        if !(0.0..=1.0).contains(&t) {
            return false;
        }
        let value = (self.min + t * (self.max - self.min)).clamp(self.min, self.max);
        self.set_value(value)
    }

    /// Registers an observer; observers are called in registration order.
    ///
    /// Observers must not subscribe to the same parameter from inside the
    /// callback.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&Parameter) + Send + Sync + 'static,
    {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Box::new(observer));
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn notify(&self) {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for observer in observers.iter() {
            observer(self);
        }
    }
}

impl core::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Parameter")
            .field("category", &self.category)
            .field("name", &self.name)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("value", &self.value())
            .finish()
    }
}

/// The parameters owned by one behavior kind, keyed by name
#[derive(Debug)]
pub struct ParameterGroup {
    name: String,
    parameters: Vec<Arc<Parameter>>,
}

impl ParameterGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a parameter, replacing (and returning) any existing parameter
    /// with the same name.
    pub fn add_parameter(&mut self, parameter: Parameter) -> Option<Arc<Parameter>> {
        let parameter = Arc::new(parameter);
        match self
            .parameters
            .iter_mut()
            .find(|existing| existing.name() == parameter.name())
        {
            Some(slot) => Some(core::mem::replace(slot, parameter)),
            None => {
                self.parameters.push(parameter);
                None
            }
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&Arc<Parameter>> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    /// Current value of the named parameter, if the group has it.
    pub fn value(&self, name: &str) -> Option<f32> {
        self.parameter(name).map(|p| p.value())
    }

    /// Parameters in insertion order.
    pub fn parameters(&self) -> impl Iterator<Item = &Arc<Parameter>> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

fn ordered_bounds(name: &str, min: f32, max: f32, default: f32) -> (f32, f32) {
    let fallback = if default.is_nan() { 0.0 } else { default };
    let min = if min.is_nan() { fallback } else { min };
    let max = if max.is_nan() { fallback } else { max };
    if min > max {
        log::warn!("Parameter {} has inverted bounds {}..={}", name, min, max);
        (max, min)
    } else {
        (min, max)
    }
}
