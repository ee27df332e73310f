//! Parameter automation — a time-ordered timeline of value changes.
//!
//! Models the three automation primitives the beeper relies on: an
//! instantaneous set, an exponential approach towards a target, and a sampled
//! curve played back with linear interpolation. Times are in seconds.

/// One scheduled change.
#[derive(Debug, Clone, PartialEq)]
pub enum AutomationEvent {
    SetValue {
        time: f64,
        value: f64,
    },
    /// Approach `target` exponentially from whatever value holds at `time`.
    SetTarget {
        time: f64,
        target: f64,
        time_constant: f64,
    },
    /// Play `curve` across `[time, time + duration]`, then hold its last point.
    ValueCurve {
        time: f64,
        duration: f64,
        curve: Vec<f32>,
    },
}

impl AutomationEvent {
    pub fn time(&self) -> f64 {
        match self {
            AutomationEvent::SetValue { time, .. }
            | AutomationEvent::SetTarget { time, .. }
            | AutomationEvent::ValueCurve { time, .. } => *time,
        }
    }

    /// Value at `t >= self.time()`, given the value in force when the event began.
    fn value_at(&self, start_value: f64, t: f64) -> f64 {
        match self {
            AutomationEvent::SetValue { value, .. } => *value,
            AutomationEvent::SetTarget {
                time,
                target,
                time_constant,
            } => {
                if *time_constant <= 0.0 {
                    *target
                } else {
                    target + (start_value - target) * (-(t - time) / time_constant).exp()
                }
            }
            AutomationEvent::ValueCurve {
                time,
                duration,
                curve,
            } => curve_value(curve, *time, *duration, t),
        }
    }
}

fn curve_value(curve: &[f32], start: f64, duration: f64, t: f64) -> f64 {
    let Some(&last) = curve.last() else {
        return 0.0;
    };
    if curve.len() == 1 || duration <= 0.0 || t >= start + duration {
        return last as f64;
    }
    let pos = (t - start) / duration * (curve.len() - 1) as f64;
    let k = pos.floor() as usize;
    if k + 1 >= curve.len() {
        return last as f64;
    }
    let frac = pos - k as f64;
    let a = curve[k] as f64;
    let b = curve[k + 1] as f64;
    a + (b - a) * frac
}

/// A single automatable parameter.
#[derive(Debug, Clone)]
pub struct AutomationParam {
    default_value: f64,
    events: Vec<AutomationEvent>,
    /// `start_values[i]` is the value in force just as `events[i]` begins.
    start_values: Vec<f64>,
}

impl AutomationParam {
    pub fn new(default_value: f64) -> Self {
        AutomationParam {
            default_value,
            events: Vec::new(),
            start_values: Vec::new(),
        }
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(AutomationEvent::SetValue { time, value });
    }

    pub fn set_target_at_time(&mut self, target: f64, time: f64, time_constant: f64) {
        self.insert(AutomationEvent::SetTarget {
            time,
            target,
            time_constant,
        });
    }

    pub fn set_value_curve_at_time(&mut self, curve: Vec<f32>, time: f64, duration: f64) {
        self.insert(AutomationEvent::ValueCurve {
            time,
            duration,
            curve,
        });
    }

    /// Value of the parameter at time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        let idx = self.events.partition_point(|e| e.time() <= t);
        if idx == 0 {
            return self.default_value;
        }
        self.events[idx - 1].value_at(self.start_values[idx - 1], t)
    }

    // Events at equal times keep their insertion order.
    fn insert(&mut self, event: AutomationEvent) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
        self.start_values.truncate(at);
        for i in at..self.events.len() {
            let start = match i {
                0 => self.default_value,
                _ => {
                    let prev = &self.events[i - 1];
                    prev.value_at(self.start_values[i - 1], self.events[i].time())
                }
            };
            self.start_values.push(start);
        }
    }
}
