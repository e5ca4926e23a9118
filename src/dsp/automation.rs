//! Scheduled parameter automation.

use crate::MIN_TIME;

/*
Parameter Automation
====================

Envelopes and gain stages don't jump between values; they follow a
timeline of scheduled events. An `AutomationParam` is that timeline: a
default value plus a short, time-ordered list of events, queried with
`value_at(time)`.

Vocabulary
----------

  event         One scheduled change. Each event has a time and a value.

  set           The value becomes `value` at `time` (a step).

  ramp          The value travels from the PREVIOUS event's (time, value) to
                this event's (time, value). Linear or exponential.

  target        Starting at `time`, the value approaches `value` along a
                first-order curve with a time constant τ. It never arrives;
                after 5τ it is within 1% of the target.

  hold          `cancel_and_hold(t)` freezes the value interpolated at `t` and
                throws away every event scheduled after `t`.

  floor         The smallest value an exponential ramp may start from or aim
                for (FLOOR = 0.001, about -60 dB).


The Math
--------

Linear ramp from (t0, v0) to (t1, v1):

    v(t) = v0 + (v1 - v0) × (t - t0) / (t1 - t0)

Exponential ramp from (t0, v0) to (t1, v1):

    v(t) = v0 × (v1 / v0) ^ ((t - t0) / (t1 - t0))

    The ratio v(t + Δ) / v(t) is constant for a fixed Δ, which is how
    loudness is perceived. The formula is undefined for v0 or v1 equal to
    zero (and for sign changes), so both ends are lifted to FLOOR.

Target approach starting at (t0, v0):

    v(t) = target + (v0 - target) × e^(-(t - t0) / τ)


Why cancel_and_hold
-------------------

A note released halfway through its attack is somewhere on the attack
ramp. Starting the release from the sustain level (or from the ramp's end
value) would make the output jump. Holding the instantaneous value and
ramping from there keeps the curve continuous:

  level
    │        ╱┊
    │       ╱ ┊╲___  release starts from the held value
    │      ╱  ┊    ╲___
    │     ╱   ┊        ╲____
    └────╱────┊─────────────→ time
            note_off


Storage
-------

Events live in a fixed array so scheduling never allocates on the audio
thread. Elapsed events are folded into the base state (`prune`), and a
full list folds its oldest event before accepting a new one.
*/

/// Lowest level an exponential segment may start from or target.
pub const FLOOR: f32 = 0.001;

pub const MAX_EVENTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
enum EventKind {
    Set,
    LinearRamp,
    ExponentialRamp,
    Target { time_constant: f32 },
}

#[derive(Debug, Clone, Copy)]
struct AutomationEvent {
    kind: EventKind,
    value: f32,
    time: f64,
}

impl AutomationEvent {
    const EMPTY: Self = Self {
        kind: EventKind::Set,
        value: 0.0,
        time: 0.0,
    };
}

/// What the value does from `time` until the next event.
#[derive(Debug, Clone, Copy)]
enum Segment {
    Hold(f32),
    Approach {
        from: f32,
        target: f32,
        time_constant: f32,
    },
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    time: f64,
    segment: Segment,
}

impl Cursor {
    fn value(&self, t: f64) -> f32 {
        match self.segment {
            Segment::Hold(v) => v,
            Segment::Approach {
                from,
                target,
                time_constant,
            } => {
                let elapsed = (t - self.time).max(0.0);
                let decay = (-elapsed / time_constant as f64).exp() as f32;
                target + (from - target) * decay
            }
        }
    }

    /// State right after `event` has taken effect.
    fn step(&self, event: &AutomationEvent) -> Cursor {
        let segment = match event.kind {
            EventKind::Set | EventKind::LinearRamp | EventKind::ExponentialRamp => {
                Segment::Hold(event.value)
            }
            EventKind::Target { time_constant } => Segment::Approach {
                from: self.value(event.time),
                target: event.value,
                time_constant,
            },
        };
        Cursor {
            time: event.time,
            segment,
        }
    }
}

/// A single automatable value driven by scheduled events.
#[derive(Debug, Clone)]
pub struct AutomationParam {
    base: Cursor,
    events: [AutomationEvent; MAX_EVENTS],
    len: usize,
}

impl AutomationParam {
    pub fn new(default: f32) -> Self {
        Self {
            base: Cursor {
                time: 0.0,
                segment: Segment::Hold(default),
            },
            events: [AutomationEvent::EMPTY; MAX_EVENTS],
            len: 0,
        }
    }

    /// Step to `value` at `time`.
    pub fn set_value_at(&mut self, value: f32, time: f64) {
        self.schedule(EventKind::Set, value, time);
    }

    /// Ramp linearly from the previous event to `target`, arriving at `deadline`.
    pub fn linear_ramp_to(&mut self, target: f32, deadline: f64) {
        self.schedule(EventKind::LinearRamp, target, deadline);
    }

    /// Ramp exponentially from the previous event to `target`, arriving at
    /// `deadline`. Targets below `FLOOR` are lifted to it.
    pub fn exponential_ramp_to(&mut self, target: f32, deadline: f64) {
        self.schedule(EventKind::ExponentialRamp, target.max(FLOOR), deadline);
    }

    /// Approach `target` from `start` onwards with time constant `time_constant`
    /// seconds.
    pub fn set_target_at(&mut self, target: f32, start: f64, time_constant: f32) {
        let time_constant = time_constant.max(MIN_TIME);
        self.schedule(EventKind::Target { time_constant }, target, start);
    }

    /// Freeze the value at `time` and drop everything scheduled after it.
    pub fn cancel_and_hold(&mut self, time: f64) {
        let held = self.value_at(time);
        while self.len > 0 && self.events[self.len - 1].time > time {
            self.len -= 1;
        }
        self.schedule(EventKind::Set, held, time);
    }

    /// Fold events at or before `time` into the base state.
    ///
    /// Values queried at or after `time` are unchanged.
    pub fn prune(&mut self, time: f64) {
        while self.len > 0 && self.events[0].time <= time {
            self.fold_oldest();
        }
    }

    pub fn event_count(&self) -> usize {
        self.len
    }

    /// Interpolated value at `time`.
    pub fn value_at(&self, time: f64) -> f32 {
        let mut cursor = self.base;

        for event in &self.events[..self.len] {
            if time < event.time {
                return match event.kind {
                    EventKind::Set | EventKind::Target { .. } => cursor.value(time),
                    EventKind::LinearRamp => {
                        let v0 = cursor.value(cursor.time);
                        lerp(cursor.time, v0, event.time, event.value, time)
                    }
                    EventKind::ExponentialRamp => {
                        let v0 = cursor.value(cursor.time);
                        exp_interp(cursor.time, v0, event.time, event.value, time)
                    }
                };
            }
            cursor = cursor.step(event);
        }

        cursor.value(time)
    }

    fn schedule(&mut self, kind: EventKind, value: f32, time: f64) {
        if !value.is_finite() || !time.is_finite() {
            return;
        }
        if self.len == MAX_EVENTS {
            self.fold_oldest();
        }

        // Keep time order; equal times keep insertion order.
        let idx = self.events[..self.len]
            .iter()
            .rposition(|e| e.time <= time)
            .map_or(0, |i| i + 1);

        self.events.copy_within(idx..self.len, idx + 1);
        self.events[idx] = AutomationEvent { kind, value, time };
        self.len += 1;
    }

    fn fold_oldest(&mut self) {
        if self.len == 0 {
            return;
        }
        self.base = self.base.step(&self.events[0]);
        self.events.copy_within(1..self.len, 0);
        self.len -= 1;
    }
}

fn lerp(t0: f64, v0: f32, t1: f64, v1: f32, t: f64) -> f32 {
    if t1 <= t0 {
        return v1;
    }
    let frac = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) as f32;
    v0 + (v1 - v0) * frac
}

fn exp_interp(t0: f64, v0: f32, t1: f64, v1: f32, t: f64) -> f32 {
    if t1 <= t0 {
        return v1;
    }
    let v0 = v0.max(FLOOR);
    let v1 = v1.max(FLOOR);
    let frac = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) as f32;
    v0 * (v1 / v0).powf(frac)
}
