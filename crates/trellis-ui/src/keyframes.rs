use std::time::Duration;

use trellis_core::{AnimationValue, Easing};

/// When a key frame is reached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyTime {
    TimeSpan(Duration),
    /// Fraction (0..=1) of the animation's total duration.
    Percent(f64),
    /// Spread evenly between the neighbouring resolved frames.
    Uniform,
    /// Spread so that the value changes at a constant rate.
    Paced,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyFrame {
    pub key_time: KeyTime,
    pub value: AnimationValue,
    pub easing: Easing,
}

impl KeyFrame {
    pub fn new(key_time: KeyTime, value: impl Into<AnimationValue>) -> Self {
        Self {
            key_time,
            value: value.into(),
            easing: Easing::Linear,
        }
    }

    pub fn at(time: Duration, value: impl Into<AnimationValue>) -> Self {
        Self::new(KeyTime::TimeSpan(time), value)
    }

    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// A key frame with its time fixed, in applied order.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedFrame {
    /// Offset from the start of the run.
    pub at: Duration,
    /// Time from the previous resolved frame (from the start for the first).
    pub duration: Duration,
    pub value: AnimationValue,
    pub easing: Easing,
}

const DEFAULT_TOTAL: Duration = Duration::from_secs(1);

/// Total the percent and trailing key times are measured against.
pub fn total_duration(frames: &[KeyFrame], explicit: Option<Duration>) -> Duration {
    explicit
        .or_else(|| largest_time_span(frames))
        .unwrap_or(DEFAULT_TOTAL)
}

fn largest_time_span(frames: &[KeyFrame]) -> Option<Duration> {
    frames
        .iter()
        .filter_map(|f| match f.key_time {
            KeyTime::TimeSpan(t) => Some(t),
            _ => None,
        })
        .max()
}

/// Fixes every key time and sorts the frames into applied order.
///
/// Ties keep their declaration order.
pub fn resolve_key_frames(frames: &[KeyFrame], explicit: Option<Duration>) -> Vec<ResolvedFrame> {
    if frames.is_empty() {
        return Vec::new();
    }
    let total = total_duration(frames, explicit).as_secs_f64();
    let last = frames.len() - 1;

    let mut times: Vec<Option<f64>> = frames
        .iter()
        .map(|f| match f.key_time {
            KeyTime::TimeSpan(t) => Some(t.as_secs_f64()),
            KeyTime::Percent(p) => Some(p.clamp(0.0, 1.0) * total),
            KeyTime::Uniform | KeyTime::Paced => None,
        })
        .collect();

    if times[last].is_none() {
        times[last] = Some(total);
    }
    if times[0].is_none() && frames[0].key_time == KeyTime::Paced {
        times[0] = Some(0.0);
    }

    // Fill each run of unresolved frames between two resolved anchors. The
    // frame before the first one is a virtual anchor at 0.
    let mut i = 0;
    while i <= last {
        if times[i].is_some() {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i;
        while times[end].is_none() {
            end += 1;
        }
        let from = if start == 0 { 0.0 } else { times[start - 1].unwrap_or(0.0) };
        let to = times[end].unwrap_or(total);
        let paced = frames[start..end]
            .iter()
            .any(|f| f.key_time == KeyTime::Paced);

        if paced && start > 0 {
            fill_paced(frames, &mut times, start - 1, end, from, to);
        } else {
            let steps = (end - start + 1) as f64;
            let anchor = start as f64 - 1.0;
            for (k, t) in times.iter_mut().enumerate().take(end).skip(start) {
                *t = Some(from + (to - from) * ((k as f64 - anchor) / steps));
            }
        }
        i = end + 1;
    }

    let mut resolved: Vec<ResolvedFrame> = frames
        .iter()
        .zip(&times)
        .map(|(f, t)| ResolvedFrame {
            at: match f.key_time {
                KeyTime::TimeSpan(exact) => exact,
                _ => seconds(t.unwrap_or(total)),
            },
            duration: Duration::ZERO,
            value: f.value,
            easing: f.easing,
        })
        .collect();
    resolved.sort_by_key(|f| f.at);

    let mut previous = Duration::ZERO;
    for f in &mut resolved {
        f.duration = f.at.saturating_sub(previous);
        previous = f.at;
    }
    resolved
}

fn seconds(t: f64) -> Duration {
    if t.is_finite() && t > 0.0 {
        Duration::from_secs_f64(t)
    } else {
        Duration::ZERO
    }
}

/// Spreads `(a, b)` so each frame's share of `to - from` matches its share
/// of the value distance covered between the anchors `a` and `b`.
fn fill_paced(
    frames: &[KeyFrame],
    times: &mut [Option<f64>],
    a: usize,
    b: usize,
    from: f64,
    to: f64,
) {
    let mut cumulative = Vec::with_capacity(b - a);
    let mut walked = 0.0;
    for k in a + 1..=b {
        walked += frames[k - 1].value.distance(&frames[k].value);
        cumulative.push(walked);
    }
    let steps = (b - a) as f64;
    for k in a + 1..b {
        let share = if walked > 0.0 {
            cumulative[k - a - 1] / walked
        } else {
            (k - a) as f64 / steps
        };
        times[k] = Some(from + (to - from) * share);
    }
}
