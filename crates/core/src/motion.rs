//! Phase durations and animation curves.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Peak horizontal travel of an outer card during a shuffle, in card widths.
pub const SLIDE_PEAK: f32 = 1.7;

/// Durations of every timed phase, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Loading screen before the hand appears.
    pub loading_ms: u64,
    /// Pause between clearing a flip and starting the slide.
    pub shuffle_delay_ms: u64,
    /// Length of the slide animation.
    pub shuffle_ms: u64,
    /// Length of a flip rotation.
    pub flip_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            loading_ms: 1000,
            shuffle_delay_ms: 300,
            shuffle_ms: 1000,
            flip_ms: 800,
        }
    }
}

impl Timings {
    /// Loading screen duration.
    pub fn loading(&self) -> Duration {
        Duration::from_millis(self.loading_ms)
    }

    /// Pause before the slide.
    pub fn shuffle_delay(&self) -> Duration {
        Duration::from_millis(self.shuffle_delay_ms)
    }

    /// Slide duration.
    pub fn shuffle(&self) -> Duration {
        Duration::from_millis(self.shuffle_ms)
    }

    /// Flip duration.
    pub fn flip(&self) -> Duration {
        Duration::from_millis(self.flip_ms)
    }
}

/// Where a card sits in the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPosition {
    /// First card; slides right and back.
    Left,
    /// Middle card; stays put.
    Center,
    /// Last card; slides left and back.
    Right,
}

impl SlotPosition {
    /// Position of slot `index` in a row of `len` cards.
    pub fn of(index: usize, len: usize) -> Self {
        if index == 0 && len > 1 {
            Self::Left
        } else if len > 1 && index + 1 == len {
            Self::Right
        } else {
            Self::Center
        }
    }

    /// Slide offset in card widths at `progress` (0..=1) of a shuffle.
    ///
    /// Outer cards travel toward the centre and back: triangular, peaking at half time.
    pub fn slide_offset(self, progress: f32) -> f32 {
        let progress = progress.clamp(0.0, 1.0);
        let travel = SLIDE_PEAK * (1.0 - (2.0 * progress - 1.0).abs());
        match self {
            Self::Left => travel,
            Self::Right => -travel,
            Self::Center => 0.0,
        }
    }
}

/// Fraction of `duration` elapsed between `started` and `now`, clamped to 0..=1.
pub fn progress(started: Instant, now: Instant, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(started);
    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
}

/// Rotation of a card in flight, from one face to the other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turn {
    /// Angle in degrees; 0 shows the back, 180 the face.
    pub angle: f32,
}

impl Turn {
    /// Angle reached at `progress` when turning toward `face_up`, eased in and out.
    pub fn at(progress: f32, face_up: bool) -> Self {
        let t = progress.clamp(0.0, 1.0);
        let eased = t * t * (3.0 - 2.0 * t);
        let angle = if face_up {
            180.0 * eased
        } else {
            180.0 * (1.0 - eased)
        };
        Self { angle }
    }

    /// Whether the face side is towards the viewer.
    pub fn shows_face(self) -> bool {
        self.angle > 90.0
    }

    /// Apparent width relative to the flat card, never fully zero.
    pub fn width_scale(self) -> f32 {
        self.angle.to_radians().cos().abs().max(0.08)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn positions_follow_slot_index() {
        assert_eq!(SlotPosition::of(0, 3), SlotPosition::Left);
        assert_eq!(SlotPosition::of(1, 3), SlotPosition::Center);
        assert_eq!(SlotPosition::of(2, 3), SlotPosition::Right);
        assert_eq!(SlotPosition::of(0, 1), SlotPosition::Center);
    }

    #[test]
    fn slides_peak_midway_and_return() {
        assert!(close(SlotPosition::Left.slide_offset(0.5), SLIDE_PEAK));
        assert!(close(SlotPosition::Right.slide_offset(0.5), -SLIDE_PEAK));
        assert!(close(SlotPosition::Left.slide_offset(0.25), SLIDE_PEAK / 2.0));
        for position in [SlotPosition::Left, SlotPosition::Center, SlotPosition::Right] {
            assert!(close(position.slide_offset(0.0), 0.0));
            assert!(close(position.slide_offset(1.0), 0.0));
        }
        for step in 0..=10 {
            assert!(close(SlotPosition::Center.slide_offset(step as f32 / 10.0), 0.0));
        }
    }

    #[test]
    fn progress_is_clamped() {
        let start = Instant::now();
        let second = Duration::from_secs(1);
        assert!(close(progress(start, start, second), 0.0));
        assert!(close(
            progress(start, start + Duration::from_millis(250), second),
            0.25
        ));
        assert!(close(progress(start, start + Duration::from_secs(5), second), 1.0));
        assert!(close(progress(start + second, start, second), 0.0));
        assert!(close(progress(start, start, Duration::ZERO), 1.0));
    }

    #[test]
    fn turn_switches_sides_halfway() {
        assert!(!Turn::at(0.0, true).shows_face());
        assert!(Turn::at(1.0, true).shows_face());
        assert!(Turn::at(0.0, false).shows_face());
        assert!(!Turn::at(1.0, false).shows_face());
        assert!(close(Turn::at(0.5, true).angle, 90.0));
        assert!(Turn::at(0.5, true).width_scale() < 0.1);
        assert!(close(Turn::at(1.0, true).width_scale(), 1.0));
    }
}
