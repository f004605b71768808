//! Widget state and its single update function.
//!
//! Every user action, timer expiry and asset result arrives as a [`Msg`]. The
//! update function mutates [`WidgetState`] and returns the [`Effect`]s the host
//! must carry out: delayed messages, a fresh deal, or asset loads.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::{
    assets::CardFace,
    error::{AssetError, SelectionError},
    motion::{self, SlotPosition, Timings, Turn},
    pool::ImageId,
};

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Logo shown while the first hand is prepared.
    Loading,
    /// Cards and controls are interactive.
    Ready,
}

/// Progress of a reshuffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShufflePhase {
    /// No reshuffle in flight.
    Idle,
    /// Flip cleared, waiting for the slide to begin.
    Pending,
    /// Slide animation running since `started`.
    Sliding {
        /// When the slide began.
        started: Instant,
    },
}

/// Load status of one card's face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceStatus {
    /// Load still in flight.
    Pending,
    /// Face available for display.
    Ready(CardFace),
    /// Load failed; shown as a broken card.
    Broken(AssetError),
}

/// One card in the hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSlot {
    /// Image dealt into this slot.
    pub image: ImageId,
    /// Load status of its face.
    pub face: FaceStatus,
}

/// A card rotation: which slot, and when it would have begun from rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flip {
    /// Slot being turned.
    pub index: usize,
    /// Start of the rotation; backdated when it reverses mid-turn.
    pub started: Instant,
}

/// Messages the widget reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The widget was shown for the first time.
    Mounted,
    /// The loading delay is over.
    LoadingElapsed,
    /// The user asked for a new hand.
    Reshuffle,
    /// The pre-shuffle pause is over; start sliding.
    SlideStart,
    /// The slide animation is over.
    SlideEnd,
    /// A new hand was drawn, or drawing failed.
    Dealt(Result<Vec<ImageId>, SelectionError>),
    /// One card's face finished loading.
    FaceLoaded {
        /// Deal the load was requested for.
        generation: u64,
        /// Slot index within that deal.
        slot: usize,
        /// Loaded face or the reason it is unavailable.
        result: Result<CardFace, AssetError>,
    },
    /// The user clicked card `index`.
    CardClicked(usize),
    /// Show or hide the About overlay.
    ToggleAbout,
    /// The overlay close control.
    CloseAbout,
}

/// Work the host performs on the widget's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver `msg` after `after` has elapsed.
    Schedule {
        /// Delay before delivery.
        after: Duration,
        /// Message to deliver.
        msg: Msg,
    },
    /// Draw a new hand and answer with [`Msg::Dealt`].
    Deal,
    /// Load a face and answer with [`Msg::FaceLoaded`].
    LoadFace {
        /// Deal the slot belongs to.
        generation: u64,
        /// Slot index.
        slot: usize,
        /// Image to load.
        image: ImageId,
    },
}

/// Complete UI state of the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetState {
    screen: Screen,
    shuffle: ShufflePhase,
    flipped: Option<Flip>,
    /// Most recent unflip, kept so the reverse rotation can be drawn.
    settling: Option<Flip>,
    about_visible: bool,
    hand: Vec<CardSlot>,
    generation: u64,
    last_error: Option<SelectionError>,
    timings: Timings,
}

impl WidgetState {
    /// Fresh state on the loading screen with no hand.
    pub fn new(timings: Timings) -> Self {
        Self {
            screen: Screen::Loading,
            shuffle: ShufflePhase::Idle,
            flipped: None,
            settling: None,
            about_visible: false,
            hand: Vec::new(),
            generation: 0,
            last_error: None,
            timings,
        }
    }

    /// Current top-level screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Whether the loading screen is showing.
    pub fn is_loading(&self) -> bool {
        self.screen == Screen::Loading
    }

    /// Current reshuffle phase.
    pub fn shuffle_phase(&self) -> ShufflePhase {
        self.shuffle
    }

    /// True while a reshuffle is pending or sliding.
    pub fn is_shuffling(&self) -> bool {
        self.shuffle != ShufflePhase::Idle
    }

    /// Index of the face-up card, if any.
    pub fn flipped(&self) -> Option<usize> {
        self.flipped.map(|flip| flip.index)
    }

    /// Whether the About overlay is open.
    pub fn about_visible(&self) -> bool {
        self.about_visible
    }

    /// Cards currently dealt.
    pub fn hand(&self) -> &[CardSlot] {
        &self.hand
    }

    /// Number of hands dealt so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The last selection failure, until the next successful deal.
    pub fn last_error(&self) -> Option<&SelectionError> {
        self.last_error.as_ref()
    }

    /// Whether any animation still needs frames at `now`.
    pub fn is_animating(&self, now: Instant) -> bool {
        let flip_running = self
            .flipped
            .iter()
            .chain(self.settling.iter())
            .any(|flip| motion::progress(flip.started, now, self.timings.flip()) < 1.0);
        matches!(self.shuffle, ShufflePhase::Sliding { .. }) || flip_running
    }

    /// Rotation of card `index` at `now`.
    pub fn turn(&self, index: usize, now: Instant) -> Turn {
        let duration = self.timings.flip();
        match (self.flipped, self.settling) {
            (Some(flip), _) if flip.index == index => {
                Turn::at(motion::progress(flip.started, now, duration), true)
            }
            (_, Some(flip)) if flip.index == index => {
                Turn::at(motion::progress(flip.started, now, duration), false)
            }
            _ => Turn::at(1.0, false),
        }
    }

    /// Horizontal slide of card `index` at `now`, in card widths.
    pub fn slide_offset(&self, index: usize, now: Instant) -> f32 {
        match self.shuffle {
            ShufflePhase::Sliding { started } => {
                let progress = motion::progress(started, now, self.timings.shuffle());
                SlotPosition::of(index, self.hand.len()).slide_offset(progress)
            }
            _ => 0.0,
        }
    }

    /// Apply one message at time `now`.
    pub fn update(&mut self, msg: Msg, now: Instant) -> Vec<Effect> {
        match msg {
            Msg::Mounted => {
                self.screen = Screen::Loading;
                vec![
                    Effect::Schedule {
                        after: self.timings.loading(),
                        msg: Msg::LoadingElapsed,
                    },
                    Effect::Deal,
                ]
            }
            Msg::LoadingElapsed => {
                if self.screen == Screen::Loading {
                    info!(cards = self.hand.len(), "Loading finished");
                }
                self.screen = Screen::Ready;
                Vec::new()
            }
            Msg::Reshuffle => self.begin_reshuffle(now),
            Msg::SlideStart => {
                if self.shuffle != ShufflePhase::Pending {
                    return Vec::new();
                }
                self.shuffle = ShufflePhase::Sliding { started: now };
                vec![Effect::Schedule {
                    after: self.timings.shuffle(),
                    msg: Msg::SlideEnd,
                }]
            }
            Msg::SlideEnd => {
                if !matches!(self.shuffle, ShufflePhase::Sliding { .. }) {
                    return Vec::new();
                }
                self.shuffle = ShufflePhase::Idle;
                vec![Effect::Deal]
            }
            Msg::Dealt(result) => self.apply_deal(result),
            Msg::FaceLoaded {
                generation,
                slot,
                result,
            } => {
                self.apply_face(generation, slot, result);
                Vec::new()
            }
            Msg::CardClicked(index) => {
                self.toggle_flip(index, now);
                Vec::new()
            }
            Msg::ToggleAbout => {
                self.about_visible = !self.about_visible;
                Vec::new()
            }
            Msg::CloseAbout => {
                self.about_visible = false;
                Vec::new()
            }
        }
    }

    fn begin_reshuffle(&mut self, now: Instant) -> Vec<Effect> {
        if self.screen == Screen::Loading {
            debug!("Ignoring reshuffle while loading");
            return Vec::new();
        }
        if self.is_shuffling() {
            debug!(phase = ?self.shuffle, "Ignoring reshuffle already in progress");
            return Vec::new();
        }

        self.unflip(now);
        self.shuffle = ShufflePhase::Pending;
        vec![Effect::Schedule {
            after: self.timings.shuffle_delay(),
            msg: Msg::SlideStart,
        }]
    }

    fn apply_deal(&mut self, result: Result<Vec<ImageId>, SelectionError>) -> Vec<Effect> {
        let images = match result {
            Ok(images) => images,
            Err(err) => {
                warn!(%err, "Hand selection failed; keeping previous hand");
                self.last_error = Some(err);
                return Vec::new();
            }
        };

        self.generation += 1;
        self.last_error = None;
        self.flipped = None;
        self.settling = None;
        info!(
            generation = self.generation,
            hand = ?images.iter().map(ImageId::as_str).collect::<Vec<_>>(),
            "Dealt new hand"
        );

        self.hand = images
            .iter()
            .cloned()
            .map(|image| CardSlot {
                image,
                face: FaceStatus::Pending,
            })
            .collect();
        images
            .into_iter()
            .enumerate()
            .map(|(slot, image)| Effect::LoadFace {
                generation: self.generation,
                slot,
                image,
            })
            .collect()
    }

    fn apply_face(&mut self, generation: u64, slot: usize, result: Result<CardFace, AssetError>) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Dropping stale face");
            return;
        }
        let Some(card) = self.hand.get_mut(slot) else {
            return;
        };
        card.face = match result {
            Ok(face) if face.id == card.image => FaceStatus::Ready(face),
            Ok(face) => {
                warn!(slot, expected = %card.image, got = %face.id, "Face for wrong card");
                return;
            }
            Err(err) => {
                warn!(slot, image = %card.image, %err, "Card face unavailable");
                FaceStatus::Broken(err)
            }
        };
    }

    fn toggle_flip(&mut self, index: usize, now: Instant) {
        if self.screen == Screen::Loading || index >= self.hand.len() {
            return;
        }
        if self.flipped() == Some(index) {
            self.unflip(now);
            return;
        }

        // A card still turning back resumes from its current angle.
        let started = match self.settling {
            Some(flip) if flip.index == index => self.reversed_start(flip, now),
            _ => now,
        };
        self.unflip(now);
        self.flipped = Some(Flip { index, started });
    }

    fn unflip(&mut self, now: Instant) {
        if let Some(flip) = self.flipped.take() {
            self.settling = Some(Flip {
                index: flip.index,
                started: self.reversed_start(flip, now),
            });
        }
    }

    /// Start time for the opposite rotation so it picks up at the angle `flip` has reached.
    ///
    /// The easing curve is symmetric, so progress `p` forwards equals `1 - p` backwards.
    fn reversed_start(&self, flip: Flip, now: Instant) -> Instant {
        let duration = self.timings.flip();
        let elapsed = now.saturating_duration_since(flip.started).min(duration);
        now.checked_sub(duration - elapsed).unwrap_or(now)
    }
}

impl Default for WidgetState {
    fn default() -> Self {
        Self::new(Timings::default())
    }
}
