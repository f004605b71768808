#![warn(clippy::all, missing_docs)]

//! Core logic for TaleWeaver, a three-card storytelling prompt.
//!
//! This crate hosts the image pool, random hand selection, the widget state
//! machine with its animation timing, asynchronous face loading and the
//! configuration layer used by the terminal frontend.

pub mod assets;
pub mod config;
pub mod error;
pub mod hand;
pub mod motion;
pub mod pool;
pub mod widget;

pub use assets::{AssetSource, CardAssets, CardFace};
pub use config::AppConfig;
pub use error::{AssetError, PoolError, SelectionError};
pub use hand::{select_hand, HAND_SIZE};
pub use motion::{SlotPosition, Timings, Turn};
pub use pool::{AssetLayout, ImageId, ImagePool};
pub use widget::{CardSlot, Effect, FaceStatus, Msg, Screen, ShufflePhase, WidgetState};
