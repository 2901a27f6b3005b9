//! Media item metadata as seen by collection rules.
//!
//! The host catalog owns the real records. This crate only describes the
//! read-only snapshot that rules are evaluated against: a stable [`ItemId`]
//! plus the handful of attributes the expression language can address.

mod id;
mod item;

pub use self::id::ItemId;
pub use self::item::MediaItem;
