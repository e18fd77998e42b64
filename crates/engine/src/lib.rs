//! # Swatch Engine
//!
//! The Swatch engine keeps an in-memory list of color palettes consistent with
//! durable key/value records across create, update, reorder and delete
//! operations. It owns no storage itself: records go through a
//! [`RecordStore`](swatch_util::RecordStore) and identifiers come from an
//! [`IdGenerator`](swatch_util::IdGenerator), both supplied by the caller.
//!
//! ## Key Features
//!
//! - **Palette store**: create, rename/replace, delete palettes; each mutation writes one full record
//! - **Color editing**: add, edit, clone, delete and reorder colors addressed by session-local ids
//! - **Tolerant loading**: corrupt records are skipped and reported instead of failing start-up
//! - **Best-effort persistence**: storage failures never block in-memory edits; they are reported as [`WriteOutcome::NotPersisted`]
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use swatch_engine::PaletteStore;
//! use swatch_types::PersistedColor;
//! use swatch_util::{InMemoryRecordStore, SequentialIdGenerator};
//!
//! let mut store = PaletteStore::new(Arc::new(InMemoryRecordStore::new()), Arc::new(SequentialIdGenerator::new("id-")));
//! let (uuid, outcome) = store.create_palette("Reds");
//! assert!(outcome.is_persisted());
//!
//! let (color_id, _) = store.add_color(&uuid, Some(PersistedColor::new("Crimson", "#dc143c")))?;
//! assert_eq!(store.palette(&uuid).map(|palette| palette.colors.len()), Some(1));
//!
//! let _ = store.delete_color(&uuid, &color_id)?;
//! assert!(store.palette(&uuid).is_some_and(|palette| palette.colors.is_empty()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`codec`**: record keys and the JSON/percent-encoded record format
//! - **`loader`**: start-up hydration of palettes and the format preference
//! - **`store`**: the [`PaletteStore`] and its mutation primitives
//! - **`error`**: error and outcome types

pub mod codec;
pub mod error;
pub mod loader;
pub mod store;

pub use codec::{FORMAT_KEY, PALETTE_KEY_PREFIX, decode_palette, encode_palette, palette_key};
pub use error::{CodecError, PaletteError, ReorderViolation, WriteOutcome};
pub use loader::{LoadReport, SkippedRecord, load_format, load_palettes};
pub use store::PaletteStore;
