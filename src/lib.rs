//! # RedMUD - world persistence for a text game
//!
//! RedMUD stores the areas and rooms of a multiplayer text world in an embedded
//! key-value store and keeps the exits between rooms in step.
//!
//! ## Features
//!
//! - **Deterministic keys**: every record lives under a key rebuilt from its identifiers.
//! - **Room numbering**: per-area atomic counters hand out room numbers that are never reused.
//! - **Area bookkeeping**: an area's `size` follows its room count; emptied areas are purged or retained per config.
//! - **Exits**: bidirectional connections stored as two independent directed exits.
//! - **Async API**: every store operation is a future; the binary is the only blocking edge.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redmud::world::{AreaRecord, EmptyAreaPolicy, Exit, NewRoom, World};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let world = World::open_sled("./data/world", EmptyAreaPolicy::Purge)?;
//!     world
//!         .areas()
//!         .create_area("KDV", &AreaRecord::new("Kobold Valley", "A valley of kobolds."))
//!         .await?;
//!     let overlook = world
//!         .rooms()
//!         .add_room("KDV", &NewRoom::new("Western Overlook", "A short cliff."))
//!         .await?;
//!     let ledge = world
//!         .rooms()
//!         .add_room("KDV", &NewRoom::new("Ledge", "A narrow ledge."))
//!         .await?;
//!     world
//!         .rooms()
//!         .connect_rooms(
//!             &Exit::new(overlook.id(), "down"),
//!             &Exit::new(ledge.id(), "up"),
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`world`] - keys, store protocol, area and room stores, exits, seeding
//! - [`config`] - TOML configuration
//! - [`logutil`] - single-line escaping of player text for logs

pub mod config;
pub mod logutil;
pub mod world;
