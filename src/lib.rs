//! # Multiworld Server
//!
//! State engine behind a cooperative multiworld sync server: which
//! locations hold which items, which hints each team may see, and how
//! messages travel to clients.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MULTIWORLD SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Shared primitives                         │
//! │  ├── ids.rs      - Slot/team/location/item ids, item flags   │
//! │  └── checks.rs   - Read-only check-state seam                │
//! │                                                              │
//! │  store/          - Location store (immutable)                │
//! │  ├── reference.rs- Ordered-map backend                       │
//! │  └── indexed.rs  - Pre-indexed backend                       │
//! │                                                              │
//! │  hints/          - Hint release                              │
//! │  ├── hint.rs     - Item hints                                │
//! │  ├── payload.rs  - Text and location-set payloads            │
//! │  ├── trigger.rs  - Free and location triggers                │
//! │  ├── index.rs    - Trigger index                             │
//! │  ├── release.rs  - Per-team release state machine            │
//! │  └── sink.rs     - Notification seam                         │
//! │                                                              │
//! │  network/        - Wire boundary                             │
//! │  ├── protocol.rs - Wire shapes                               │
//! │  └── codec.rs    - Allowlisted JSON codec                    │
//! │                                                              │
//! │  text/           - Human-readable output                     │
//! │  ├── parts.rs    - Typed message parts                       │
//! │  └── render.rs   - Terminal rendering                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//!
//! The store is read-only once built and may be shared freely. All hint
//! state belongs to one [`HintEngine`] and is mutated from a single task;
//! teams never share release records.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod hints;
pub mod network;
pub mod store;
pub mod text;

// Re-export commonly used types
pub use config::EngineConfig;
pub use crate::core::checks::{CheckState, CheckTable};
pub use crate::core::ids::{ItemFlags, ItemId, LocationId, SlotId, TeamId};
pub use hints::{HintEngine, HintKind, HintPayload, HintSink, Trigger, TriggerableHint};
pub use network::codec::{decode, encode, CodecError, WireValue};
pub use store::{build_store, GenerationData, LocationStore, StoreBackend, ValidationError};
pub use text::render::{render, NameLookup};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version advertised to clients.
pub const PROTOCOL_VERSION: network::protocol::Version = network::protocol::Version::new(0, 5, 1);
