//! # StashKV
//!
//! A local key-value store that keeps every value in its own file:
//! - One file per key, named `<key><extension>`
//! - Format picked per value on save, per extension on load
//! - JSON, YAML, CSV and NumPy `.npy` out of the box, raw bytes on request
//! - Persistent key → file index, rewritten after every save
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                              │
//! │            save / save_file / get / exists / count          │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │                               │
//!                ▼                               ▼
//!   ┌─────────────────────────┐        ┌───────────────────┐
//!   │    StrategyRegistry     │        │   StorageIndex    │
//!   │ (first match wins)      │        │  (index.json)     │
//!   └────────────┬────────────┘        └───────────────────┘
//!                │
//!     ┌──────┬───┴──┬──────┬──────┐
//!     ▼      ▼      ▼      ▼      ▼
//!   JSON   YAML    CSV    NPY   Blob
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use serde_json::json;
//! use stashkv::{Engine, StoredValue};
//!
//! let engine = Engine::open_path("./stashkv_data")?;
//! engine.save("user", &StoredValue::from(json!({"name": "Nizan", "age": 33})))?;
//!
//! let user = engine.get("user")?.expect("saved above");
//! assert_eq!(user.as_structured().unwrap()["name"], "Nizan");
//! # Ok::<(), stashkv::StashError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod strategy;
pub mod index;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StashError};
pub use config::{Config, UnknownFormatPolicy};
pub use value::{ArrayData, Cell, DType, NdArray, StoredValue, Table};
pub use strategy::{FormatStrategy, StrategyRegistry};
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StashKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
