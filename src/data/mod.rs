//! Data layer: core types, loading, and filtering.
//!
//! Architecture:
//! ```text
//!  .csv / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  normalize columns, parse dates, drop invalid rows
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Dataset  │  records sorted by (location, date), country index
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  country + inclusive date range → FilteredView
//!   └──────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;
