/// Data layer: reading types, filtering, and host-side loading.
///
/// Architecture:
/// ```text
///  config envelope            .json / .csv batch
///        │                           │
///        ▼                           ▼
///   ┌──────────────┐           ┌──────────┐
///   │ FilterConfig  │           │  loader   │  parse file → ReadingBatch
///   └──────────────┘           └──────────┘
///        │                           │
///        └─────────────┬─────────────┘
///                      ▼
///                ┌──────────┐
///                │  filter   │  offset + clamp allow-listed readings
///                └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
