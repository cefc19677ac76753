/// Data layer: report loading, cleaning, aggregation and filtering.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  sheet → RawTable (15 positional columns)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  coerce numerics, drop incomplete rows → ConversionTable
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌───────────┐  ┌──────────┐
///   │ aggregate  │  │  filter   │  Month / Placement selection
///   └───────────┘  └──────────┘
///        │              │
///        ▼              ▼
///   ┌──────────────────────┐
///   │ pipeline::DashboardView │  one value per chart panel
///   └──────────────────────┘
/// ```

pub mod aggregate;
pub mod clean;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod xlsx;

#[cfg(test)]
pub(crate) mod testing;
