//! Tool catalog
//!
//! ```text
//! backend "weather" ── forecast ─┐
//!                                ├─> ToolCatalog ──> model sees weather__forecast,
//! backend "dataset" ── search ───┘                   dataset__search
//!
//! model calls weather__forecast ──> resolve() ──> ("weather", "forecast")
//! ```

mod catalog;

pub use catalog::{catalog_name, normalize_schema, CatalogRoute, ToolCatalog};
