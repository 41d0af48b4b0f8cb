// EquiEat - Fair Relief Rationing Core Library
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod model;      // Households, supplies, closed enumerations
pub mod error;      // Typed errors for import, model and session
pub mod importer;   // Delimited text → households (header guessing + explicit mapping)
pub mod inventory;  // Supply lines: manual entry + inventory sheets
pub mod engine;     // Allocation engine: eligibility, shares, flooring, leftovers
pub mod summary;    // Demographic summarizer
pub mod reports;    // Packing list, reserve report, claim stubs
pub mod audit;      // HTML audit trail
pub mod session;    // Application state: load → run → export
pub mod config;     // JSON configuration
pub mod logging;    // tracing subscriber setup

// Re-export commonly used types
pub use model::{
    Household, Supply, SupplyCategory, VulnerabilityAttribute, ReceivedItems,
    total_population,
};
pub use error::{ImportError, ModelError, SessionError};
pub use importer::{
    ColumnMapping, ImportOutcome,
    import_households, parse_households, parse_households_with_mapping,
};
pub use inventory::Inventory;
pub use engine::{
    AllocationEngine, Allocation, SupplyOutcome, Disposition,
    ReserveLine, ReserveStatus, reserve_lines,
};
pub use summary::{DemographicSummary, summarize};
pub use audit::{AuditAction, AuditLog};
pub use session::{ReliefSession, DistributionRun, ExportPaths};
pub use config::AppConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
