//! Orchestration: wires the pure engines to the datasources and the
//! repository, one service per workflow.

pub mod commission;
pub mod quotes;
pub mod signature;
pub mod sweeps;

pub use commission::{CommissionError, CommissionService};
pub use quotes::{ensure_comparison_sendable, tender_csv, QuoteCollector, QuoteError};
pub use signature::{SendOutcome, SignatureService, SignatureSyncError};
pub use sweeps::{SweepReport, SweepService};
