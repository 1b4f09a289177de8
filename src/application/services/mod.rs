//! Application services

mod allocation;
mod ledger;
mod lot_reconciler;
mod lot_service;
mod reporting;
mod spot_registry;
mod user_service;

pub use allocation::{AllocationConfig, AllocationService};
pub use ledger::{ClosedReservation, ReservationLedger, Summary};
pub use lot_reconciler::{LotReconciler, ResizeOutcome};
pub use lot_service::{LotService, LotUpdateOutcome};
pub use reporting::{LotOccupancy, MonthlyUsage, ReportingService};
pub use spot_registry::SpotRegistry;
pub use user_service::UserService;
