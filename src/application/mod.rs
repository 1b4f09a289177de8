pub mod services;

// Re-export key types for convenience
pub use services::{
    AllocationConfig, AllocationService, ClosedReservation, LotOccupancy, LotReconciler,
    LotService, LotUpdateOutcome, MonthlyUsage, ReportingService, ReservationLedger,
    ResizeOutcome, SpotRegistry, Summary, UserService,
};
