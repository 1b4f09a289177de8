//! Read-side reporting
//!
//! Pure aggregation over stored reservations and spots. Nothing here
//! changes state.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{DomainResult, RepositoryProvider, SpotStatus};

/// Usage of one calendar month, keyed by reservation start
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyUsage {
    /// `YYYY-MM`
    pub month: String,
    pub bookings: u64,
    pub total_cost: Decimal,
    pub total_minutes: i64,
}

/// Occupancy snapshot of a lot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotOccupancy {
    pub lot_id: i32,
    pub name: String,
    pub capacity: u32,
    pub available: u64,
    pub occupied: u64,
}

pub struct ReportingService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ReportingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Reservations of a user grouped by month, oldest month first
    pub async fn monthly_usage(&self, user_id: i32) -> DomainResult<Vec<MonthlyUsage>> {
        let reservations = self.repos.reservations().find_by_user(user_id).await?;

        let mut months: BTreeMap<(i32, u32), MonthlyUsage> = BTreeMap::new();
        for r in reservations {
            let key = (r.started_at.year(), r.started_at.month());
            let entry = months.entry(key).or_insert_with(|| MonthlyUsage {
                month: format!("{:04}-{:02}", key.0, key.1),
                bookings: 0,
                total_cost: Decimal::ZERO,
                total_minutes: 0,
            });
            entry.bookings += 1;
            if let Some(cost) = r.cost {
                entry.total_cost += cost;
            }
            if let Some(duration) = r.duration() {
                entry.total_minutes += duration.total_minutes();
            }
        }

        Ok(months.into_values().collect())
    }

    pub async fn occupancy(&self) -> DomainResult<Vec<LotOccupancy>> {
        let lots = self.repos.lots().find_all().await?;
        let mut report = Vec::with_capacity(lots.len());

        for lot in lots {
            let available = self
                .repos
                .spots()
                .count_by_status(lot.id, SpotStatus::Available)
                .await?;
            let occupied = self
                .repos
                .spots()
                .count_by_status(lot.id, SpotStatus::Occupied)
                .await?;
            report.push(LotOccupancy {
                lot_id: lot.id,
                name: lot.name,
                capacity: lot.capacity,
                available,
                occupied,
            });
        }

        Ok(report)
    }
}
