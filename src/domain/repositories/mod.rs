//! Repository access for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::lot::LotRepository;
use super::reservation::ReservationRepository;
use super::spot::SpotRepository;
use super::user::UserRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let lot = repos.lots().find_by_id(1).await?;
///     let free = repos.spots().find_first_available(1).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn lots(&self) -> &dyn LotRepository;
    fn spots(&self) -> &dyn SpotRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn users(&self) -> &dyn UserRepository;
}
