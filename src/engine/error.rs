use sea_orm::DbErr;
use thiserror::Error;

use crate::models::orders::Status;

/// Rejections raised by the order lifecycle and its guards.
///
/// The business-rule variants (`QuotaExceeded`, `ActiveOrderExists`,
/// `PaymentRequired`) surface to the initiating party as chat text and are
/// never retried. `InvalidTransition` is a logic rejection: the attempted
/// move is always refused and the order left untouched, never coerced.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("order cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: Status, to: Status },
    #[error("order is not in work for this contractor")]
    NotInWork,
    #[error("estimate must be between 1 and 24 hours")]
    EstimateOutOfRange,
    #[error("monthly order quota exhausted")]
    QuotaExceeded,
    #[error("client already has an active order")]
    ActiveOrderExists,
    #[error("tariff is not paid")]
    PaymentRequired,
    #[error("party is not a client with a tariff attached")]
    MissingTariff,
    #[error("party role does not allow this operation")]
    WrongRole,
    #[error("order not found")]
    OrderNotFound,
    #[error(transparent)]
    Db(#[from] DbErr),
}
