//! Cancellation helpers shared by every suspension point of a turn.

use std::future::Future;

pub use tokio_util::sync::CancellationToken;

use crate::error::DomainError;

/// Awaits `future` unless `token` is cancelled first.
///
/// A token that is already cancelled short-circuits without polling the
/// future at all.
///
/// # Errors
///
/// Returns `DomainError::Cancelled` if cancellation wins, otherwise whatever
/// the future yields.
pub async fn until_cancelled<T, F>(token: &CancellationToken, future: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    if token.is_cancelled() {
        return Err(DomainError::Cancelled);
    }
    tokio::select! {
        biased;
        () = token.cancelled() => Err(DomainError::Cancelled),
        result = future => result,
    }
}
