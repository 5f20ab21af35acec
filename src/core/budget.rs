//! Time and size budgets
//!
//! Work is never interrupted; a budget is checked once the work returns and
//! an overrun turns the result into [`IndexError::BudgetExceeded`].

use crate::error::{IndexError, Result};
use std::time::{Duration, Instant};

/// Run `f` and fail if it took longer than `limit`
pub fn timed<T, F>(label: &str, limit: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let start = Instant::now();
    let value = f()?;
    let elapsed = start.elapsed();

    if elapsed > limit {
        tracing::warn!("{} took {:?}, over its {:?} budget", label, elapsed, limit);
        return Err(IndexError::time_budget_exceeded(
            label,
            elapsed.as_millis() as u64,
            limit.as_millis() as u64,
        ));
    }

    tracing::debug!("{} finished in {:?}", label, elapsed);
    Ok(value)
}

/// Fail if `measured` bytes exceed `limit`
pub fn enforce_size(label: &str, measured: u64, limit: u64) -> Result<()> {
    if measured > limit {
        return Err(IndexError::size_budget_exceeded(label, measured, limit));
    }
    Ok(())
}
