use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TradeRecord;

#[derive(Error, Debug)]
pub enum CapitalError {
    #[error("Balance query failed: {0}")]
    QueryFailed(String),

    #[error("Insufficient balance: need {needed}, have {available}")]
    Insufficient { needed: f64, available: f64 },
}

/// Supplies available capital in the unit positions are sized in
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CapitalPort: Send + Sync {
    async fn available_balance(&self) -> Result<f64, CapitalError>;

    /// Settle a simulated trade against the balance. Read-only sources
    /// can ignore this.
    async fn settle(&self, _trade: &TradeRecord) -> Result<(), CapitalError> {
        Ok(())
    }
}
