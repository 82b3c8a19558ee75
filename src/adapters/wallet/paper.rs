//! Paper Wallet
//!
//! Simulated quote balance. Entries lock their notional, exits release the
//! entry value plus realized profit. No orders are ever sent anywhere.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::{TradeKind, TradeRecord};
use crate::ports::capital::{CapitalError, CapitalPort};

#[derive(Debug)]
pub struct PaperWallet {
    initial_balance: f64,
    balance: RwLock<f64>,
}

impl PaperWallet {
    pub fn new(initial_balance: f64) -> Self {
        info!("Paper wallet initialized with {:.4} quote", initial_balance);
        Self {
            initial_balance,
            balance: RwLock::new(initial_balance),
        }
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub async fn balance(&self) -> f64 {
        *self.balance.read().await
    }

    /// Reset to the initial balance
    pub async fn reset(&self) {
        *self.balance.write().await = self.initial_balance;
    }
}

#[async_trait]
impl CapitalPort for PaperWallet {
    async fn available_balance(&self) -> Result<f64, CapitalError> {
        Ok(*self.balance.read().await)
    }

    async fn settle(&self, trade: &TradeRecord) -> Result<(), CapitalError> {
        let mut balance = self.balance.write().await;
        let delta = trade.cash_delta();

        if trade.kind == TradeKind::Entry && *balance + delta < -1e-9 {
            return Err(CapitalError::Insufficient {
                needed: -delta,
                available: *balance,
            });
        }

        *balance += delta;
        debug!("Paper wallet settled {:+.6}, balance {:.6}", delta, *balance);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, Side};
    use approx::assert_relative_eq;
    use chrono::Utc;

    #[tokio::test]
    async fn test_entry_then_exit_round_trip() {
        let wallet = PaperWallet::new(10.0);

        let entry = TradeRecord::entry(Side::Long, 100.0, 0.05, Utc::now());
        wallet.settle(&entry).await.unwrap();
        assert_relative_eq!(wallet.balance().await, 5.0, epsilon = 1e-9);

        let exit = TradeRecord::exit(
            TradeKind::FullExit, Side::Long, 97.5, 0.05, Utc::now(), -0.125, -2.5, ExitReason::StopLoss,
        );
        wallet.settle(&exit).await.unwrap();
        assert_relative_eq!(wallet.available_balance().await.unwrap(), 9.875, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_entry_larger_than_balance_rejected() {
        let wallet = PaperWallet::new(1.0);
        let entry = TradeRecord::entry(Side::Long, 100.0, 0.05, Utc::now());

        let result = wallet.settle(&entry).await;
        assert!(matches!(result, Err(CapitalError::Insufficient { .. })));
        assert_relative_eq!(wallet.balance().await, 1.0);
    }

    #[test]
    fn test_reset() {
        tokio_test::block_on(async {
            let wallet = PaperWallet::new(10.0);
            let entry = TradeRecord::entry(Side::Short, 100.0, 0.05, Utc::now());
            wallet.settle(&entry).await.unwrap();
            wallet.reset().await;
            assert_relative_eq!(wallet.balance().await, 10.0);
            assert_relative_eq!(wallet.initial_balance(), 10.0);
        });
    }
}
