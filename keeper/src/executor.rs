//! # Dry-run Executors
//!
//! The keeper ships without chain connectivity. These executors log what a
//! live signer would do and report success, so the accumulation and flush
//! pipeline can run end to end. Decimals come from the config file.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use reward_tracker::{
    DecimalsLookup, FeeTier, HandlerError, LookupError, SignedWad, SwapExecutor, SwapOverrides,
    TokenId, TransferExecutor,
};

use crate::config::KeeperConfig;

/// Logs swaps and transfers instead of sending them.
#[derive(Debug, Clone)]
pub struct DryRunExecutor {
    default_decimals: u8,
    token_decimals: HashMap<String, u8>,
}

impl DryRunExecutor {
    pub fn from_config(config: &KeeperConfig) -> Self {
        Self {
            default_decimals: config.default_decimals,
            token_decimals: config.token_decimals.clone(),
        }
    }
}

#[async_trait]
impl SwapExecutor for DryRunExecutor {
    async fn swap(
        &self,
        token: &TokenId,
        amount_wad: SignedWad,
        fee: FeeTier,
        overrides: &SwapOverrides,
    ) -> Result<(), HandlerError> {
        if !amount_wad.is_positive() {
            return Err(HandlerError::Swap(format!(
                "refusing to swap non-positive amount {}",
                amount_wad
            )));
        }
        info!(
            %token,
            amount = %amount_wad,
            %fee,
            gas_limit = ?overrides.gas_limit,
            slippage_bps = ?overrides.slippage_bps,
            "[dry-run] swap to base asset"
        );
        Ok(())
    }
}

#[async_trait]
impl TransferExecutor for DryRunExecutor {
    async fn transfer(
        &self,
        token: &TokenId,
        destination: &str,
        amount_native: u128,
    ) -> Result<(), HandlerError> {
        if destination.is_empty() {
            return Err(HandlerError::Transfer("empty destination".into()));
        }
        info!(%token, destination, amount_native, "[dry-run] token transfer");
        Ok(())
    }
}

#[async_trait]
impl DecimalsLookup for DryRunExecutor {
    async fn decimals(&self, token: &TokenId) -> Result<u8, LookupError> {
        Ok(self
            .token_decimals
            .get(token.as_str())
            .copied()
            .unwrap_or(self.default_decimals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> DryRunExecutor {
        let mut config = KeeperConfig::default();
        config.token_decimals.insert("0xUSDC".into(), 6);
        DryRunExecutor::from_config(&config)
    }

    #[tokio::test]
    async fn decimals_fall_back_to_default() {
        let exec = executor();
        assert_eq!(exec.decimals(&TokenId::new("0xUSDC")).await.unwrap(), 6);
        assert_eq!(exec.decimals(&TokenId::new("0xDAI")).await.unwrap(), 18);
    }

    #[tokio::test]
    async fn empty_destination_rejected() {
        let result = executor().transfer(&TokenId::new("0xDAI"), "", 1).await;
        assert!(matches!(result, Err(HandlerError::Transfer(_))));
    }

    #[tokio::test]
    async fn non_positive_swap_rejected() {
        let result = executor()
            .swap(
                &TokenId::new("0xDAI"),
                SignedWad::ZERO,
                FeeTier(3000),
                &SwapOverrides::default(),
            )
            .await;
        assert!(matches!(result, Err(HandlerError::Swap(_))));
    }
}
