//! Simulated wallet service and the withdrawal flow.
//!
//! The wallet never gates progression. Connecting stores an address on
//! the player; a successful withdrawal removes the withdrawn coins.
//! Validation failures carry the message shown to the player.

use crate::{
    config::WalletConfig,
    engine::GameEngine,
    error::{GameError, GameResult},
    event::GameEvent,
    rng::{FeatureRng, RngSlot},
};
use std::{thread, time::Duration};
use thiserror::Error;

/// Length of the random part of a simulated address.
const ADDRESS_BODY_LEN: usize = 44;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub success:        bool,
    pub transaction_id: String,
}

/// Contract of an external wallet. The only implementation is simulated.
pub trait WalletService {
    fn connect(&mut self) -> GameResult<String>;
    fn withdraw(&mut self, address: &str, amount: u64) -> GameResult<WithdrawReceipt>;
    fn balance(&mut self, address: &str) -> GameResult<u64>;
}

pub struct SimulatedWallet {
    config: WalletConfig,
    rng:    FeatureRng,
}

impl SimulatedWallet {
    pub fn new(config: WalletConfig, rng: FeatureRng) -> Self {
        Self { config, rng }
    }

    fn wait(&self, ms: u64) {
        if ms > 0 {
            thread::sleep(Duration::from_millis(ms));
        }
    }
}

impl WalletService for SimulatedWallet {
    fn connect(&mut self) -> GameResult<String> {
        self.wait(self.config.connect_latency_ms);
        let body: String = (0..ADDRESS_BODY_LEN).map(|_| self.rng.base36_char()).collect();
        Ok(format!("EQA{body}"))
    }

    fn withdraw(&mut self, address: &str, amount: u64) -> GameResult<WithdrawReceipt> {
        self.wait(self.config.withdraw_latency_ms);
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.rng.next_u64().to_le_bytes());
        bytes[8..].copy_from_slice(&self.rng.next_u64().to_le_bytes());
        let id = uuid::Builder::from_random_bytes(bytes).into_uuid();
        log::debug!("simulated withdrawal of {amount} to {address}");
        Ok(WithdrawReceipt {
            success:        true,
            transaction_id: format!("tx_{}", id.simple()),
        })
    }

    fn balance(&mut self, address: &str) -> GameResult<u64> {
        self.wait(self.config.balance_latency_ms);
        if address.is_empty() {
            return Err(GameError::Wallet("no address".into()));
        }
        Ok(self.rng.next_u64_below(self.config.max_balance.max(1)))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WithdrawError {
    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("Not enough coins to withdraw")]
    InsufficientCoins,

    #[error("Minimum withdrawal is {} {currency}", grouped(.minimum))]
    BelowMinimum { minimum: u64, currency: String },

    #[error("Please connect your TON wallet first")]
    NoWallet,

    #[error("Failed to withdraw coins: {0}")]
    Failed(String),
}

/// Validate the amount a player typed. Checks run in a fixed order:
/// parse, balance, minimum, wallet.
pub fn validate_withdrawal(
    input: &str,
    coins: f64,
    wallet_address: Option<&str>,
    config: &WalletConfig,
) -> Result<u64, WithdrawError> {
    let amount = match input.trim().parse::<i64>() {
        Ok(n) if n > 0 => n as u64,
        _ => return Err(WithdrawError::InvalidAmount),
    };
    if amount as f64 > coins {
        return Err(WithdrawError::InsufficientCoins);
    }
    if amount < config.min_withdrawal {
        return Err(WithdrawError::BelowMinimum {
            minimum:  config.min_withdrawal,
            currency: config.currency.clone(),
        });
    }
    if wallet_address.is_none() {
        return Err(WithdrawError::NoWallet);
    }
    Ok(amount)
}

fn grouped(n: &u64) -> String {
    group_thousands(*n)
}

/// `10000` → `"10,000"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

impl GameEngine {
    /// The simulated wallet for this session, on its own RNG stream.
    pub fn simulated_wallet(&self) -> SimulatedWallet {
        SimulatedWallet::new(self.config.wallet.clone(), self.rng_bank.for_slot(RngSlot::Wallet))
    }

    pub fn connect_wallet(&mut self, wallet: &mut dyn WalletService) -> GameResult<String> {
        let address = wallet.connect()?;
        self.set_wallet_address(&address);
        Ok(address)
    }

    /// Validate, call the wallet, and debit coins on success.
    pub fn withdraw(
        &mut self,
        wallet: &mut dyn WalletService,
        input: &str,
    ) -> Result<WithdrawReceipt, WithdrawError> {
        let amount = validate_withdrawal(
            input,
            self.progress.coins,
            self.progress.wallet_address.as_deref(),
            &self.config.wallet,
        )?;
        let address = self
            .progress
            .wallet_address
            .clone()
            .ok_or(WithdrawError::NoWallet)?;

        let receipt = wallet
            .withdraw(&address, amount)
            .map_err(|e| WithdrawError::Failed(e.to_string()))?;
        if !receipt.success {
            return Err(WithdrawError::Failed("Withdrawal failed".into()));
        }

        self.remove_coins(amount as f64);
        self.record(GameEvent::CoinsWithdrawn {
            address,
            amount,
            transaction_id: receipt.transaction_id.clone(),
        });
        log::info!("withdrew {amount} ({})", receipt.transaction_id);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WalletConfig {
        WalletConfig::default()
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(10_000), "10,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn validation_order() {
        let c = config();
        assert_eq!(validate_withdrawal("abc", 1e6, Some("a"), &c), Err(WithdrawError::InvalidAmount));
        assert_eq!(validate_withdrawal("0", 1e6, Some("a"), &c), Err(WithdrawError::InvalidAmount));
        assert_eq!(validate_withdrawal("-5", 1e6, Some("a"), &c), Err(WithdrawError::InvalidAmount));
        assert_eq!(validate_withdrawal("20000", 15_000.0, None, &c), Err(WithdrawError::InsufficientCoins));
        assert!(matches!(
            validate_withdrawal("500", 15_000.0, None, &c),
            Err(WithdrawError::BelowMinimum { minimum: 10_000, .. })
        ));
        assert_eq!(validate_withdrawal("12000", 15_000.0, None, &c), Err(WithdrawError::NoWallet));
        assert_eq!(validate_withdrawal(" 12000 ", 15_000.0, Some("a"), &c), Ok(12_000));
    }

    #[test]
    fn below_minimum_message() {
        let err = WithdrawError::BelowMinimum { minimum: 10_000, currency: "$KNYE".into() };
        assert_eq!(err.to_string(), "Minimum withdrawal is 10,000 $KNYE");
    }
}
