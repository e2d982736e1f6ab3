//! Reference wallet balance shared with the subscription listener.

use loopswap_core::{DecodeError, ReserveRecord};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Single-writer balance cell.
///
/// The listener task overwrites it on every notification; the main loop reads
/// whatever value is current. Readers may see a value one notification old.
#[derive(Debug, Clone, Default)]
pub struct WalletBalance {
    amount: Arc<AtomicU64>,
}

impl WalletBalance {
    pub fn new(initial: u64) -> Self {
        Self {
            amount: Arc::new(AtomicU64::new(initial)),
        }
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.amount.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self, amount: u64) {
        self.amount.store(amount, Ordering::Relaxed);
    }

    /// Decode a token account blob and store its amount.
    pub fn apply_account_data(&self, data: &[u8]) -> Result<u64, DecodeError> {
        let amount = ReserveRecord::decode_amount(data)?;
        self.set(amount);
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::reserve_blob;

    #[test]
    fn test_clones_share_value() {
        let balance = WalletBalance::new(10);
        let writer = balance.clone();
        writer.set(42);
        assert_eq!(balance.get(), 42);
    }

    #[test]
    fn test_apply_account_data() {
        let balance = WalletBalance::default();
        assert_eq!(balance.apply_account_data(&reserve_blob(1_234)).unwrap(), 1_234);
        assert_eq!(balance.get(), 1_234);

        assert!(balance.apply_account_data(&[0u8; 8]).is_err());
        assert_eq!(balance.get(), 1_234);
    }
}
