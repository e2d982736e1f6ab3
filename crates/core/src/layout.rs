//! Account decode primitives.
//!
//! Fixed binary layouts for the three account kinds the engine reads:
//! - `SwapAccountLayout` - pool state of the constant-product swap program
//! - `MintLayout` - liquidity mint, read only for its authority
//! - `ReserveRecord` - token account holding one side of a pool (or the wallet balance)
//!
//! All integers are little-endian. Blobs longer than the layout are accepted,
//! trailing bytes are ignored.

use crate::DecodeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;

/// Decode a base64 account payload as delivered by the RPC node.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(STANDARD.decode(encoded)?)
}

fn read_prefix<T: BorshDeserialize>(
    data: &[u8],
    len: usize,
    layout: &'static str,
) -> Result<T, DecodeError> {
    if data.len() < len {
        return Err(DecodeError::TooShort {
            layout,
            expected: len,
            actual: data.len(),
        });
    }
    let mut buf = &data[..len];
    T::deserialize(&mut buf).map_err(|e| DecodeError::Malformed {
        layout,
        reason: e.to_string(),
    })
}

/// Swap account state.
#[derive(Debug, Clone, PartialEq, Eq, BorshDeserialize)]
pub struct SwapAccountLayout {
    pub version: u8,
    pub is_initialized: u8,
    pub bump_seed: u8,
    pub token_program_id: [u8; 32],
    pub token_a: [u8; 32],
    pub token_b: [u8; 32],
    pub pool_mint: [u8; 32],
    pub token_a_mint: [u8; 32],
    pub token_b_mint: [u8; 32],
    pub pool_fee_account: [u8; 32],
    pub host_fee_account: [u8; 32],
    pub admin: [u8; 32],
    pub pending_admin: [u8; 32],
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
    pub owner_trade_fee_numerator: u64,
    pub owner_trade_fee_denominator: u64,
    pub owner_withdraw_fee_numerator: u64,
    pub owner_withdraw_fee_denominator: u64,
    pub host_fee_numerator: u64,
    pub host_fee_denominator: u64,
    pub curve_type: u8,
    pub curve_parameters: [u8; 32],
}

impl SwapAccountLayout {
    /// Packed size in bytes.
    pub const LEN: usize = 3 + 10 * 32 + 8 * 8 + 1 + 32;

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        read_prefix(data, Self::LEN, "swap account")
    }

    pub fn token_a(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_a)
    }

    pub fn token_b(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_b)
    }

    pub fn pool_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.pool_mint)
    }

    pub fn pool_fee_account(&self) -> Pubkey {
        Pubkey::new_from_array(self.pool_fee_account)
    }

    pub fn token_program_id(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_program_id)
    }
}

/// Liquidity mint, read for its mint authority (the pool authority).
#[derive(Debug, Clone, PartialEq, Eq, BorshDeserialize)]
pub struct MintLayout {
    pub mint_authority_option: u32,
    pub mint_authority: [u8; 32],
    pub supply: u64,
    pub decimals: u8,
    pub is_initialized: u8,
    pub freeze_authority_option: u32,
    pub freeze_authority: [u8; 32],
}

impl MintLayout {
    pub const LEN: usize = 82;

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        read_prefix(data, Self::LEN, "mint")
    }

    /// The mint authority, or an error when the mint has none.
    pub fn authority(&self) -> Result<Pubkey, DecodeError> {
        if self.mint_authority_option == 0 {
            return Err(DecodeError::MissingAuthority);
        }
        Ok(Pubkey::new_from_array(self.mint_authority))
    }
}

/// Token account holding a reserve: 64 bytes of mint/owner, then the amount.
#[derive(Debug, Clone, PartialEq, Eq, BorshDeserialize)]
pub struct ReserveRecord {
    pub padding: [u8; 64],
    pub amount: u64,
}

impl ReserveRecord {
    pub const LEN: usize = 72;

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        read_prefix(data, Self::LEN, "reserve record")
    }

    /// Decode only the amount.
    pub fn decode_amount(data: &[u8]) -> Result<u64, DecodeError> {
        Self::decode(data).map(|r| r.amount)
    }
}
