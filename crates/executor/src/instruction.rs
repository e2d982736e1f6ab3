//! Swap instruction codec for the constant-product swap program.
//!
//! Payload: `[1u8][amount_in: u64 LE][minimum_amount_out: u64 LE]`.
//! Accounts, in order: swap state, pool authority, user transfer authority
//! (signer), user source, pool source, pool destination, user destination,
//! pool mint, fee account, token program.

use crate::{ExecutorError, ExecutorResult};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

/// Opcode of the swap instruction.
pub const SWAP_OPCODE: u8 = 1;

/// Encoded payload length.
pub const SWAP_DATA_LEN: usize = 17;

/// Accounts per swap instruction.
pub const SWAP_ACCOUNT_COUNT: usize = 10;

/// Swap instruction payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SwapData {
    opcode: u8,
    pub amount_in: u64,
    pub minimum_amount_out: u64,
}

impl SwapData {
    pub fn new(amount_in: u64, minimum_amount_out: u64) -> Self {
        Self {
            opcode: SWAP_OPCODE,
            amount_in,
            minimum_amount_out,
        }
    }

    pub fn pack(&self) -> ExecutorResult<Vec<u8>> {
        borsh::to_vec(self).map_err(|e| ExecutorError::InvalidInstruction(e.to_string()))
    }

    pub fn unpack(data: &[u8]) -> ExecutorResult<Self> {
        let decoded = Self::try_from_slice(data)
            .map_err(|e| ExecutorError::InvalidInstruction(e.to_string()))?;
        if decoded.opcode != SWAP_OPCODE {
            return Err(ExecutorError::InvalidInstruction(format!(
                "unexpected opcode {}",
                decoded.opcode
            )));
        }
        Ok(decoded)
    }
}

/// Accounts referenced by one swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapAccounts {
    pub swap: Pubkey,
    pub authority: Pubkey,
    pub user_transfer_authority: Pubkey,
    pub user_source: Pubkey,
    pub pool_source: Pubkey,
    pub pool_destination: Pubkey,
    pub user_destination: Pubkey,
    pub pool_mint: Pubkey,
    pub fee_account: Pubkey,
    pub token_program: Pubkey,
}

impl SwapAccounts {
    pub fn to_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new_readonly(self.swap, false),
            AccountMeta::new_readonly(self.authority, false),
            AccountMeta::new_readonly(self.user_transfer_authority, true),
            AccountMeta::new(self.user_source, false),
            AccountMeta::new(self.pool_source, false),
            AccountMeta::new(self.pool_destination, false),
            AccountMeta::new(self.user_destination, false),
            AccountMeta::new(self.pool_mint, false),
            AccountMeta::new(self.fee_account, false),
            AccountMeta::new_readonly(self.token_program, false),
        ]
    }
}

/// Build one swap instruction.
pub fn swap_instruction(
    program_id: Pubkey,
    accounts: &SwapAccounts,
    data: SwapData,
) -> ExecutorResult<Instruction> {
    Ok(Instruction {
        program_id,
        accounts: accounts.to_metas(),
        data: data.pack()?,
    })
}
