use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};
use std::mem::size_of;

use crate::raffle_error::RaffleError;
use crate::utils::{find_config_address, find_raffle_address};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaffleInstruction {
    /// Create the config and raffle accounts and open the first round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The payer funding both accounts
    /// 1. `[writable]` The config account (PDA)
    /// 2. `[writable]` The raffle account (PDA)
    /// 3. `[]` The oracle allowed to deliver randomness
    /// 4. `[]` The system program
    InitializeRaffle {
        /// Minimum lamports per entry
        entrance_fee: u64,
        /// Minimum seconds between finalizations
        interval: u64,
        /// Oracle gas lane
        key_hash: [u8; 32],
        /// Oracle subscription billed for requests
        subscription_id: u64,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The entrant
    /// 1. `[]` The config account
    /// 2. `[writable]` The raffle account
    /// 3. `[]` The system program
    Enter {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Evaluate the upkeep predicate; the status is set as return data
    ///
    /// Accounts expected:
    /// 0. `[]` The config account
    /// 1. `[]` The raffle account
    CheckUpkeep,

    /// Lock the round and request randomness. Anyone can call this.
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[]` The config account
    /// 2. `[writable]` The raffle account
    PerformUpkeep,

    /// Deliver randomness for the outstanding request and pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The configured oracle
    /// 1. `[]` The config account
    /// 2. `[writable]` The raffle account
    /// 3. `[writable]` The drawn winner
    FulfillRandomness {
        /// Request being answered
        request_id: u64,
        /// Random value reduced modulo the player count
        random_value: u64,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, RaffleError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_u64(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, _) = Self::unpack_u64(rest)?;
                Self::InitializeRaffle {
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (random_value, _) = Self::unpack_u64(rest)?;
                Self::FulfillRandomness {
                    request_id,
                    random_value,
                }
            }
            _ => return Err(RaffleError::InvalidInstructionData),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match *self {
            Self::InitializeRaffle {
                entrance_fee,
                interval,
                ref key_hash,
                subscription_id,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomness {
                request_id,
                random_value,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&random_value.to_le_bytes());
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), RaffleError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), RaffleError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstructionData);
        }
        let (bytes, rest) = input.split_at(N);
        let bytes = bytes
            .try_into()
            .map_err(|_| RaffleError::InvalidInstructionData)?;
        Ok((bytes, rest))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    payer: &Pubkey,
    oracle: &Pubkey,
    entrance_fee: u64,
    interval: u64,
    key_hash: [u8; 32],
    subscription_id: u64,
) -> Instruction {
    let data = RaffleInstruction::InitializeRaffle {
        entrance_fee,
        interval,
        key_hash,
        subscription_id,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(find_config_address(program_id).0, false),
        AccountMeta::new(find_raffle_address(program_id).0, false),
        AccountMeta::new_readonly(*oracle, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create enter instruction
pub fn enter(program_id: &Pubkey, entrant: &Pubkey, amount: u64) -> Instruction {
    let data = RaffleInstruction::Enter { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*entrant, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_raffle_address(program_id).0, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new_readonly(find_raffle_address(program_id).0, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::CheckUpkeep.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(program_id: &Pubkey, caller: &Pubkey) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_raffle_address(program_id).0, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::PerformUpkeep.pack(),
    }
}

/// Create fulfill_randomness instruction
pub fn fulfill_randomness(
    program_id: &Pubkey,
    oracle: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_value: u64,
) -> Instruction {
    let data = RaffleInstruction::FulfillRandomness {
        request_id,
        random_value,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*oracle, true),
        AccountMeta::new_readonly(find_config_address(program_id).0, false),
        AccountMeta::new(find_raffle_address(program_id).0, false),
        AccountMeta::new(*winner, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_reads_what_pack_writes() {
        let instructions = [
            RaffleInstruction::InitializeRaffle {
                entrance_fee: 10_000_000,
                interval: 30,
                key_hash: [3u8; 32],
                subscription_id: 588,
            },
            RaffleInstruction::Enter { amount: 10_000_000 },
            RaffleInstruction::CheckUpkeep,
            RaffleInstruction::PerformUpkeep,
            RaffleInstruction::FulfillRandomness {
                request_id: 1,
                random_value: 9,
            },
        ];
        for instruction in instructions {
            assert_eq!(RaffleInstruction::unpack(&instruction.pack()), Ok(instruction));
        }
    }

    #[test]
    fn unpack_rejects_truncated_and_unknown_data() {
        assert_eq!(
            RaffleInstruction::unpack(&[]),
            Err(RaffleError::InvalidInstructionData)
        );
        assert_eq!(
            RaffleInstruction::unpack(&[1, 0, 0]),
            Err(RaffleError::InvalidInstructionData)
        );
        assert_eq!(
            RaffleInstruction::unpack(&[4, 1, 0, 0, 0, 0, 0, 0, 0]),
            Err(RaffleError::InvalidInstructionData)
        );
        assert_eq!(
            RaffleInstruction::unpack(&[9]),
            Err(RaffleError::InvalidInstructionData)
        );
    }

    #[test]
    fn fulfill_marks_only_the_oracle_as_signer() {
        let program_id = Pubkey::new_unique();
        let oracle = Pubkey::new_unique();
        let winner = Pubkey::new_unique();
        let ix = fulfill_randomness(&program_id, &oracle, &winner, 5, 6);
        let signers: Vec<Pubkey> = ix
            .accounts
            .iter()
            .filter(|meta| meta.is_signer)
            .map(|meta| meta.pubkey)
            .collect();
        assert_eq!(signers, vec![oracle]);
        assert!(ix.accounts[3].is_writable);
    }
}
