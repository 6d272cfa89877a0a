// Autonomous raffle program: entrants pay a fixed fee, an automation caller
// locks the round once its interval has passed, and an oracle's random value
// picks the winner who receives the whole pool.

pub mod raffle_error;
pub mod raffle_events;
pub mod raffle_instruction;
pub mod raffle_processor;
pub mod raffle_round;
pub mod raffle_state;
pub mod utils;
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
mod raffle_entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    raffle_processor::Processor::process(program_id, accounts, instruction_data)
}
