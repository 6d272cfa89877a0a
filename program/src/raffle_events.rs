use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, program_error::ProgramError, pubkey::Pubkey};

/// An entrant was added to the current round
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryAccepted {
    pub player: Pubkey,
    pub player_count: u64,
}

/// Entry closed and randomness was requested
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundLocked {
    pub request_id: u64,
}

/// The drawn winner was paid the whole pool
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinnerSelected {
    pub winner: Pubkey,
    pub amount: u64,
}

/// Events written to the transaction log for off-chain consumers
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaffleEvent {
    EntryAccepted(EntryAccepted),
    RoundLocked(RoundLocked),
    WinnerSelected(WinnerSelected),
}

impl RaffleEvent {
    /// Logs the event as a readable line and as borsh-encoded program data
    pub fn emit(&self) -> Result<(), ProgramError> {
        match self {
            RaffleEvent::EntryAccepted(e) => {
                msg!("EntryAccepted: player={}, players={}", e.player, e.player_count)
            }
            RaffleEvent::RoundLocked(e) => msg!("RoundLocked: request_id={}", e.request_id),
            RaffleEvent::WinnerSelected(e) => {
                msg!("WinnerSelected: winner={}, amount={}", e.winner, e.amount)
            }
        }

        let data = self
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        sol_log_data(&[&data]);
        Ok(())
    }
}

impl From<EntryAccepted> for RaffleEvent {
    fn from(e: EntryAccepted) -> Self {
        RaffleEvent::EntryAccepted(e)
    }
}

impl From<RoundLocked> for RaffleEvent {
    fn from(e: RoundLocked) -> Self {
        RaffleEvent::RoundLocked(e)
    }
}

impl From<WinnerSelected> for RaffleEvent {
    fn from(e: WinnerSelected) -> Self {
        RaffleEvent::WinnerSelected(e)
    }
}
