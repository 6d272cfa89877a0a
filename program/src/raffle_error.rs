use solana_program::{decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaffleError {
    /// Entry paid less than the configured entrance fee
    #[error("Entrance fee not met: paid {paid}, required {required}")]
    InsufficientFee { paid: u64, required: u64 },

    /// Entry attempted while the round is being finalized
    #[error("Raffle round is not open")]
    RoundNotOpen,

    /// Upkeep requested while the maintenance predicate is false
    #[error("Upkeep not needed: balance={balance}, players={players}, state={state}")]
    UpkeepNotNeeded { balance: u64, players: u64, state: u8 },

    /// Randomness delivered for a request this raffle is not waiting on
    #[error("Unknown randomness request {request_id}")]
    UnknownRequest { request_id: u64 },

    /// The prize could not be moved to the drawn winner
    #[error("Payout to the drawn winner failed")]
    PayoutFailed,

    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Configuration values rejected at initialization
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    /// Randomness delivered by a key other than the configured oracle
    #[error("Only the configured oracle can deliver randomness")]
    UnauthorizedOracle,

    /// Player lookup past the end of the current round
    #[error("Player index out of range")]
    PlayerIndexOutOfRange,

    /// Lamport arithmetic overflowed
    #[error("Amount overflow")]
    AmountOverflow,
}

impl RaffleError {
    /// Stable custom error code surfaced through `ProgramError::Custom`
    pub fn code(&self) -> u32 {
        match self {
            RaffleError::InsufficientFee { .. } => 0,
            RaffleError::RoundNotOpen => 1,
            RaffleError::UpkeepNotNeeded { .. } => 2,
            RaffleError::UnknownRequest { .. } => 3,
            RaffleError::PayoutFailed => 4,
            RaffleError::InvalidInstructionData => 5,
            RaffleError::InvalidConfig => 6,
            RaffleError::UnauthorizedOracle => 7,
            RaffleError::PlayerIndexOutOfRange => 8,
            RaffleError::AmountOverflow => 9,
        }
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        msg!("{}", e);
        ProgramError::Custom(e.code())
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            ProgramError::from(RaffleError::InsufficientFee { paid: 1, required: 2 }),
            ProgramError::Custom(0)
        );
        assert_eq!(ProgramError::from(RaffleError::RoundNotOpen), ProgramError::Custom(1));
        assert_eq!(
            ProgramError::from(RaffleError::UpkeepNotNeeded { balance: 0, players: 0, state: 1 }),
            ProgramError::Custom(2)
        );
        assert_eq!(
            ProgramError::from(RaffleError::UnknownRequest { request_id: 7 }),
            ProgramError::Custom(3)
        );
        assert_eq!(ProgramError::from(RaffleError::PayoutFailed), ProgramError::Custom(4));
    }

    #[test]
    fn upkeep_not_needed_carries_diagnostics() {
        let err = RaffleError::UpkeepNotNeeded { balance: 10, players: 2, state: 1 };
        assert_eq!(err.to_string(), "Upkeep not needed: balance=10, players=2, state=1");
    }
}
