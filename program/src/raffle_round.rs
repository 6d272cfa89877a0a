//! Round lifecycle: entry, the upkeep predicate, locking the round behind a
//! randomness request, and paying out once the randomness arrives.
//!
//! Everything here works on a borrowed [`Raffle`] and reaches the outside
//! world only through [`RandomnessOracle`] and [`PrizeTransfer`], so the
//! processor decides how requests are issued and how lamports move.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};

use crate::raffle_error::RaffleError;
use crate::raffle_events::{EntryAccepted, RoundLocked, WinnerSelected};
use crate::raffle_state::{Config, Raffle, RaffleState};

/// Outbound half of the randomness protocol
pub trait RandomnessOracle {
    /// Issues a request and returns the id the oracle will answer with
    fn request_random_value(&mut self) -> Result<u64, RaffleError>;
}

/// Moves the pooled prize to the drawn winner
pub trait PrizeTransfer {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), RaffleError>;
}

/// Result of evaluating the upkeep predicate, with the inputs that fed it
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub upkeep_needed: bool,
    pub is_open: bool,
    pub interval_elapsed: bool,
    pub has_players: bool,
    pub has_balance: bool,
    pub state: RaffleState,
    pub players: u64,
    pub balance: u64,
    pub seconds_elapsed: i64,
}

impl UpkeepStatus {
    /// Encoded size. The runtime trims trailing zero bytes from return
    /// data, so readers pad it back to this length before decoding.
    pub const LEN: usize = 5 + 1 + 8 + 8 + 8;
}

/// Index of the winning slot for a delivered random value
pub fn winner_index(random_value: u64, player_count: usize) -> Option<usize> {
    random_value
        .checked_rem(player_count as u64)
        .map(|index| index as usize)
}

impl Raffle {
    /// Adds `caller` to the current round for `amount` lamports.
    pub fn enter(
        &mut self,
        config: &Config,
        caller: Pubkey,
        amount: u64,
    ) -> Result<EntryAccepted, RaffleError> {
        if amount < config.entrance_fee {
            return Err(RaffleError::InsufficientFee {
                paid: amount,
                required: config.entrance_fee,
            });
        }
        if !self.is_open() {
            return Err(RaffleError::RoundNotOpen);
        }

        let pool_balance = self
            .pool_balance
            .checked_add(amount)
            .ok_or(RaffleError::AmountOverflow)?;

        self.pool_balance = pool_balance;
        self.players.push(caller);

        Ok(EntryAccepted {
            player: caller,
            player_count: self.number_of_players(),
        })
    }

    pub fn upkeep_status(&self, config: &Config, now: UnixTimestamp) -> UpkeepStatus {
        let seconds_elapsed = now.saturating_sub(self.last_timestamp);
        let is_open = self.is_open();
        let interval_elapsed = seconds_elapsed >= config.interval as i64;
        let has_players = !self.players.is_empty();
        let has_balance = self.pool_balance > 0;

        UpkeepStatus {
            upkeep_needed: is_open && interval_elapsed && has_players && has_balance,
            is_open,
            interval_elapsed,
            has_players,
            has_balance,
            state: self.state,
            players: self.number_of_players(),
            balance: self.pool_balance,
            seconds_elapsed,
        }
    }

    /// The predicate automation callers poll before performing upkeep
    pub fn check_upkeep(&self, config: &Config, now: UnixTimestamp) -> bool {
        self.upkeep_status(config, now).upkeep_needed
    }

    /// Locks the round and requests randomness. The predicate is evaluated
    /// again here regardless of what the caller observed, which also keeps
    /// at most one request outstanding.
    pub fn perform_upkeep<O: RandomnessOracle>(
        &mut self,
        config: &Config,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<RoundLocked, RaffleError> {
        let status = self.upkeep_status(config, now);
        if !status.upkeep_needed {
            return Err(RaffleError::UpkeepNotNeeded {
                balance: status.balance,
                players: status.players,
                state: status.state.into(),
            });
        }

        let request_id = oracle.request_random_value()?;

        self.state = RaffleState::Calculating;
        self.pending_request_id = Some(request_id);

        Ok(RoundLocked { request_id })
    }

    /// Settles the round for a delivered random value.
    ///
    /// Nothing is mutated unless the payout goes through. A failed payout
    /// leaves the round calculating with the pool intact, and the oracle
    /// can deliver the same value again to retry the transfer.
    pub fn fulfill_randomness<P: PrizeTransfer>(
        &mut self,
        request_id: u64,
        random_value: u64,
        now: UnixTimestamp,
        payout: &mut P,
    ) -> Result<WinnerSelected, RaffleError> {
        if self.state != RaffleState::Calculating || self.pending_request_id != Some(request_id) {
            return Err(RaffleError::UnknownRequest { request_id });
        }

        let winner = winner_index(random_value, self.players.len())
            .and_then(|index| self.players.get(index))
            .copied()
            .ok_or(RaffleError::PayoutFailed)?;
        let amount = self.pool_balance;

        payout.transfer(&winner, amount)?;

        self.players.clear();
        self.pool_balance = 0;
        self.pending_request_id = None;
        self.state = RaffleState::Open;
        self.last_timestamp = now;
        self.recent_winner = Some(winner);
        self.rounds_completed = self.rounds_completed.saturating_add(1);

        Ok(WinnerSelected { winner, amount })
    }
}
