use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::raffle_error::RaffleError;

/// Player slots reserved when the raffle account is first created
pub const INITIAL_PLAYER_CAPACITY: usize = 16;

/// Player slots added each time the raffle account has to grow
pub const PLAYER_GROWTH_CHUNK: usize = 16;

/// Status of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Round is accepting entries
    Open,
    /// Entry is locked while the round waits on the oracle
    Calculating,
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// Raffle configuration, written once at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Is the account initialized
    pub is_initialized: bool,
    /// The only key allowed to deliver randomness
    pub oracle: Pubkey,
    /// Minimum lamports accepted per entry
    pub entrance_fee: u64,
    /// Minimum seconds between finalizations
    pub interval: u64,
    /// Oracle gas lane the randomness requests are routed to
    pub key_hash: [u8; 32],
    /// Oracle subscription billed for randomness requests
    pub subscription_id: u64,
}

impl Config {
    pub fn new(
        oracle: Pubkey,
        entrance_fee: u64,
        interval: u64,
        key_hash: [u8; 32],
        subscription_id: u64,
    ) -> Result<Self, RaffleError> {
        if entrance_fee == 0 || interval > i64::MAX as u64 {
            return Err(RaffleError::InvalidConfig);
        }

        Ok(Self {
            is_initialized: true,
            oracle,
            entrance_fee,
            interval,
            key_hash,
            subscription_id,
        })
    }
}

impl Sealed for Config {}

impl IsInitialized for Config {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Config {
    const LEN: usize = 1 + 32 + 8 + 8 + 32 + 8;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Config::LEN];
        let (is_initialized, oracle, entrance_fee, interval, key_hash, subscription_id) =
            array_refs![src, 1, 32, 8, 8, 32, 8];

        Ok(Config {
            is_initialized: is_initialized[0] != 0,
            oracle: Pubkey::new_from_array(*oracle),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: u64::from_le_bytes(*interval),
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Config::LEN];
        let (
            is_initialized_dst,
            oracle_dst,
            entrance_fee_dst,
            interval_dst,
            key_hash_dst,
            subscription_id_dst,
        ) = mut_array_refs![dst, 1, 32, 8, 8, 32, 8];

        is_initialized_dst[0] = self.is_initialized as u8;
        oracle_dst.copy_from_slice(self.oracle.as_ref());
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        key_hash_dst.copy_from_slice(&self.key_hash);
        *subscription_id_dst = self.subscription_id.to_le_bytes();
    }
}

/// Round state shared by entry, upkeep and fulfillment.
///
/// The account holding it also escrows the pooled lamports, so its balance
/// is always the rent-exempt reserve plus `pool_balance`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Bump seed of the raffle PDA
    pub bump: u8,
    /// Open for entries or waiting on randomness
    pub state: RaffleState,
    /// Time of the last finalization, or of creation
    pub last_timestamp: UnixTimestamp,
    /// Lamports paid in by the current round's entrants
    pub pool_balance: u64,
    /// Outstanding randomness request, set only while calculating
    pub pending_request_id: Option<u64>,
    /// Winner of the most recently finalized round
    pub recent_winner: Option<Pubkey>,
    /// Number of rounds paid out so far
    pub rounds_completed: u64,
    /// Entrants of the current round in entry order, one slot per entry
    pub players: Vec<Pubkey>,
}

impl Raffle {
    /// Serialized size with no players and every optional field set
    pub const BASE_LEN: usize = 1 + 1 + 1 + 8 + 8 + (1 + 8) + (1 + 32) + 8 + 4;

    pub fn new(bump: u8, now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            bump,
            state: RaffleState::Open,
            last_timestamp: now,
            pool_balance: 0,
            pending_request_id: None,
            recent_winner: None,
            rounds_completed: 0,
            players: Vec::new(),
        }
    }

    /// Account size able to hold `players` entries
    pub fn space_for(players: usize) -> usize {
        Self::BASE_LEN + players * 32
    }

    /// Size the account must grow to before `players` entries fit, or
    /// `None` if `current_len` is already large enough. Growth happens in
    /// whole chunks so the cost of resizing is amortized across entries.
    pub fn grown_len(current_len: usize, players: usize) -> Option<usize> {
        if Self::space_for(players) <= current_len {
            return None;
        }
        let chunks = (players + PLAYER_GROWTH_CHUNK - 1) / PLAYER_GROWTH_CHUNK;
        Some(Self::space_for(chunks * PLAYER_GROWTH_CHUNK))
    }

    /// Reads the raffle out of account data. Bytes past the encoded
    /// state are spare capacity and are ignored.
    pub fn unpack_from_account(src: &[u8]) -> Result<Self, ProgramError> {
        Raffle::deserialize(&mut &src[..]).map_err(|_| ProgramError::InvalidAccountData)
    }

    pub fn pack_into_account(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        if dst.len() < Self::space_for(self.players.len()) {
            return Err(ProgramError::AccountDataTooSmall);
        }
        self.serialize(&mut &mut dst[..])
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    pub fn is_open(&self) -> bool {
        self.state == RaffleState::Open
    }

    pub fn number_of_players(&self) -> u64 {
        self.players.len() as u64
    }

    /// Entrant at `index` in entry order
    pub fn player(&self, index: u64) -> Result<Pubkey, RaffleError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.players.get(i))
            .copied()
            .ok_or(RaffleError::PlayerIndexOutOfRange)
    }
}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_pack_round_trip() {
        let config = Config::new(Pubkey::new_unique(), 10_000_000, 30, [7u8; 32], 42).unwrap();
        let mut buf = vec![0u8; Config::LEN];
        Config::pack(config, &mut buf).unwrap();
        assert_eq!(Config::unpack(&buf).unwrap(), config);
    }

    #[test]
    fn config_rejects_zero_fee() {
        assert_eq!(
            Config::new(Pubkey::new_unique(), 0, 30, [0u8; 32], 1),
            Err(RaffleError::InvalidConfig)
        );
    }

    #[test]
    fn config_rejects_interval_past_timestamp_range() {
        assert_eq!(
            Config::new(Pubkey::new_unique(), 1, u64::MAX, [0u8; 32], 1),
            Err(RaffleError::InvalidConfig)
        );
    }

    #[test]
    fn new_raffle_starts_open_and_empty() {
        let raffle = Raffle::new(254, 1_000);
        assert!(raffle.is_initialized);
        assert!(raffle.is_open());
        assert_eq!(raffle.number_of_players(), 0);
        assert_eq!(raffle.pool_balance, 0);
        assert_eq!(raffle.last_timestamp, 1_000);
        assert_eq!(raffle.pending_request_id, None);
        assert_eq!(raffle.recent_winner, None);
    }

    #[test]
    fn base_len_bounds_fully_populated_encoding() {
        let mut raffle = Raffle::new(1, 0);
        raffle.state = RaffleState::Calculating;
        raffle.pending_request_id = Some(u64::MAX);
        raffle.recent_winner = Some(Pubkey::new_unique());
        raffle.players = vec![Pubkey::new_unique(); 3];
        assert_eq!(raffle.try_to_vec().unwrap().len(), Raffle::space_for(3));
    }

    #[test]
    fn account_encoding_ignores_spare_capacity() {
        let mut raffle = Raffle::new(3, 55);
        raffle.players = vec![Pubkey::new_unique(), Pubkey::new_unique()];
        raffle.pool_balance = 20;
        let mut data = vec![0u8; Raffle::space_for(INITIAL_PLAYER_CAPACITY)];
        raffle.pack_into_account(&mut data).unwrap();
        assert_eq!(Raffle::unpack_from_account(&data).unwrap(), raffle);

        // shrinking the list leaves stale bytes behind the new encoding
        raffle.players.clear();
        raffle.pack_into_account(&mut data).unwrap();
        assert_eq!(Raffle::unpack_from_account(&data).unwrap(), raffle);
    }

    #[test]
    fn zeroed_account_reads_as_uninitialized() {
        let data = vec![0u8; Raffle::space_for(INITIAL_PLAYER_CAPACITY)];
        let raffle = Raffle::unpack_from_account(&data).unwrap();
        assert!(!raffle.is_initialized());
    }

    #[test]
    fn pack_rejects_undersized_account() {
        let mut raffle = Raffle::new(0, 0);
        raffle.players = vec![Pubkey::new_unique(); 2];
        let mut data = vec![0u8; Raffle::space_for(1)];
        assert_eq!(
            raffle.pack_into_account(&mut data),
            Err(ProgramError::AccountDataTooSmall)
        );
    }

    #[test]
    fn growth_happens_in_whole_chunks() {
        let current = Raffle::space_for(INITIAL_PLAYER_CAPACITY);
        assert_eq!(Raffle::grown_len(current, INITIAL_PLAYER_CAPACITY), None);
        assert_eq!(
            Raffle::grown_len(current, INITIAL_PLAYER_CAPACITY + 1),
            Some(Raffle::space_for(INITIAL_PLAYER_CAPACITY + PLAYER_GROWTH_CHUNK))
        );
    }

    #[test]
    fn player_lookup_is_bounds_checked() {
        let first = Pubkey::new_unique();
        let mut raffle = Raffle::new(0, 0);
        raffle.players.push(first);
        assert_eq!(raffle.player(0), Ok(first));
        assert_eq!(raffle.player(1), Err(RaffleError::PlayerIndexOutOfRange));
    }

    #[test]
    fn state_byte_mapping() {
        assert_eq!(u8::from(RaffleState::Open), 0);
        assert_eq!(u8::from(RaffleState::Calculating), 1);
    }
}
