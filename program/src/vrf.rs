// Randomness oracle integration for the raffle program
use arrayref::array_ref;
use solana_program::{
    account_info::AccountInfo,
    clock::Slot,
    hash::{hashv, Hash},
    msg,
    pubkey::Pubkey,
};

use crate::raffle_error::RaffleError;
use crate::raffle_round::RandomnessOracle;
use crate::raffle_state::Config;

/// Requests randomness by publishing a request the off-chain oracle
/// watches for. The id is bound to the raffle, the round and the slot so a
/// delivery meant for another round never matches.
pub struct OracleRequest<'a> {
    pub raffle: &'a Pubkey,
    pub config: &'a Config,
    pub round: u64,
    pub slot: Slot,
}

impl<'a> RandomnessOracle for OracleRequest<'a> {
    fn request_random_value(&mut self) -> Result<u64, RaffleError> {
        let request_id = derive_request_id(self.raffle, self.round, self.slot);
        msg!(
            "RandomnessRequested: request_id={}, key_hash={}, subscription_id={}, num_words=1",
            request_id,
            Hash::new_from_array(self.config.key_hash),
            self.config.subscription_id
        );
        Ok(request_id)
    }
}

// Request ids are never zero, so an unset id can't be delivered against
pub fn derive_request_id(raffle: &Pubkey, round: u64, slot: Slot) -> u64 {
    let hash = hashv(&[
        b"randomness-request",
        raffle.as_ref(),
        &round.to_le_bytes(),
        &slot.to_le_bytes(),
    ]);
    let bytes = hash.to_bytes();
    u64::from_le_bytes(*array_ref![bytes, 0, 8]).max(1)
}

// Only the configured oracle may deliver randomness, and it must sign
pub fn verify_oracle(oracle_info: &AccountInfo, config: &Config) -> Result<(), RaffleError> {
    if !oracle_info.is_signer || *oracle_info.key != config.oracle {
        msg!("Randomness delivered by {} but oracle is {}", oracle_info.key, config.oracle);
        return Err(RaffleError::UnauthorizedOracle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_differ_per_round_and_slot() {
        let raffle = Pubkey::new_unique();
        let first = derive_request_id(&raffle, 0, 100);
        assert_ne!(first, 0);
        assert_eq!(first, derive_request_id(&raffle, 0, 100));
        assert_ne!(first, derive_request_id(&raffle, 1, 100));
        assert_ne!(first, derive_request_id(&raffle, 0, 101));
        assert_ne!(first, derive_request_id(&Pubkey::new_unique(), 0, 100));
    }

    #[test]
    fn oracle_request_reports_derived_id() {
        let raffle = Pubkey::new_unique();
        let config = Config::new(Pubkey::new_unique(), 1, 30, [9u8; 32], 3).unwrap();
        let mut request = OracleRequest {
            raffle: &raffle,
            config: &config,
            round: 4,
            slot: 77,
        };
        assert_eq!(
            request.request_random_value(),
            Ok(derive_request_id(&raffle, 4, 77))
        );
    }

    #[test]
    fn only_the_signing_oracle_is_accepted() {
        let oracle = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let config = Config::new(oracle, 1, 30, [0u8; 32], 0).unwrap();
        let mut lamports = 0;
        let mut data: Vec<u8> = vec![];

        let signed = AccountInfo::new(&oracle, true, false, &mut lamports, &mut data, &owner, false, 0);
        assert_eq!(verify_oracle(&signed, &config), Ok(()));

        let mut lamports = 0;
        let mut data: Vec<u8> = vec![];
        let unsigned = AccountInfo::new(&oracle, false, false, &mut lamports, &mut data, &owner, false, 0);
        assert_eq!(verify_oracle(&unsigned, &config), Err(RaffleError::UnauthorizedOracle));

        let stranger = Pubkey::new_unique();
        let mut lamports = 0;
        let mut data: Vec<u8> = vec![];
        let forged = AccountInfo::new(&stranger, true, false, &mut lamports, &mut data, &owner, false, 0);
        assert_eq!(verify_oracle(&forged, &config), Err(RaffleError::UnauthorizedOracle));
    }
}
