// Raffle program - account helpers
use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
};

use crate::raffle_error::RaffleError;
use crate::raffle_round::PrizeTransfer;
use crate::raffle_state::Raffle;

pub const CONFIG_SEED: &[u8] = b"config";
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Find the program derived address of the config account
pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

/// Find the program derived address of the raffle account
pub fn find_raffle_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED], program_id)
}

/// Checks that `info` is the expected PDA and, once created, is owned by us
pub fn check_program_account(
    info: &AccountInfo,
    expected: &Pubkey,
    program_id: &Pubkey,
) -> ProgramResult {
    if info.key != expected {
        msg!("Unexpected account address {}, expected {}", info.key, expected);
        return Err(ProgramError::InvalidArgument);
    }
    if info.owner != program_id {
        msg!("Account {} must be owned by this program", info.key);
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

/// Creates a rent-exempt PDA of `space` bytes owned by `owner`.
///
/// `create_account` refuses an address that already holds lamports, and
/// anyone can send lamports to a PDA before it exists. Such an account is
/// topped up to the rent-exempt minimum, then allocated and assigned.
pub fn create_pda_account<'a>(
    payer_info: &AccountInfo<'a>,
    new_account_info: &AccountInfo<'a>,
    system_program_info: &AccountInfo<'a>,
    rent: &Rent,
    space: usize,
    owner: &Pubkey,
    signer_seeds: &[&[u8]],
) -> ProgramResult {
    let required_lamports = rent.minimum_balance(space);

    if new_account_info.lamports() == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                new_account_info.key,
                required_lamports,
                space as u64,
                owner,
            ),
            &[
                payer_info.clone(),
                new_account_info.clone(),
                system_program_info.clone(),
            ],
            &[signer_seeds],
        );
    }

    msg!(
        "Account {} already holds {} lamports",
        new_account_info.key,
        new_account_info.lamports()
    );
    let shortfall = required_lamports.saturating_sub(new_account_info.lamports());
    if shortfall > 0 {
        invoke(
            &system_instruction::transfer(payer_info.key, new_account_info.key, shortfall),
            &[
                payer_info.clone(),
                new_account_info.clone(),
                system_program_info.clone(),
            ],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(new_account_info.key, space as u64),
        &[new_account_info.clone(), system_program_info.clone()],
        &[signer_seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(new_account_info.key, owner),
        &[new_account_info.clone(), system_program_info.clone()],
        &[signer_seeds],
    )
}

/// Grows the raffle account so `players` entries fit, with `payer`
/// covering the extra rent.
pub fn ensure_player_capacity<'a>(
    raffle_info: &AccountInfo<'a>,
    payer_info: &AccountInfo<'a>,
    system_program_info: &AccountInfo<'a>,
    rent: &Rent,
    players: usize,
) -> ProgramResult {
    let current_len = raffle_info.data_len();
    let new_len = match Raffle::grown_len(current_len, players) {
        Some(new_len) => new_len,
        None => return Ok(()),
    };

    let extra_rent = rent
        .minimum_balance(new_len)
        .saturating_sub(rent.minimum_balance(current_len));
    if extra_rent > 0 {
        invoke(
            &system_instruction::transfer(payer_info.key, raffle_info.key, extra_rent),
            &[
                payer_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;
    }

    raffle_info.realloc(new_len, false)?;
    msg!("Raffle account grown from {} to {} bytes", current_len, new_len);
    Ok(())
}

/// Pays the prize straight out of the raffle account's escrowed lamports
pub struct LamportPayout<'a, 'b> {
    pub raffle_info: &'a AccountInfo<'b>,
    pub winner_info: &'a AccountInfo<'b>,
    /// Lamports that must stay behind to keep the raffle rent-exempt
    pub rent_reserve: u64,
}

impl<'a, 'b> PrizeTransfer for LamportPayout<'a, 'b> {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), RaffleError> {
        if self.winner_info.key != winner {
            msg!("Winner is {} but account {} was supplied", winner, self.winner_info.key);
            return Err(RaffleError::PayoutFailed);
        }
        if !self.winner_info.is_writable {
            msg!("Winner account {} is not writable", winner);
            return Err(RaffleError::PayoutFailed);
        }

        let remaining = self
            .raffle_info
            .lamports()
            .checked_sub(amount)
            .filter(|remaining| *remaining >= self.rent_reserve)
            .ok_or_else(|| {
                msg!("Raffle escrow cannot cover a prize of {} lamports", amount);
                RaffleError::PayoutFailed
            })?;
        let credited = self
            .winner_info
            .lamports()
            .checked_add(amount)
            .ok_or(RaffleError::PayoutFailed)?;

        let mut raffle_lamports = self
            .raffle_info
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::PayoutFailed)?;
        let mut winner_lamports = self
            .winner_info
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::PayoutFailed)?;
        **raffle_lamports = remaining;
        **winner_lamports = credited;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdas_are_distinct() {
        let program_id = Pubkey::new_unique();
        assert_ne!(find_config_address(&program_id).0, find_raffle_address(&program_id).0);
    }

    #[test]
    fn payout_moves_prize_and_keeps_reserve() {
        let program_id = Pubkey::new_unique();
        let raffle_key = Pubkey::new_unique();
        let winner_key = Pubkey::new_unique();
        let system = Pubkey::default();
        let mut raffle_lamports = 1_000 + 300;
        let mut winner_lamports = 50;
        let mut raffle_data: Vec<u8> = vec![];
        let mut winner_data: Vec<u8> = vec![];
        let raffle_info = AccountInfo::new(
            &raffle_key, false, true, &mut raffle_lamports, &mut raffle_data, &program_id, false, 0,
        );
        let winner_info = AccountInfo::new(
            &winner_key, false, true, &mut winner_lamports, &mut winner_data, &system, false, 0,
        );
        let mut payout = LamportPayout {
            raffle_info: &raffle_info,
            winner_info: &winner_info,
            rent_reserve: 1_000,
        };

        assert_eq!(payout.transfer(&winner_key, 300), Ok(()));
        assert_eq!(raffle_info.lamports(), 1_000);
        assert_eq!(winner_info.lamports(), 350);

        // the reserve is never dipped into
        assert_eq!(payout.transfer(&winner_key, 1), Err(RaffleError::PayoutFailed));
        assert_eq!(raffle_info.lamports(), 1_000);
    }

    #[test]
    fn payout_refuses_a_substituted_winner() {
        let program_id = Pubkey::new_unique();
        let raffle_key = Pubkey::new_unique();
        let impostor = Pubkey::new_unique();
        let system = Pubkey::default();
        let mut raffle_lamports = 500;
        let mut impostor_lamports = 0;
        let mut raffle_data: Vec<u8> = vec![];
        let mut impostor_data: Vec<u8> = vec![];
        let raffle_info = AccountInfo::new(
            &raffle_key, false, true, &mut raffle_lamports, &mut raffle_data, &program_id, false, 0,
        );
        let impostor_info = AccountInfo::new(
            &impostor, false, true, &mut impostor_lamports, &mut impostor_data, &system, false, 0,
        );
        let mut payout = LamportPayout {
            raffle_info: &raffle_info,
            winner_info: &impostor_info,
            rent_reserve: 0,
        };

        assert_eq!(
            payout.transfer(&Pubkey::new_unique(), 100),
            Err(RaffleError::PayoutFailed)
        );
        assert_eq!(raffle_info.lamports(), 500);
        assert_eq!(impostor_info.lamports(), 0);
    }
}
