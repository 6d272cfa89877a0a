use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack},
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::raffle_events::RaffleEvent;
use crate::raffle_instruction::RaffleInstruction;
use crate::raffle_state::{Config, Raffle, INITIAL_PLAYER_CAPACITY};
use crate::utils::{
    check_program_account, create_pda_account, ensure_player_capacity, find_config_address,
    find_raffle_address, LamportPayout, CONFIG_SEED, RAFFLE_SEED,
};
use crate::vrf::{verify_oracle, OracleRequest};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
            } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(
                    accounts,
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    program_id,
                )
            }
            RaffleInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomness {
                request_id,
                random_value,
            } => {
                msg!("Instruction: Fulfill Randomness");
                Self::process_fulfill_randomness(accounts, request_id, random_value, program_id)
            }
        }
    }

    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        interval: u64,
        key_hash: [u8; 32],
        subscription_id: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Config::new(
            *oracle_info.key,
            entrance_fee,
            interval,
            key_hash,
            subscription_id,
        )?;

        let (expected_config, config_bump) = find_config_address(program_id);
        let (expected_raffle, raffle_bump) = find_raffle_address(program_id);
        if *config_info.key != expected_config || *raffle_info.key != expected_raffle {
            msg!("Invalid config or raffle account address");
            return Err(ProgramError::InvalidArgument);
        }
        if config_info.owner == program_id || raffle_info.owner == program_id {
            msg!("Raffle is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let rent = Rent::get()?;
        create_pda_account(
            payer_info,
            config_info,
            system_program_info,
            &rent,
            Config::LEN,
            program_id,
            &[CONFIG_SEED, &[config_bump]],
        )?;
        create_pda_account(
            payer_info,
            raffle_info,
            system_program_info,
            &rent,
            Raffle::space_for(INITIAL_PLAYER_CAPACITY),
            program_id,
            &[RAFFLE_SEED, &[raffle_bump]],
        )?;

        let now = Clock::get()?.unix_timestamp;
        Config::pack(config, &mut config_info.data.borrow_mut())?;
        Raffle::new(raffle_bump, now).pack_into_account(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: EntranceFee={}, Interval={}s, Oracle={}, Opened={}",
            entrance_fee,
            interval,
            oracle_info.key,
            now
        );
        Ok(())
    }

    fn process_enter(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let entrant_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !entrant_info.is_signer {
            msg!("Entrant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Self::load_config(config_info, program_id)?;
        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        let accepted = raffle.enter(&config, *entrant_info.key, amount)?;

        ensure_player_capacity(
            raffle_info,
            entrant_info,
            system_program_info,
            &Rent::get()?,
            raffle.players.len(),
        )?;
        invoke(
            &system_instruction::transfer(entrant_info.key, raffle_info.key, amount),
            &[
                entrant_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        raffle.pack_into_account(&mut raffle_info.data.borrow_mut())?;
        RaffleEvent::from(accepted).emit()
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        let config = Self::load_config(config_info, program_id)?;
        let raffle = Self::load_raffle(raffle_info, program_id)?;

        let status = raffle.upkeep_status(&config, Clock::get()?.unix_timestamp);
        msg!(
            "Upkeep needed={}: open={}, interval_elapsed={}, players={}, balance={}",
            status.upkeep_needed,
            status.is_open,
            status.interval_elapsed,
            status.players,
            status.balance
        );

        let data = status
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        set_return_data(&data);
        Ok(())
    }

    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = Self::load_config(config_info, program_id)?;
        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        let clock = Clock::get()?;
        let mut oracle = OracleRequest {
            raffle: raffle_info.key,
            config: &config,
            round: raffle.rounds_completed,
            slot: clock.slot,
        };
        let locked = raffle.perform_upkeep(&config, clock.unix_timestamp, &mut oracle)?;

        raffle.pack_into_account(&mut raffle_info.data.borrow_mut())?;
        RaffleEvent::from(locked).emit()
    }

    fn process_fulfill_randomness(
        accounts: &[AccountInfo],
        request_id: u64,
        random_value: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let config = Self::load_config(config_info, program_id)?;
        verify_oracle(oracle_info, &config)?;
        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        let mut payout = LamportPayout {
            raffle_info,
            winner_info,
            rent_reserve: Rent::get()?.minimum_balance(raffle_info.data_len()),
        };
        let selected = raffle.fulfill_randomness(
            request_id,
            random_value,
            Clock::get()?.unix_timestamp,
            &mut payout,
        )?;

        raffle.pack_into_account(&mut raffle_info.data.borrow_mut())?;
        RaffleEvent::from(selected).emit()
    }

    fn load_config(config_info: &AccountInfo, program_id: &Pubkey) -> Result<Config, ProgramError> {
        check_program_account(config_info, &find_config_address(program_id).0, program_id)?;
        Config::unpack(&config_info.data.borrow())
    }

    fn load_raffle(raffle_info: &AccountInfo, program_id: &Pubkey) -> Result<Raffle, ProgramError> {
        check_program_account(raffle_info, &find_raffle_address(program_id).0, program_id)?;
        let raffle = Raffle::unpack_from_account(&raffle_info.data.borrow())?;
        if !raffle.is_initialized() {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(raffle)
    }
}
