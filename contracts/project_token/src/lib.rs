//! # Project Token Contract
//!
//! Minimal fungible token representing a registered conservation project's
//! tradable asset.  One instance is deployed per project by the registry
//! backend (`stellar contract deploy`); the full supply is minted to the
//! project issuer at initialisation.
//!
//! | Phase      | Entry Point(s)                               |
//! |------------|----------------------------------------------|
//! | Bootstrap  | [`ProjectToken::init`]                       |
//! | Issuance   | [`ProjectToken::mint`]                       |
//! | Trading    | [`ProjectToken::transfer`]                   |
//! | Queries    | `balance`, `name`, `symbol`, `total_supply`  |

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, panic_with_error, symbol_short, Address, Env, String,
};

mod storage;


#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized  = 1,
    InvalidSupply       = 2,
    InvalidAmount       = 3,
    InsufficientBalance = 4,
}

#[contract]
pub struct ProjectToken;

#[contractimpl]
impl ProjectToken {
    /// Initialise the token and mint the full supply to `issuer`.
    ///
    /// Must be called exactly once immediately after deployment.
    /// Subsequent calls panic with `Error::AlreadyInitialized`.
    pub fn init(env: Env, issuer: Address, name: String, symbol: String, supply: i128) {
        issuer.require_auth();

        if storage::has_admin(&env) {
            panic_with_error!(&env, Error::AlreadyInitialized);
        }
        if supply <= 0 {
            panic_with_error!(&env, Error::InvalidSupply);
        }

        storage::set_admin(&env, &issuer);
        storage::set_metadata(&env, &name, &symbol);
        storage::set_total_supply(&env, supply);
        storage::set_balance(&env, &issuer, supply);

        env.events()
            .publish((symbol_short!("init"), issuer), supply);
    }

    /// Mint `amount` new tokens to `to`.
    ///
    /// Only the project issuer (the admin set at initialisation) may mint.
    pub fn mint(env: Env, to: Address, amount: i128) {
        let admin = storage::get_admin(&env);
        admin.require_auth();

        if amount <= 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let balance = storage::get_balance(&env, &to);
        storage::set_balance(&env, &to, balance + amount);
        storage::set_total_supply(&env, storage::get_total_supply(&env) + amount);

        env.events().publish((symbol_short!("mint"), to), amount);
    }

    /// Transfer `amount` tokens from `from` to `to`.
    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();

        if amount <= 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let from_balance = storage::get_balance(&env, &from);
        if from_balance < amount {
            panic_with_error!(&env, Error::InsufficientBalance);
        }

        storage::set_balance(&env, &from, from_balance - amount);
        let to_balance = storage::get_balance(&env, &to);
        storage::set_balance(&env, &to, to_balance + amount);

        env.events()
            .publish((symbol_short!("transfer"), from, to), amount);
    }

    /// Current balance of `address` (zero for unknown holders).
    pub fn balance(env: Env, address: Address) -> i128 {
        storage::get_balance(&env, &address)
    }

    /// Token display name.
    pub fn name(env: Env) -> String {
        storage::get_name(&env)
    }

    /// Token symbol / asset code.
    pub fn symbol(env: Env) -> String {
        storage::get_symbol(&env)
    }

    /// Total issued supply.
    pub fn total_supply(env: Env) -> i128 {
        storage::get_total_supply(&env)
    }
}
