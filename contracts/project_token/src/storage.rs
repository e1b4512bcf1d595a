//! # Storage
//!
//! Typed helpers over the contract's two storage tiers:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key           | Type      | Description                       |
//! |---------------|-----------|-----------------------------------|
//! | `Admin`       | `Address` | Project issuer; the only minter   |
//! | `Name`        | `String`  | Token display name                |
//! | `Symbol`      | `String`  | Token symbol / asset code         |
//! | `TotalSupply` | `i128`    | Total issued supply               |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key             | Type   | Description        |
//! |-----------------|--------|--------------------|
//! | `Balance(addr)` | `i128` | Per-holder balance |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.

use soroban_sdk::{contracttype, Address, Env, String};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// All contract storage keys.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Project issuer; the only address allowed to mint (Instance).
    Admin,
    /// Token display name (Instance).
    Name,
    /// Token symbol / asset code (Instance).
    Symbol,
    /// Total issued supply (Instance).
    TotalSupply,
    /// Per-holder balance (Persistent).
    Balance(Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn has_admin(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    bump_instance(env);
}

/// Retrieve the project issuer.
/// Panics if the token has not been initialised.
pub fn get_admin(env: &Env) -> Address {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .expect("token not initialised")
}

pub fn set_metadata(env: &Env, name: &String, symbol: &String) {
    env.storage().instance().set(&DataKey::Name, name);
    env.storage().instance().set(&DataKey::Symbol, symbol);
    bump_instance(env);
}

pub fn get_name(env: &Env) -> String {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Name)
        .expect("token not initialised")
}

pub fn get_symbol(env: &Env) -> String {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Symbol)
        .expect("token not initialised")
}

pub fn set_total_supply(env: &Env, supply: i128) {
    env.storage().instance().set(&DataKey::TotalSupply, &supply);
    bump_instance(env);
}

pub fn get_total_supply(env: &Env) -> i128 {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::TotalSupply)
        .unwrap_or(0)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Balance of `address`, zero when no entry exists.
pub fn get_balance(env: &Env, address: &Address) -> i128 {
    let key = DataKey::Balance(address.clone());
    let balance: Option<i128> = env.storage().persistent().get(&key);
    match balance {
        Some(balance) => {
            bump_persistent(env, &key);
            balance
        }
        None => 0,
    }
}

pub fn set_balance(env: &Env, address: &Address, amount: i128) {
    let key = DataKey::Balance(address.clone());
    env.storage().persistent().set(&key, &amount);
    bump_persistent(env, &key);
}
