//! Test fixtures for settlement engine integration tests
//!
//! Provides mock addresses, a funded in-memory custody, a manual clock
//! pinned inside the sale window, and an engine wired from the standard
//! sale parameters.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use cosmwasm_std::Uint128;
use ido_engine::{
    Address, IdoEngine, InMemoryCustody, ManualClock, RateSeed, SaleParams, SaleStage,
};

// Mock addresses
pub const OWNER_ADDR: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const TREASURY_ADDR: &str = "0xcccccccccccccccccccccccccccccccccccccccc";
pub const SALE_TOKEN_ADDR: &str = "0xdddddddddddddddddddddddddddddddddddddddd";
pub const BTC_TOKEN_ADDR: &str = "0x1111111111111111111111111111111111111111";
pub const ETH_TOKEN_ADDR: &str = "0x2222222222222222222222222222222222222222";

pub fn addr(s: &str) -> Address {
    s.parse().expect("valid fixture address")
}

pub fn owner() -> Address {
    addr(OWNER_ADDR)
}

pub fn sale_token() -> Address {
    addr(SALE_TOKEN_ADDR)
}

pub fn btc() -> Address {
    addr(BTC_TOKEN_ADDR)
}

pub fn eth() -> Address {
    addr(ETH_TOKEN_ADDR)
}

/// Distinct participant addresses for multi-buyer scenarios.
pub fn participant(i: u8) -> Address {
    let mut bytes = [0x40u8; 20];
    bytes[19] = i;
    Address::from_slice(&bytes)
}

/// Sale-token amounts in smallest units (18 decimals).
pub fn sale_units(whole: u128) -> Uint128 {
    Uint128::new(whole * 1_000_000_000_000_000_000)
}

/// BTC payment amounts in satoshi (8 decimals).
pub fn sats(amount: u128) -> Uint128 {
    Uint128::new(amount)
}

/// ETH payment amounts in wei (18 decimals).
pub fn wei(amount: u128) -> Uint128 {
    Uint128::new(amount)
}

pub fn window_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap()
}

pub fn window_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 31, 0, 0, 0).unwrap()
}

pub fn mid_window() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 15, 12, 0, 0).unwrap()
}

pub fn btc_rate() -> RateSeed {
    RateSeed {
        token: btc(),
        output: Uint128::new(170_000),
        input: Uint128::new(1),
        payment_decimals: 8,
    }
}

pub fn eth_rate() -> RateSeed {
    RateSeed {
        token: eth(),
        output: Uint128::new(2_000),
        input: Uint128::new(1),
        payment_decimals: 18,
    }
}

pub struct TestBed {
    pub engine: IdoEngine,
    pub custody: Arc<InMemoryCustody>,
    pub clock: Arc<ManualClock>,
}

impl TestBed {
    /// Seed a payment balance for a buyer.
    pub async fn fund(&self, token: Address, holder: Address, amount: Uint128) {
        self.custody.mint(token, holder, amount).await;
    }

    pub async fn sale_balance(&self, holder: &Address) -> Uint128 {
        self.custody.balance_of(&sale_token(), holder).await
    }
}

/// Build an engine with the standard parameters and a 50M sale-token pool,
/// stage still `Paused`.
pub async fn paused_sale(public: bool) -> TestBed {
    let clock = Arc::new(ManualClock::new(mid_window()));
    let custody = Arc::new(InMemoryCustody::new(addr(TREASURY_ADDR)));
    custody
        .mint(sale_token(), addr(TREASURY_ADDR), sale_units(50_000_000))
        .await;

    let mut params = SaleParams::standard(sale_token(), window_start(), window_end());
    params.public_sale = public;

    let engine = IdoEngine::builder()
        .with_params(params)
        .with_owner(owner())
        .with_custody(custody.clone())
        .with_clock(clock.clone())
        .with_rate(btc_rate())
        .with_rate(eth_rate())
        .build()
        .expect("engine builds from fixtures");

    TestBed {
        engine,
        custody,
        clock,
    }
}

/// Build and activate a sale.
pub async fn active_sale(public: bool) -> TestBed {
    let bed = paused_sale(public).await;
    bed.engine
        .set_stage(&owner(), SaleStage::Active)
        .await
        .expect("owner activates the sale");
    bed
}
