//! Engine construction tests: builder validation and config-driven wiring.

use std::sync::Arc;

use crate::fixtures::*;
use cosmwasm_std::Uint128;
use ido_engine::{
    EngineConfig, Error, IdoEngine, IdoEngineBuilder, InMemoryCustody, SaleParams, SaleStage,
};

fn config() -> EngineConfig {
    EngineConfig {
        owner: owner(),
        sale: SaleParams::standard(sale_token(), window_start(), window_end()),
        rates: vec![btc_rate(), eth_rate()],
    }
}

#[tokio::test]
async fn builder_wires_an_engine_from_config() {
    let custody = Arc::new(InMemoryCustody::new(addr(TREASURY_ADDR)));
    let engine = IdoEngineBuilder::from_config(config())
        .with_custody(custody)
        .build()
        .unwrap();

    // seeded rates are queryable, the sale starts paused and non-public
    let rate = engine.exchange_rate(&btc()).await.unwrap();
    assert_eq!(rate.output, Uint128::new(170_000));
    assert_eq!(engine.stage().await, SaleStage::Paused);
    assert!(!engine.sale_params().await.public_sale);
    assert_eq!(engine.owner(), owner());
}

#[tokio::test]
async fn builder_requires_custody_and_params() {
    let err = IdoEngineBuilder::from_config(config()).build().unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let custody = Arc::new(InMemoryCustody::new(addr(TREASURY_ADDR)));
    let err = IdoEngine::builder()
        .with_custody(custody)
        .with_owner(owner())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn builder_rejects_an_empty_sale_window() {
    let custody = Arc::new(InMemoryCustody::new(addr(TREASURY_ADDR)));
    let mut config = config();
    config.sale.end_time = config.sale.start_time;

    let err = IdoEngineBuilder::from_config(config)
        .with_custody(custody)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn config_file_round_trip_drives_the_builder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    config().save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config());

    let custody = Arc::new(InMemoryCustody::new(addr(TREASURY_ADDR)));
    let engine = IdoEngineBuilder::from_config(loaded)
        .with_custody(custody)
        .build()
        .unwrap();
    assert!(engine.exchange_rate(&eth()).await.is_ok());
}
