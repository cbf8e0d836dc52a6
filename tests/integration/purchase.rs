//! Purchase pipeline tests: gating, conversion, minimum, buyer cap and
//! rollback behavior.

use crate::fixtures::*;
use cosmwasm_std::Uint128;
use ido_engine::Error;

#[tokio::test]
async fn buy_with_btc_credits_converted_amount() {
    let bed = active_sale(true).await;
    let buyer = participant(1);
    bed.fund(btc(), buyer, sats(10_000_000)).await; // 0.1 BTC

    let receipt = bed
        .engine
        .buy(btc(), sats(10_000_000), None, buyer)
        .await
        .unwrap();

    assert_eq!(receipt.buyer, buyer);
    assert_eq!(receipt.sale_amount, sale_units(17_000));
    assert_eq!(receipt.referral_bonus, Uint128::zero());
    assert_eq!(receipt.timestamp, mid_window());

    assert_eq!(bed.sale_balance(&buyer).await, sale_units(17_000));
    assert_eq!(
        bed.custody.balance_of(&btc(), &buyer).await,
        Uint128::zero()
    );
    assert_eq!(
        bed.custody
            .balance_of(&btc(), &bed.custody.treasury())
            .await,
        sats(10_000_000)
    );

    let account = bed.engine.participant(&buyer).await.unwrap();
    assert_eq!(account.total_credited, sale_units(17_000));
    assert!(account.has_purchased);
}

#[tokio::test]
async fn buy_with_eth_credits_converted_amount() {
    let bed = active_sale(true).await;
    let buyer = participant(2);
    bed.fund(eth(), buyer, wei(1_000_000_000_000_000_000)).await; // 1 ETH

    let receipt = bed
        .engine
        .buy(eth(), wei(1_000_000_000_000_000_000), None, buyer)
        .await
        .unwrap();

    assert_eq!(receipt.sale_amount, sale_units(2_000));
    assert_eq!(bed.sale_balance(&buyer).await, sale_units(2_000));
}

#[tokio::test]
async fn paused_sale_rejects_purchases() {
    let bed = paused_sale(true).await;
    let buyer = participant(1);
    bed.fund(btc(), buyer, sats(10_000_000)).await;

    let err = bed
        .engine
        .buy(btc(), sats(10_000_000), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SalePaused));
    assert!(bed.engine.participant(&buyer).await.is_none());
}

#[tokio::test]
async fn purchases_outside_the_window_are_rejected() {
    let bed = active_sale(true).await;
    let buyer = participant(1);
    bed.fund(btc(), buyer, sats(10_000_000)).await;

    bed.clock.set(window_start() - chrono::Duration::hours(1));
    let err = bed
        .engine
        .buy(btc(), sats(10_000_000), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SaleNotStarted));

    bed.clock.set(window_end() + chrono::Duration::hours(1));
    let err = bed
        .engine
        .buy(btc(), sats(10_000_000), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SaleEnded));

    // nothing settled either way
    assert!(bed.engine.participant(&buyer).await.is_none());
    assert_eq!(
        bed.custody.balance_of(&btc(), &buyer).await,
        sats(10_000_000)
    );
}

#[tokio::test]
async fn window_failure_is_reported_before_a_too_low_amount() {
    let bed = active_sale(true).await;
    let buyer = participant(1);
    bed.fund(btc(), buyer, sats(100)).await;

    bed.clock.set(window_end() + chrono::Duration::hours(1));
    let err = bed.engine.buy(btc(), sats(100), None, buyer).await.unwrap_err();
    assert!(matches!(err, Error::SaleEnded));
}

#[tokio::test]
async fn non_public_sale_requires_the_allow_list() {
    let bed = active_sale(false).await;
    let buyer = participant(1);
    bed.fund(btc(), buyer, sats(10_000_000)).await;

    let err = bed
        .engine
        .buy(btc(), sats(10_000_000), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SaleNotPublic));

    bed.engine.add_to_allow_list(&owner(), buyer).await.unwrap();
    assert!(bed.engine.is_allow_listed(&buyer).await);

    let receipt = bed
        .engine
        .buy(btc(), sats(10_000_000), None, buyer)
        .await
        .unwrap();
    assert_eq!(receipt.sale_amount, sale_units(17_000));
}

#[tokio::test]
async fn allow_list_does_not_bypass_the_window() {
    let bed = active_sale(false).await;
    let buyer = participant(1);
    bed.engine.add_to_allow_list(&owner(), buyer).await.unwrap();
    bed.fund(btc(), buyer, sats(10_000_000)).await;

    bed.clock.set(window_end() + chrono::Duration::days(1));
    let err = bed
        .engine
        .buy(btc(), sats(10_000_000), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SaleEnded));
}

#[tokio::test]
async fn unknown_payment_token_is_rejected() {
    let bed = active_sale(true).await;
    let buyer = participant(1);
    let unknown = participant(99);

    let err = bed
        .engine
        .buy(unknown, sats(10_000_000), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownOrDisabledToken(_)));
}

#[tokio::test]
async fn minimum_request_boundary() {
    let bed = active_sale(true).await;
    let buyer = participant(1);
    bed.fund(eth(), buyer, wei(1_000_000_000_000_000_000)).await;

    // 0.4 ETH converts to 800 sale tokens, below the 1000 minimum
    let err = bed
        .engine
        .buy(eth(), wei(400_000_000_000_000_000), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RequestTooLow { .. }));
    assert!(bed.engine.participant(&buyer).await.is_none());

    // 0.5 ETH converts to exactly 1000 sale tokens and succeeds
    let receipt = bed
        .engine
        .buy(eth(), wei(500_000_000_000_000_000), None, buyer)
        .await
        .unwrap();
    assert_eq!(receipt.sale_amount, sale_units(1_000));
}

#[tokio::test]
async fn buyer_cap_rejects_the_entire_request() {
    let bed = active_sale(true).await;
    let buyer = participant(1);
    bed.fund(btc(), buyer, sats(500_000_000)).await; // 5 BTC

    // 1 BTC credits 170 000
    bed.engine
        .buy(btc(), sats(100_000_000), None, buyer)
        .await
        .unwrap();
    assert_eq!(bed.sale_balance(&buyer).await, sale_units(170_000));

    // 2 more BTC would reach 510 000, past the 500 000 cap: rejected whole
    let err = bed
        .engine
        .buy(btc(), sats(200_000_000), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BuyerCapExceeded { .. }));
    assert_eq!(bed.sale_balance(&buyer).await, sale_units(170_000));

    // 1.9 BTC lands exactly within the cap at 493 000
    bed.engine
        .buy(btc(), sats(190_000_000), None, buyer)
        .await
        .unwrap();
    assert_eq!(bed.sale_balance(&buyer).await, sale_units(493_000));
    let account = bed.engine.participant(&buyer).await.unwrap();
    assert_eq!(account.total_credited, sale_units(493_000));
}

#[tokio::test]
async fn failed_pull_leaves_no_trace() {
    let bed = active_sale(true).await;
    let buyer = participant(1);
    // buyer holds nothing

    let err = bed
        .engine
        .buy(btc(), sats(10_000_000), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TransferFailed(_)));
    assert!(bed.engine.participant(&buyer).await.is_none());
    assert_eq!(bed.sale_balance(&buyer).await, Uint128::zero());
}

#[tokio::test]
async fn failed_sale_credit_returns_the_payment() {
    // custody with an empty sale-token pool
    let bed = {
        let bed = active_sale(true).await;
        // drain the treasury pool
        bed.engine
            .withdraw(
                &owner(),
                &sale_token(),
                sale_units(50_000_000),
                &participant(200),
            )
            .await
            .unwrap();
        bed
    };
    let buyer = participant(1);
    bed.fund(btc(), buyer, sats(10_000_000)).await;

    let err = bed
        .engine
        .buy(btc(), sats(10_000_000), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TransferFailed(_)));

    // payment returned, no ledger record
    assert_eq!(
        bed.custody.balance_of(&btc(), &buyer).await,
        sats(10_000_000)
    );
    assert!(bed.engine.participant(&buyer).await.is_none());
}

#[tokio::test]
async fn zero_payment_amount_is_invalid() {
    let bed = active_sale(true).await;
    let buyer = participant(1);

    let err = bed
        .engine
        .buy(btc(), Uint128::zero(), None, buyer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArguments(_)));
}
