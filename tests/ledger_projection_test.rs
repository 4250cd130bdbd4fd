mod common;

use common::*;
use lending_projector::domain::{
    AccrueInterest, AccrueInterestParams, BalanceKind, BorrowParams, BorrowRecord, EventLength,
    HistoryKind, LiquidateBorrowParams, LiquidateRecord, MarketMembershipParams, MarketStatus,
    MintParams, MintRecord, ProtocolEvent, RedeemParams, RepayBorrowParams, RepayBorrowRecord,
    TokenBalance, TokenInterest, TransferParams, TransferRecord, User,
};
use lending_projector::engine::{DropReason, Outcome};
use lending_projector::{Address, Decimal, LogEvent, MockChainReader};
use std::collections::HashSet;

fn mint(
    market: &Address,
    block: u64,
    tx: &str,
    minter: u8,
    shares: &str,
    underlying: &str,
) -> LogEvent {
    log_event(
        market,
        block,
        1,
        tx,
        ProtocolEvent::Mint(MintParams {
            minter: addr(minter),
            mint_amount: raw(underlying),
            mint_tokens: raw(shares),
        }),
    )
}

fn redeem(block: u64, redeemer: u8, shares: &str, underlying: &str) -> LogEvent {
    log_event(
        &addr(0xa1),
        block,
        1,
        "0x4edee3",
        ProtocolEvent::Redeem(RedeemParams {
            redeemer: addr(redeemer),
            redeem_amount: raw(underlying),
            redeem_tokens: raw(shares),
        }),
    )
}

fn transfer(block: u64, from: u8, to: u8, shares: &str) -> LogEvent {
    log_event(
        &addr(0xa1),
        block,
        2,
        "0x7a45",
        ProtocolEvent::Transfer(TransferParams {
            from: addr(from),
            to: addr(to),
            amount: raw(shares),
        }),
    )
}

fn borrow(block: u64, borrower: u8, amount: &str, account: &str, total: &str) -> LogEvent {
    log_event(
        &addr(0xa1),
        block,
        0,
        "0xb0",
        ProtocolEvent::Borrow(BorrowParams {
            borrower: addr(borrower),
            borrow_amount: raw(amount),
            account_borrows: raw(account),
            total_borrows: raw(total),
        }),
    )
}

fn repay(block: u64, payer: u8, borrower: u8, amount: &str, account: &str) -> LogEvent {
    log_event(
        &addr(0xa1),
        block,
        0,
        "0x4e",
        ProtocolEvent::RepayBorrow(RepayBorrowParams {
            payer: addr(payer),
            borrower: addr(borrower),
            repay_amount: raw(amount),
            account_borrows: raw(account),
            total_borrows: raw(account),
        }),
    )
}

fn accrue(market: u8, block: u64, borrow_index: &str) -> LogEvent {
    log_event(
        &addr(market),
        block,
        0,
        "0xacc",
        ProtocolEvent::AccrueInterest(AccrueInterestParams {
            cash_prior: raw("1000"),
            interest_accumulated: raw("7"),
            borrow_index: raw(borrow_index),
            total_borrows: raw("500000000"),
        }),
    )
}

async fn deposit(h: &Harness, market: u8, user: u8) -> Decimal {
    h.directory
        .load::<TokenBalance>(&TokenBalance::key(&addr(market), &addr(user), BalanceKind::Deposit))
        .await
        .unwrap()
        .map(|b| b.amount)
        .unwrap_or_default()
}

async fn loan(h: &Harness, user: u8) -> TokenBalance {
    // Loans are keyed by the underlying asset
    h.directory
        .load::<TokenBalance>(&TokenBalance::key(&addr(0xb1), &addr(user), BalanceKind::Loan))
        .await
        .unwrap()
        .expect("loan balance")
}

async fn listed_harness() -> Harness {
    let h = harness(lending_chain());
    h.projector.apply(&listing(&addr(0xa1), 1)).await.unwrap();
    h.projector.apply(&listing(&addr(0xa2), 1)).await.unwrap();
    h
}

#[tokio::test]
async fn test_mint_normalizes_by_market_and_underlying_decimals() {
    let h = listed_harness().await;

    let outcome = h
        .projector
        .apply(&mint(&addr(0xa1), 10, "0xm1", 0x11, "100000000000", "20000000"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Applied);

    let records = h.directory.list::<MintRecord>(None).await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, "0xm1_Mint_0");
    assert_eq!(record.amount, dec("1000"));
    assert_eq!(record.underlying_amount, dec("20"));
    assert_eq!(record.token, addr(0xa1));
    assert_eq!(record.block_number, 10);

    assert_eq!(deposit(&h, 0xa1, 0x11).await, dec("1000"));
    assert!(h
        .directory
        .load::<User>(addr(0x11).as_str())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_deposits_conserved_under_transfers() {
    let h = listed_harness().await;

    let events = vec![
        mint(&addr(0xa1), 10, "0xm1", 0x11, "100000000000", "20000000"),
        mint(&addr(0xa1), 11, "0xm2", 0x12, "50000000000", "10000000"),
        transfer(12, 0x11, 0x13, "25000000000"),
        transfer(13, 0x13, 0x12, "5000000000"),
        redeem(14, 0x13, "10000000000", "2000000"),
    ];
    for event in &events {
        assert_eq!(h.projector.apply(event).await.unwrap(), Outcome::Applied);
    }

    assert_eq!(deposit(&h, 0xa1, 0x11).await, dec("750"));
    assert_eq!(deposit(&h, 0xa1, 0x12).await, dec("550"));
    assert_eq!(deposit(&h, 0xa1, 0x13).await, dec("100"));

    let total: Decimal = h
        .directory
        .list::<TokenBalance>(None)
        .await
        .unwrap()
        .into_iter()
        .filter(|b| b.kind == BalanceKind::Deposit && b.token == addr(0xa1))
        .map(|b| b.amount)
        .sum();
    // minted 1500, redeemed 100
    assert_eq!(total, dec("1400"));

    let transfers = h.directory.list::<TransferRecord>(None).await.unwrap();
    assert_eq!(transfers.len(), 2);
}

#[tokio::test]
async fn test_mint_redeem_transfer_artifacts_ignored() {
    let h = listed_harness().await;
    h.projector
        .apply(&mint(&addr(0xa1), 10, "0xm1", 0x11, "100000000000", "20000000"))
        .await
        .unwrap();

    let artifact = log_event(
        &addr(0xa1),
        10,
        2,
        "0xm1",
        ProtocolEvent::Transfer(TransferParams {
            from: addr(0xa1),
            to: addr(0x11),
            amount: raw("100000000000"),
        }),
    );
    assert_eq!(h.projector.apply(&artifact).await.unwrap(), Outcome::Ignored);
    assert_eq!(deposit(&h, 0xa1, 0x11).await, dec("1000"));
    assert!(h
        .directory
        .list::<TransferRecord>(None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_loan_balance_is_overwritten_not_accumulated() {
    let h = listed_harness().await;

    h.projector
        .apply(&borrow(20, 0x11, "500000000", "500000000", "500000000"))
        .await
        .unwrap();
    assert_eq!(loan(&h, 0x11).await.amount, dec("500"));

    h.projector
        .apply(&repay(21, 0x12, 0x11, "250000000", "300000000"))
        .await
        .unwrap();
    let balance = loan(&h, 0x11).await;
    assert_eq!(balance.amount, dec("300"));
    assert_eq!(balance.token, addr(0xa1));

    let repays = h.directory.list::<RepayBorrowRecord>(None).await.unwrap();
    assert_eq!(repays.len(), 1);
    assert_eq!(repays[0].payer, addr(0x12));
    assert_eq!(repays[0].borrower, addr(0x11));
    assert_eq!(repays[0].repay_amount, dec("250"));

    let borrows = h.directory.list::<BorrowRecord>(None).await.unwrap();
    assert_eq!(borrows[0].account_borrows, dec("500"));
}

#[tokio::test]
async fn test_liquidation_reduces_loan_and_records_market_token() {
    let h = listed_harness().await;
    h.projector
        .apply(&borrow(20, 0x11, "300000000", "300000000", "300000000"))
        .await
        .unwrap();

    let liquidation = log_event(
        &addr(0xa1),
        30,
        0,
        "0x11d",
        ProtocolEvent::LiquidateBorrow(LiquidateBorrowParams {
            liquidator: addr(0x14),
            borrower: addr(0x11),
            repay_amount: raw("100000000"),
            c_token_collateral: addr(0xa2),
            seize_tokens: raw("500000000"),
        }),
    );
    assert_eq!(h.projector.apply(&liquidation).await.unwrap(), Outcome::Applied);

    assert_eq!(loan(&h, 0x11).await.amount, dec("200"));
    let records = h.directory.list::<LiquidateRecord>(None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "0x11d_Liquidate_0");
    assert_eq!(records[0].token, addr(0xa1));
    assert_eq!(records[0].collateral, addr(0xa2));
    assert_eq!(records[0].repay_amount, dec("100"));
    assert_eq!(records[0].seize, dec("5"));
    // Collateral side is left to the Transfer event
    assert_eq!(deposit(&h, 0xa2, 0x11).await, Decimal::zero());
}

#[tokio::test]
async fn test_liquidation_with_unknown_collateral_dropped() {
    let h = listed_harness().await;
    let liquidation = log_event(
        &addr(0xa1),
        30,
        0,
        "0x11d",
        ProtocolEvent::LiquidateBorrow(LiquidateBorrowParams {
            liquidator: addr(0x14),
            borrower: addr(0x11),
            repay_amount: raw("100000000"),
            c_token_collateral: addr(0xa9),
            seize_tokens: raw("500000000"),
        }),
    );

    assert_eq!(
        h.projector.apply(&liquidation).await.unwrap(),
        Outcome::Dropped(DropReason::UnknownCollateral(addr(0xa9)))
    );
    assert!(h
        .directory
        .list::<LiquidateRecord>(None)
        .await
        .unwrap()
        .is_empty());
    assert!(h
        .directory
        .load::<User>(addr(0x14).as_str())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_mint_counter_monotonic_and_keys_unique() {
    let h = listed_harness().await;

    // Several mints share one transaction
    for i in 0..4u64 {
        let mut event = mint(&addr(0xa1), 40, "0xbatch", 0x11, "100000000", "1000000");
        event.log_index = i;
        h.projector.apply(&event).await.unwrap();
    }
    h.projector
        .apply(&mint(&addr(0xa2), 41, "0xother", 0x12, "100000000", "1000000000000000000"))
        .await
        .unwrap();

    let counters = h
        .directory
        .load::<EventLength>(EventLength::ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(counters.current(HistoryKind::Mint), 5);
    assert_eq!(counters.current(HistoryKind::Transfer), 0);

    let ids: HashSet<String> = h
        .directory
        .list::<MintRecord>(None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids.len(), 5);
    assert!(ids.contains("0xbatch_Mint_3"));
    assert!(ids.contains("0xother_Mint_4"));
}

#[tokio::test]
async fn test_accrue_interest_on_unregistered_market_dropped() {
    let h = listed_harness().await;

    let outcome = h.projector.apply(&accrue(0xa7, 50, "1000")).await.unwrap();
    assert_eq!(outcome, Outcome::Dropped(DropReason::UnknownMarket(addr(0xa7))));

    assert!(h
        .directory
        .load::<AccrueInterest>(&AccrueInterest::key(&addr(0xa7)))
        .await
        .unwrap()
        .is_none());
    assert!(h
        .directory
        .list::<TokenInterest>(None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_borrow_links_latest_accrual_snapshot() {
    let h = listed_harness().await;

    // No snapshot yet: no interest record
    h.projector
        .apply(&borrow(20, 0x11, "100000000", "100000000", "100000000"))
        .await
        .unwrap();
    assert!(h
        .directory
        .load::<TokenInterest>(&TokenInterest::key(&addr(0xa1), &addr(0x11)))
        .await
        .unwrap()
        .is_none());

    h.projector
        .apply(&accrue(0xa1, 21, "1000000000000000000"))
        .await
        .unwrap();
    h.projector
        .apply(&accrue(0xa1, 22, "1010000000000000000"))
        .await
        .unwrap();
    let snapshot = h
        .directory
        .load::<AccrueInterest>(&AccrueInterest::key(&addr(0xa1)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.borrow_index, raw("1010000000000000000"));

    h.projector
        .apply(&repay(23, 0x11, 0x11, "10000000", "90000000"))
        .await
        .unwrap();
    let interest = h
        .directory
        .load::<TokenInterest>(&TokenInterest::key(&addr(0xa1), &addr(0x11)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(interest.borrow_index, raw("1010000000000000000"));
    assert_eq!(interest.timestamp, snapshot.timestamp);
}

#[tokio::test]
async fn test_market_membership_toggles() {
    let h = listed_harness().await;
    let membership = MarketMembershipParams {
        c_token: addr(0xa1),
        account: addr(0x11),
    };

    h.projector
        .apply(&log_event(
            &comptroller(),
            60,
            0,
            "0xe1",
            ProtocolEvent::MarketEntered(membership.clone()),
        ))
        .await
        .unwrap();
    let status = h
        .directory
        .load::<MarketStatus>(&MarketStatus::key(&addr(0xa1), &addr(0x11)))
        .await
        .unwrap()
        .unwrap();
    assert!(status.entered);

    let exit = log_event(
        &comptroller(),
        61,
        0,
        "0xe2",
        ProtocolEvent::MarketExited(membership),
    );
    h.projector.apply(&exit).await.unwrap();
    let status = h
        .directory
        .load::<MarketStatus>(&MarketStatus::key(&addr(0xa1), &addr(0x11)))
        .await
        .unwrap()
        .unwrap();
    assert!(!status.entered);
    assert_eq!(status.timestamp, exit.block_timestamp);
}

#[tokio::test]
async fn test_events_before_listing_leave_no_trace() {
    let h = harness(lending_chain());

    let outcome = h
        .projector
        .apply(&mint(&addr(0xa1), 10, "0xm1", 0x11, "100000000000", "20000000"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Dropped(DropReason::UnknownMarket(addr(0xa1))));

    assert!(h.directory.list::<MintRecord>(None).await.unwrap().is_empty());
    assert!(h.directory.list::<User>(None).await.unwrap().is_empty());
    assert!(h
        .directory
        .load::<EventLength>(EventLength::ID)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_native_market_membership_applies() {
    let chain = MockChainReader::new().with_token(&native_market(), "Filda ELA", "fELA", 8);
    let h = harness(chain);
    h.projector.apply(&listing(&native_market(), 1)).await.unwrap();

    let membership = MarketMembershipParams {
        c_token: native_market(),
        account: addr(0x11),
    };
    let enter = log_event(
        &comptroller(),
        2,
        0,
        "0xe3",
        ProtocolEvent::MarketEntered(membership.clone()),
    );
    assert_eq!(h.projector.apply(&enter).await.unwrap(), Outcome::Applied);
    let status = h
        .directory
        .load::<MarketStatus>(&MarketStatus::key(&native_market(), &addr(0x11)))
        .await
        .unwrap()
        .unwrap();
    assert!(status.entered);

    let exit = log_event(
        &comptroller(),
        3,
        0,
        "0xe4",
        ProtocolEvent::MarketExited(membership),
    );
    assert_eq!(h.projector.apply(&exit).await.unwrap(), Outcome::Applied);

    // Unlisted markets are still dropped
    let stray = log_event(
        &comptroller(),
        4,
        0,
        "0xe5",
        ProtocolEvent::MarketEntered(MarketMembershipParams {
            c_token: addr(0xa9),
            account: addr(0x11),
        }),
    );
    assert_eq!(
        h.projector.apply(&stray).await.unwrap(),
        Outcome::Dropped(DropReason::UnknownMarket(addr(0xa9)))
    );
}

#[tokio::test]
async fn test_deposit_overflow_saturates() {
    let chain = MockChainReader::new()
        .with_token(&addr(0xa6), "Whole", "WHL", 0)
        .with_token(&addr(0xb6), "Base", "BASE", 0)
        .with_underlying(&addr(0xa6), &addr(0xb6));
    let h = harness(chain);
    h.projector.apply(&listing(&addr(0xa6), 1)).await.unwrap();

    for (block, tx) in [(2, "0xf1"), (3, "0xf2")] {
        let event = mint(&addr(0xa6), block, tx, 0x11, "60000000000000000000000000000", "1");
        assert_eq!(h.projector.apply(&event).await.unwrap(), Outcome::Applied);
    }

    assert_eq!(deposit(&h, 0xa6, 0x11).await, Decimal::max());
    assert_eq!(deposit(&h, 0xa6, 0x11).await, dec("79228162514264337593543950335"));
    assert_eq!(h.directory.list::<MintRecord>(None).await.unwrap().len(), 2);
}
