//! Per-market ledger handlers: supply, withdrawal, debt, liquidation, transfers, accrual,
//! and collateral membership.

use super::{take_ticket, Outcome, Projector};
use crate::domain::{
    to_decimal, AccrueInterest, AccrueInterestParams, Address, BalanceKind, BorrowParams,
    BorrowRecord, Decimal, HistoryKind, LiquidateBorrowParams, LiquidateRecord, LogEvent,
    MarketMembershipParams, MarketStatus, MintParams, MintRecord, RedeemParams, RedeemRecord,
    RepayBorrowParams, RepayBorrowRecord, Token, TokenBalance, TransferParams, TransferRecord,
};
use crate::engine::DropReason;
use crate::store::StoreError;
use tracing::warn;

/// Apply `delta` to a balance, pinning at the representable bound on overflow.
fn offset(current: Decimal, delta: Decimal, balance: &str) -> Decimal {
    current.checked_add(delta).unwrap_or_else(|| {
        warn!(balance, %current, %delta, "Balance overflow, saturating");
        current.saturating_add(delta)
    })
}

impl Projector {
    pub(crate) async fn on_mint(
        &self,
        event: &LogEvent,
        params: &MintParams,
    ) -> Result<Outcome, StoreError> {
        let ctx = match self.resolve_market(&event.address).await? {
            Ok(ctx) => ctx,
            Err(reason) => return Ok(Outcome::Dropped(reason)),
        };
        self.ensure_user(&params.minter).await?;

        let amount = to_decimal(params.mint_tokens, ctx.market.decimals);
        let id = take_ticket(&self.directory, HistoryKind::Mint, &event.tx_hash).await?;
        self.directory
            .save(&MintRecord {
                id,
                token: ctx.address.clone(),
                minter: params.minter.clone(),
                amount,
                underlying_amount: to_decimal(params.mint_amount, ctx.underlying.decimals),
                timestamp: event.block_timestamp,
                block_number: event.block_number,
                tx_hash: event.tx_hash.clone(),
            })
            .await?;

        self.adjust_deposit(&ctx.address, &params.minter, amount)
            .await?;
        Ok(Outcome::Applied)
    }

    pub(crate) async fn on_redeem(
        &self,
        event: &LogEvent,
        params: &RedeemParams,
    ) -> Result<Outcome, StoreError> {
        let ctx = match self.resolve_market(&event.address).await? {
            Ok(ctx) => ctx,
            Err(reason) => return Ok(Outcome::Dropped(reason)),
        };
        self.ensure_user(&params.redeemer).await?;

        let amount = to_decimal(params.redeem_tokens, ctx.market.decimals);
        let id = take_ticket(&self.directory, HistoryKind::Redeem, &event.tx_hash).await?;
        self.directory
            .save(&RedeemRecord {
                id,
                token: ctx.address.clone(),
                redeemer: params.redeemer.clone(),
                amount,
                underlying_amount: to_decimal(params.redeem_amount, ctx.underlying.decimals),
                timestamp: event.block_timestamp,
                block_number: event.block_number,
                tx_hash: event.tx_hash.clone(),
            })
            .await?;

        self.adjust_deposit(&ctx.address, &params.redeemer, -amount)
            .await?;
        Ok(Outcome::Applied)
    }

    pub(crate) async fn on_borrow(
        &self,
        event: &LogEvent,
        params: &BorrowParams,
    ) -> Result<Outcome, StoreError> {
        let ctx = match self.resolve_market(&event.address).await? {
            Ok(ctx) => ctx,
            Err(reason) => return Ok(Outcome::Dropped(reason)),
        };
        self.ensure_user(&params.borrower).await?;

        let decimals = ctx.underlying.decimals;
        let account_borrows = to_decimal(params.account_borrows, decimals);
        let id = take_ticket(&self.directory, HistoryKind::Borrow, &event.tx_hash).await?;
        self.directory
            .save(&BorrowRecord {
                id,
                token: ctx.address.clone(),
                borrower: params.borrower.clone(),
                borrow_amount: to_decimal(params.borrow_amount, decimals),
                account_borrows,
                total_borrows: to_decimal(params.total_borrows, decimals),
                timestamp: event.block_timestamp,
                block_number: event.block_number,
                tx_hash: event.tx_hash.clone(),
            })
            .await?;

        self.update_loan(&ctx.address, &ctx.market, &params.borrower, |_, _| {
            account_borrows
        })
        .await?;
        self.link_interest(&ctx.address, &params.borrower).await?;
        Ok(Outcome::Applied)
    }

    pub(crate) async fn on_repay_borrow(
        &self,
        event: &LogEvent,
        params: &RepayBorrowParams,
    ) -> Result<Outcome, StoreError> {
        let ctx = match self.resolve_market(&event.address).await? {
            Ok(ctx) => ctx,
            Err(reason) => return Ok(Outcome::Dropped(reason)),
        };
        self.ensure_user(&params.borrower).await?;
        self.ensure_user(&params.payer).await?;

        let decimals = ctx.underlying.decimals;
        let account_borrows = to_decimal(params.account_borrows, decimals);
        let id = take_ticket(&self.directory, HistoryKind::Repay, &event.tx_hash).await?;
        self.directory
            .save(&RepayBorrowRecord {
                id,
                token: ctx.address.clone(),
                borrower: params.borrower.clone(),
                payer: params.payer.clone(),
                repay_amount: to_decimal(params.repay_amount, decimals),
                account_borrows,
                total_borrows: to_decimal(params.total_borrows, decimals),
                timestamp: event.block_timestamp,
                block_number: event.block_number,
                tx_hash: event.tx_hash.clone(),
            })
            .await?;

        self.update_loan(&ctx.address, &ctx.market, &params.borrower, |_, _| {
            account_borrows
        })
        .await?;
        self.link_interest(&ctx.address, &params.borrower).await?;
        Ok(Outcome::Applied)
    }

    pub(crate) async fn on_liquidate_borrow(
        &self,
        event: &LogEvent,
        params: &LiquidateBorrowParams,
    ) -> Result<Outcome, StoreError> {
        let ctx = match self.resolve_market(&event.address).await? {
            Ok(ctx) => ctx,
            Err(reason) => return Ok(Outcome::Dropped(reason)),
        };
        let Some(collateral) = self
            .directory
            .load::<Token>(params.c_token_collateral.as_str())
            .await?
        else {
            return Ok(Outcome::Dropped(DropReason::UnknownCollateral(
                params.c_token_collateral.clone(),
            )));
        };
        self.ensure_user(&params.liquidator).await?;
        self.ensure_user(&params.borrower).await?;

        let repay_amount = to_decimal(params.repay_amount, ctx.underlying.decimals);
        let id = take_ticket(&self.directory, HistoryKind::Liquidate, &event.tx_hash).await?;
        self.directory
            .save(&LiquidateRecord {
                id,
                token: ctx.address.clone(),
                collateral: params.c_token_collateral.clone(),
                liquidator: params.liquidator.clone(),
                borrower: params.borrower.clone(),
                repay_amount,
                seize: to_decimal(params.seize_tokens, collateral.decimals),
                timestamp: event.block_timestamp,
                block_number: event.block_number,
                tx_hash: event.tx_hash.clone(),
            })
            .await?;

        // Seized collateral moves through its own Transfer event
        self.update_loan(&ctx.address, &ctx.market, &params.borrower, |current, id| {
            offset(current, -repay_amount, id)
        })
        .await?;
        Ok(Outcome::Applied)
    }

    pub(crate) async fn on_transfer(
        &self,
        event: &LogEvent,
        params: &TransferParams,
    ) -> Result<Outcome, StoreError> {
        // Mint and redeem emit a transfer from/to the market itself
        if params.from == event.address || params.to == event.address {
            return Ok(Outcome::Ignored);
        }
        let ctx = match self.resolve_market(&event.address).await? {
            Ok(ctx) => ctx,
            Err(reason) => return Ok(Outcome::Dropped(reason)),
        };
        self.ensure_user(&params.from).await?;
        self.ensure_user(&params.to).await?;

        let amount = to_decimal(params.amount, ctx.market.decimals);
        self.adjust_deposit(&ctx.address, &params.from, -amount)
            .await?;
        self.adjust_deposit(&ctx.address, &params.to, amount).await?;

        let id = take_ticket(&self.directory, HistoryKind::Transfer, &event.tx_hash).await?;
        self.directory
            .save(&TransferRecord {
                id,
                token: ctx.address.clone(),
                from: params.from.clone(),
                to: params.to.clone(),
                amount,
                timestamp: event.block_timestamp,
                block_number: event.block_number,
                tx_hash: event.tx_hash.clone(),
            })
            .await?;
        Ok(Outcome::Applied)
    }

    pub(crate) async fn on_accrue_interest(
        &self,
        event: &LogEvent,
        params: &AccrueInterestParams,
    ) -> Result<Outcome, StoreError> {
        let ctx = match self.resolve_market(&event.address).await? {
            Ok(ctx) => ctx,
            Err(reason) => return Ok(Outcome::Dropped(reason)),
        };

        self.directory
            .save(&AccrueInterest {
                id: AccrueInterest::key(&ctx.address),
                market: ctx.address.clone(),
                cash_prior: params.cash_prior,
                interest_accumulated: params.interest_accumulated,
                borrow_index: params.borrow_index,
                total_borrows: params.total_borrows,
                timestamp: event.block_timestamp,
            })
            .await?;
        Ok(Outcome::Applied)
    }

    pub(crate) async fn on_market_membership(
        &self,
        event: &LogEvent,
        params: &MarketMembershipParams,
        entered: bool,
    ) -> Result<Outcome, StoreError> {
        // Only the market token matters here; the native market has no underlying
        let market = &params.c_token;
        if self.directory.load::<Token>(market.as_str()).await?.is_none() {
            return Ok(Outcome::Dropped(DropReason::UnknownMarket(market.clone())));
        }
        self.ensure_user(&params.account).await?;

        let mut status = self
            .directory
            .get_or_create(&MarketStatus::key(market, &params.account), || {
                MarketStatus::new(market, &params.account)
            })
            .await?;
        status.entered = entered;
        status.timestamp = event.block_timestamp;
        self.directory.save(&status).await?;
        Ok(Outcome::Applied)
    }

    /// Add `delta` to the user's Deposit balance in `market`, creating it at zero.
    async fn adjust_deposit(
        &self,
        market: &Address,
        user: &Address,
        delta: Decimal,
    ) -> Result<(), StoreError> {
        let mut balance = self
            .directory
            .get_or_create(&TokenBalance::key(market, user, BalanceKind::Deposit), || {
                TokenBalance::new(market, market, user, BalanceKind::Deposit)
            })
            .await?;
        balance.amount = offset(balance.amount, delta, &balance.id);
        self.directory.save(&balance).await
    }

    /// Rewrite the user's Loan balance, keyed by the market's underlying asset.
    async fn update_loan<F>(
        &self,
        market: &Address,
        market_token: &Token,
        user: &Address,
        update: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(Decimal, &str) -> Decimal,
    {
        let key_token = &market_token.underlying;
        let mut balance = self
            .directory
            .get_or_create(&TokenBalance::key(key_token, user, BalanceKind::Loan), || {
                TokenBalance::new(key_token, market, user, BalanceKind::Loan)
            })
            .await?;
        balance.amount = update(balance.amount, &balance.id);
        self.directory.save(&balance).await
    }
}
