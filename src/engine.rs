/// Purchase orchestrator and administration interface
///
/// `IdoEngine` is the entry point for the settlement engine. It composes the
/// sale controller (gating), the rate table (conversion terms), the decimal
/// normalizer and the eligibility ledger into a single atomic accept/reject
/// decision per purchase, and exposes the owner-gated administrative
/// operations.
use std::sync::Arc;

use cosmwasm_std::Uint128;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::access::{AccessControl, StaticOwner};
use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, RateSeed, SaleParams};
use crate::convert;
use crate::custody::Custody;
use crate::error::Error;
use crate::ledger::{Ledger, ParticipantAccount};
use crate::rates::{ExchangeRate, RateTable};
use crate::schedule::{SaleController, SaleStage};
use crate::types::{Address, PurchaseReceipt};

/// Everything a purchase reads or mutates, guarded by one lock so each
/// settlement is a single indivisible unit.
struct EngineState {
    params: SaleParams,
    rates: RateTable,
    ledger: Ledger,
    controller: SaleController,
}

/// The settlement engine.
pub struct IdoEngine {
    state: RwLock<EngineState>,
    custody: Arc<dyn Custody>,
    access: Arc<dyn AccessControl>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for IdoEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdoEngine").finish_non_exhaustive()
    }
}

impl IdoEngine {
    pub fn builder() -> IdoEngineBuilder {
        IdoEngineBuilder::new()
    }

    // ============ Purchase entry point ============

    /// Settle one purchase: validate gating, convert the payment amount,
    /// enforce caps, instruct custody, apply referral attribution and record
    /// the result in the ledger.
    ///
    /// Either every effect takes hold or none does: the whole pipeline runs
    /// under the state write lock, custody is instructed before any ledger
    /// mutation, and a failed buyer credit is compensated by returning the
    /// pulled payment.
    pub async fn buy(
        &self,
        payment_token: Address,
        payment_amount: Uint128,
        referrer: Option<Address>,
        buyer: Address,
    ) -> Result<PurchaseReceipt, Error> {
        if buyer.is_zero() {
            return Err(Error::InvalidArguments(
                "buyer address must not be zero".to_string(),
            ));
        }

        let now = self.clock.now();
        let mut state = self.state.write().await;

        state.controller.check_open(now, &buyer)?;

        if payment_amount.is_zero() {
            return Err(Error::InvalidArguments(
                "payment amount must be positive".to_string(),
            ));
        }

        let rate = state.rates.get(&payment_token)?.clone();
        let sale_amount = convert::to_sale_amount(payment_amount, &rate, state.params.sale_decimals)?;

        if sale_amount < state.params.min_request_amount {
            return Err(Error::RequestTooLow {
                requested: sale_amount,
                minimum: state.params.min_request_amount,
            });
        }

        let credited = state
            .ledger
            .get(&buyer)
            .map(|a| a.total_credited)
            .unwrap_or_default();
        let new_total = credited
            .checked_add(sale_amount)
            .map_err(|_| Error::ArithmeticOverflow)?;
        if new_total > state.params.buyer_cap {
            return Err(Error::BuyerCapExceeded {
                requested: sale_amount,
                credited,
                cap: state.params.buyer_cap,
            });
        }

        // Referral eligibility is judged against the buyer's state at call
        // entry, before this purchase flips the first-purchase flag. The
        // whole attribution is planned here so no fallible arithmetic runs
        // between custody instructions.
        let first_purchase = !state
            .ledger
            .get(&buyer)
            .map(|a| a.has_purchased)
            .unwrap_or(false);
        let planned_bonus = match referrer {
            Some(referrer) if !referrer.is_zero() && referrer != buyer && first_purchase => {
                self.plan_referral(&state, &referrer, sale_amount)?
                    .map(|bonus| (referrer, bonus))
            }
            _ => None,
        };

        // Custody instructions happen before any ledger mutation so a
        // rejected transfer leaves no trace.
        self.custody
            .pull(&payment_token, &buyer, payment_amount)
            .await
            .map_err(|e| Error::TransferFailed(e.to_string()))?;

        if let Err(e) = self
            .custody
            .credit(&state.params.sale_token, &buyer, sale_amount)
            .await
        {
            if let Err(refund) = self
                .custody
                .credit(&payment_token, &buyer, payment_amount)
                .await
            {
                warn!(
                    "failed to return payment to {} after credit failure: {}",
                    buyer, refund
                );
            }
            return Err(Error::TransferFailed(e.to_string()));
        }

        let referral_bonus = match planned_bonus {
            Some((referrer, bonus)) => {
                // a failed bonus credit suppresses only the bonus, matching
                // the soft behavior of the referral caps
                match self
                    .custody
                    .credit(&state.params.sale_token, &referrer, bonus)
                    .await
                {
                    Ok(()) => {
                        let account = state.ledger.entry(referrer);
                        account.referral_earned += bonus;
                        account.referred_count += 1;
                        bonus
                    }
                    Err(e) => {
                        warn!(
                            "referral bonus credit to {} for buyer {} failed, purchase stands: {}",
                            referrer, buyer, e
                        );
                        Uint128::zero()
                    }
                }
            }
            None => Uint128::zero(),
        };

        let account = state.ledger.entry(buyer);
        account.total_credited = new_total;
        account.has_purchased = true;

        let receipt = PurchaseReceipt {
            id: Uuid::new_v4(),
            buyer,
            payment_token,
            payment_amount,
            sale_amount,
            referral_bonus,
            timestamp: now,
        };
        info!(
            "settled purchase {}: buyer={} sale_amount={} referral_bonus={}",
            receipt.id, buyer, sale_amount, referral_bonus
        );
        Ok(receipt)
    }

    /// Decide whether the referrer's caps allow a bonus for this purchase.
    /// Cap or count exhaustion suppresses only the bonus; the purchase
    /// stands either way.
    fn plan_referral(
        &self,
        state: &EngineState,
        referrer: &Address,
        sale_amount: Uint128,
    ) -> Result<Option<Uint128>, Error> {
        let bonus = convert::referral_bonus(sale_amount, state.params.referral_bonus_bips)?;

        let (count, earned) = state
            .ledger
            .get(referrer)
            .map(|a| (a.referred_count, a.referral_earned))
            .unwrap_or((0, Uint128::zero()));

        if count >= state.params.max_referred_count {
            debug!(
                "referrer {} already at {} referred buyers, skipping bonus",
                referrer, count
            );
            return Ok(None);
        }
        let within_cap = earned
            .checked_add(bonus)
            .map(|total| total <= state.params.referral_cap)
            .unwrap_or(false);
        if !within_cap {
            debug!(
                "bonus {} would push referrer {} past the referral cap, skipping",
                bonus, referrer
            );
            return Ok(None);
        }
        Ok(Some(bonus))
    }

    // ============ Administration interface ============

    /// Register or replace the exchange rate for a payment token,
    /// enabling it.
    pub async fn set_rate(
        &self,
        caller: &Address,
        token: Address,
        output: Uint128,
        input: Uint128,
        payment_decimals: u8,
    ) -> Result<(), Error> {
        self.ensure_owner(caller)?;
        let mut state = self.state.write().await;
        state.rates.set(token, output, input, payment_decimals)?;
        info!(
            "rate updated for {}: {} sale units per {} payment units",
            token, output, input
        );
        Ok(())
    }

    /// Disable a payment token. Its entry is kept but purchases with it
    /// fail until it is re-registered.
    pub async fn disable_rate(&self, caller: &Address, token: &Address) -> Result<(), Error> {
        self.ensure_owner(caller)?;
        let mut state = self.state.write().await;
        state.rates.disable(token)?;
        info!("rate disabled for {}", token);
        Ok(())
    }

    /// Switch the sale stage. A freshly built engine starts `Paused`.
    pub async fn set_stage(&self, caller: &Address, stage: SaleStage) -> Result<(), Error> {
        self.ensure_owner(caller)?;
        let mut state = self.state.write().await;
        state.controller.set_stage(stage);
        info!("sale stage set to {:?}", stage);
        Ok(())
    }

    /// Open or close the sale to buyers outside the allow-list.
    pub async fn set_public_sale(&self, caller: &Address, public: bool) -> Result<(), Error> {
        self.ensure_owner(caller)?;
        let mut state = self.state.write().await;
        state.controller.set_public(public);
        state.params.public_sale = public;
        info!("public sale set to {}", public);
        Ok(())
    }

    /// Add one address to the allow-list.
    pub async fn add_to_allow_list(&self, caller: &Address, address: Address) -> Result<(), Error> {
        self.ensure_owner(caller)?;
        if address.is_zero() {
            return Err(Error::InvalidArguments(
                "allow-list address must not be zero".to_string(),
            ));
        }
        let mut state = self.state.write().await;
        state.controller.allow(address);
        debug!("allow-listed {}", address);
        Ok(())
    }

    /// Add a batch of addresses to the allow-list.
    pub async fn extend_allow_list(
        &self,
        caller: &Address,
        addresses: Vec<Address>,
    ) -> Result<(), Error> {
        self.ensure_owner(caller)?;
        let mut state = self.state.write().await;
        let mut added = 0usize;
        for address in addresses {
            if address.is_zero() {
                return Err(Error::InvalidArguments(
                    "allow-list address must not be zero".to_string(),
                ));
            }
            if state.controller.allow(address) {
                added += 1;
            }
        }
        debug!("allow-listed {} new addresses", added);
        Ok(())
    }

    /// Move held token balance out of custody to a recipient. Bounded only
    /// by the available custody balance.
    pub async fn withdraw(
        &self,
        caller: &Address,
        token: &Address,
        amount: Uint128,
        recipient: &Address,
    ) -> Result<(), Error> {
        self.ensure_owner(caller)?;
        if recipient.is_zero() {
            return Err(Error::InvalidArguments(
                "withdraw recipient must not be zero".to_string(),
            ));
        }
        self.custody
            .credit(token, recipient, amount)
            .await
            .map_err(|e| Error::TransferFailed(e.to_string()))?;
        info!("withdrew {} of {} to {}", amount, token, recipient);
        Ok(())
    }

    /// Update the minimum sale-token allocation a purchase must produce.
    pub async fn set_min_request_amount(
        &self,
        caller: &Address,
        amount: Uint128,
    ) -> Result<(), Error> {
        self.ensure_owner(caller)?;
        let mut state = self.state.write().await;
        state.params.min_request_amount = amount;
        info!("minimum request amount set to {}", amount);
        Ok(())
    }

    /// Update the per-buyer lifetime cap.
    pub async fn set_buyer_cap(&self, caller: &Address, cap: Uint128) -> Result<(), Error> {
        self.ensure_owner(caller)?;
        let mut state = self.state.write().await;
        state.params.buyer_cap = cap;
        info!("buyer cap set to {}", cap);
        Ok(())
    }

    /// Update the referral incentive parameters.
    pub async fn set_referral_params(
        &self,
        caller: &Address,
        bonus_bips: u16,
        max_referred_count: u32,
        referral_cap: Uint128,
    ) -> Result<(), Error> {
        self.ensure_owner(caller)?;
        if u64::from(bonus_bips) > convert::BPS_DENOMINATOR {
            return Err(Error::InvalidArguments(format!(
                "referral bonus {} bips exceeds {}",
                bonus_bips,
                convert::BPS_DENOMINATOR
            )));
        }
        let mut state = self.state.write().await;
        state.params.referral_bonus_bips = bonus_bips;
        state.params.max_referred_count = max_referred_count;
        state.params.referral_cap = referral_cap;
        info!(
            "referral params set: {} bips, {} referred max, cap {}",
            bonus_bips, max_referred_count, referral_cap
        );
        Ok(())
    }

    // ============ Read-only accessors ============

    /// The enabled exchange rate for a payment token.
    pub async fn exchange_rate(&self, token: &Address) -> Result<ExchangeRate, Error> {
        let state = self.state.read().await;
        state.rates.get(token).map(|rate| rate.clone())
    }

    /// The cumulative record for an address, if it has interacted.
    pub async fn participant(&self, address: &Address) -> Option<ParticipantAccount> {
        let state = self.state.read().await;
        state.ledger.get(address).cloned()
    }

    /// A snapshot of the current sale parameters.
    pub async fn sale_params(&self) -> SaleParams {
        let state = self.state.read().await;
        state.params.clone()
    }

    pub async fn stage(&self) -> SaleStage {
        let state = self.state.read().await;
        state.controller.stage()
    }

    pub async fn is_allow_listed(&self, address: &Address) -> bool {
        let state = self.state.read().await;
        state.controller.is_allowed(address)
    }

    /// The owner identity, as resolved by the access-control collaborator.
    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    /// A summary of the engine state for diagnostics.
    pub async fn summary(&self) -> serde_json::Value {
        let state = self.state.read().await;
        let (start, end) = state.controller.window();
        serde_json::json!({
            "sale_token": state.params.sale_token,
            "stage": state.controller.stage(),
            "public_sale": state.controller.is_public(),
            "window": { "start": start, "end": end },
            "rates": state.rates.len(),
            "participants": state.ledger.len(),
            "allow_list": state.controller.allow_list_len(),
        })
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), Error> {
        if self.access.is_owner(caller) {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }
}

/// Builder for `IdoEngine` construction.
pub struct IdoEngineBuilder {
    params: Option<SaleParams>,
    custody: Option<Arc<dyn Custody>>,
    access: Option<Arc<dyn AccessControl>>,
    clock: Option<Arc<dyn Clock>>,
    rates: Vec<RateSeed>,
}

impl IdoEngineBuilder {
    pub fn new() -> Self {
        Self {
            params: None,
            custody: None,
            access: None,
            clock: None,
            rates: Vec::new(),
        }
    }

    /// Populate the builder from a loaded configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self::new()
            .with_params(config.sale)
            .with_owner(config.owner)
            .with_rates(config.rates)
    }

    pub fn with_params(mut self, params: SaleParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Authorize a single fixed owner for administrative operations.
    pub fn with_owner(mut self, owner: Address) -> Self {
        self.access = Some(Arc::new(StaticOwner::new(owner)));
        self
    }

    /// Inject a custom access-control collaborator instead of a fixed owner.
    pub fn with_access_control(mut self, access: Arc<dyn AccessControl>) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_custody(mut self, custody: Arc<dyn Custody>) -> Self {
        self.custody = Some(custody);
        self
    }

    /// Inject a clock. Defaults to the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_rate(mut self, seed: RateSeed) -> Self {
        self.rates.push(seed);
        self
    }

    pub fn with_rates(mut self, seeds: Vec<RateSeed>) -> Self {
        self.rates.extend(seeds);
        self
    }

    /// Validate the configuration and assemble the engine. The sale starts
    /// `Paused`; an administrator must activate it before purchases settle.
    pub fn build(self) -> Result<IdoEngine, Error> {
        let params = self
            .params
            .ok_or_else(|| Error::Config("sale parameters are required".into()))?;
        params.validate()?;

        let custody = self
            .custody
            .ok_or_else(|| Error::Config("a custody collaborator is required".into()))?;
        let access = self
            .access
            .ok_or_else(|| Error::Config("an owner or access-control collaborator is required".into()))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let mut rates = RateTable::new();
        for seed in self.rates {
            rates.set(seed.token, seed.output, seed.input, seed.payment_decimals)?;
        }

        let controller = SaleController::new(params.start_time, params.end_time, params.public_sale);

        Ok(IdoEngine {
            state: RwLock::new(EngineState {
                params,
                rates,
                ledger: Ledger::new(),
                controller,
            }),
            custody,
            access,
            clock,
        })
    }
}

impl Default for IdoEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
