//! The borrow/return state machine.
//!
//! Per (item, account) pair there are two states, not borrowed and borrowed.
//! `borrow` moves the pair forward, `return_item` moves it back. Borrowing
//! touches two stores, so it runs as charge-then-reserve with a compensating
//! refund:
//!
//! ```text
//! check duration -> price -> charge account -> reserve copy -> receipt
//!                                   |                |
//!                                   |           (fails) -> refund -> error
//!                              (fails) -> error, nothing changed
//! ```
//!
//! The account is always touched before the item. The refund is owned by a
//! guard that runs it on drop unless the borrow committed, so no early return
//! (or unwind) can leave a charge behind.

use chrono::{DateTime, Duration, Utc};

use libris_auth::{Permission, Principal, Role, authorize};
use libris_catalog::{Find, ItemCatalog, ItemQuery, ItemSpec, ItemView};
use libris_core::{AccountId, ItemId, LendingError, LendingResult, Money};
use libris_events::{Event, EventBus, InMemoryEventBus, LendingEvent, Subscription};
use libris_ledger::{AccountLedger, AccountProfile, AccountView, LedgerEntry};

use crate::clock::{Clock, SystemClock};
use crate::config::LendingConfig;
use crate::content::{ContentDelivery, ContentGrant};
use crate::pricing::{PerDiemPricing, PricingPolicy};
use crate::receipt::{BorrowedItem, LoanReceipt};
use crate::stats::CatalogStats;

/// Single owner of the catalog and the ledger.
///
/// Every inbound operation is a synchronous call returning a typed result.
/// Administrative operations take the acting [`Principal`]; lending and money
/// operations take the account id the caller was authenticated as.
#[derive(Debug)]
pub struct LendingService<P = PerDiemPricing, C = SystemClock, B = InMemoryEventBus<LendingEvent>> {
    catalog: ItemCatalog,
    ledger: AccountLedger,
    pricing: P,
    clock: C,
    bus: B,
    config: LendingConfig,
}

impl LendingService {
    /// Service with per-diem pricing from `config`, the system clock and an
    /// in-memory event bus.
    pub fn new(config: LendingConfig) -> Self {
        let pricing = PerDiemPricing::from(&config);
        Self::with_components(config, pricing, SystemClock, InMemoryEventBus::new())
    }
}

impl<P, C, B> LendingService<P, C, B>
where
    P: PricingPolicy,
    C: Clock,
    B: EventBus<LendingEvent>,
{
    pub fn with_components(config: LendingConfig, pricing: P, clock: C, bus: B) -> Self {
        Self {
            catalog: ItemCatalog::new(),
            ledger: AccountLedger::new(),
            pricing,
            clock,
            bus,
            config,
        }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &AccountLedger {
        &self.ledger
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Audit stream of every committed mutation from now on.
    pub fn subscribe(&self) -> Subscription<LendingEvent> {
        self.bus.subscribe()
    }

    fn publish(&self, event: LendingEvent) {
        let event_type = event.event_type();
        if let Err(err) = self.bus.publish(event) {
            tracing::warn!(event_type, error = ?err, "failed to publish lending event");
        }
    }

    // ── accounts ────────────────────────────────────────────────────────────

    /// Open an account with the configured promotional balance.
    pub fn sign_up(&self, role: Role, profile: AccountProfile) -> LendingResult<AccountId> {
        self.open_account_with_profile(role, self.config.signup_balance, profile)
    }

    pub fn open_account(&self, role: Role, opening_balance: Money) -> LendingResult<AccountId> {
        self.open_account_with_profile(role, opening_balance, AccountProfile::default())
    }

    fn open_account_with_profile(
        &self,
        role: Role,
        opening_balance: Money,
        profile: AccountProfile,
    ) -> LendingResult<AccountId> {
        let account_id = self.ledger.open_with_profile(role, opening_balance, profile)?;
        tracing::info!(%account_id, %role, %opening_balance, "account opened");
        self.publish(LendingEvent::AccountOpened {
            account_id,
            opening_balance,
            occurred_at: self.clock.now(),
        });
        Ok(account_id)
    }

    #[tracing::instrument(skip_all, fields(account_id = %account_id, amount = %amount))]
    pub fn deposit(&self, account_id: AccountId, amount: Money) -> LendingResult<Money> {
        let balance = self.ledger.deposit(account_id, amount)?;
        tracing::info!(%balance, "deposit");
        self.publish(LendingEvent::Deposited {
            account_id,
            amount,
            balance,
            occurred_at: self.clock.now(),
        });
        Ok(balance)
    }

    #[tracing::instrument(skip_all, fields(account_id = %account_id, amount = %amount))]
    pub fn withdraw(&self, account_id: AccountId, amount: Money) -> LendingResult<Money> {
        let balance = self.ledger.withdraw(account_id, amount)?;
        tracing::info!(%balance, "withdrawal");
        self.publish(LendingEvent::Withdrawn {
            account_id,
            amount,
            balance,
            occurred_at: self.clock.now(),
        });
        Ok(balance)
    }

    pub fn balance_of(&self, account_id: AccountId) -> LendingResult<Money> {
        self.ledger.balance_of(account_id)
    }

    pub fn account(&self, account_id: AccountId) -> LendingResult<AccountView> {
        self.ledger.get(account_id)
    }

    pub fn history(&self, account_id: AccountId) -> LendingResult<Vec<LedgerEntry>> {
        self.ledger.history(account_id)
    }

    // ── catalog administration ──────────────────────────────────────────────

    #[tracing::instrument(skip_all, fields(actor = %actor.account_id))]
    pub fn add_item(&self, actor: &Principal, spec: ItemSpec) -> LendingResult<ItemId> {
        authorize(actor, Permission::ManageCatalog)?;
        let title = spec.metadata.title.clone();
        let copies = spec.initial_copies;
        let item_id = self.catalog.add_item(spec)?;
        tracing::info!(%item_id, %title, copies, "item added");
        self.publish(LendingEvent::ItemAdded {
            item_id,
            title,
            copies,
            occurred_at: self.clock.now(),
        });
        Ok(item_id)
    }

    /// Remove an item. Refused with `ItemOnLoan` while any copy is out.
    #[tracing::instrument(skip_all, fields(actor = %actor.account_id, item_id = %item_id))]
    pub fn remove_item(&self, actor: &Principal, item_id: ItemId) -> LendingResult<()> {
        authorize(actor, Permission::ManageCatalog)?;
        let removed = self.catalog.remove_item(item_id)?;
        tracing::info!(title = %removed.metadata.title, "item removed");
        self.publish(LendingEvent::ItemRemoved {
            item_id,
            occurred_at: self.clock.now(),
        });
        Ok(())
    }

    /// Add copies to an existing item. Returns the new total.
    #[tracing::instrument(skip_all, fields(actor = %actor.account_id, item_id = %item_id, count = count))]
    pub fn add_copies(&self, actor: &Principal, item_id: ItemId, count: u32) -> LendingResult<u32> {
        authorize(actor, Permission::ManageCatalog)?;
        let total_copies = self.catalog.add_copies(item_id, count)?;
        tracing::info!(total_copies, "copies added");
        self.publish(LendingEvent::CopiesAdded {
            item_id,
            added: count,
            total_copies,
            occurred_at: self.clock.now(),
        });
        Ok(total_copies)
    }

    pub fn stats(&self, actor: &Principal) -> LendingResult<CatalogStats> {
        authorize(actor, Permission::ViewCatalogStats)?;
        Ok(CatalogStats::compute(
            self.catalog.find(ItemQuery::all()),
            self.clock.now(),
        ))
    }

    // ── browsing ────────────────────────────────────────────────────────────

    pub fn item(&self, item_id: ItemId) -> LendingResult<ItemView> {
        self.catalog.get(item_id)
    }

    pub fn find(&self, query: ItemQuery) -> Find {
        self.catalog.find(query)
    }

    pub fn categories(&self) -> Vec<String> {
        self.catalog.categories()
    }

    /// What borrowing `item_id` for `duration_days` would cost right now.
    pub fn quote(&self, item_id: ItemId, duration_days: u32) -> LendingResult<Money> {
        self.pricing.check_duration(duration_days)?;
        let base_price = self.catalog.inspect(item_id, |item| item.base_price())?;
        self.pricing.price(base_price, duration_days)
    }

    // ── lending ─────────────────────────────────────────────────────────────

    /// Charge the account and lend it one copy for `duration_days`.
    ///
    /// Either both the charge and the loan are committed, or neither is: if
    /// the copy cannot be reserved the charge is refunded before the error is
    /// returned.
    #[tracing::instrument(
        skip_all,
        fields(item_id = %item_id, account_id = %account_id, duration_days = duration_days)
    )]
    pub fn borrow(
        &self,
        item_id: ItemId,
        account_id: AccountId,
        duration_days: u32,
    ) -> LendingResult<LoanReceipt> {
        self.pricing.check_duration(duration_days)?;
        let base_price = self.catalog.inspect(item_id, |item| item.base_price())?;
        let price = self.pricing.price(base_price, duration_days)?;
        let borrowed_at = self.clock.now();
        let due_at = Duration::try_days(i64::from(duration_days))
            .and_then(|loan_period| borrowed_at.checked_add_signed(loan_period))
            .ok_or(LendingError::InvalidDuration(duration_days))?;

        let charge = PendingCharge::take(self, item_id, account_id, price, borrowed_at)?;
        self.catalog.reserve_copy(item_id, account_id, due_at)?;
        let balance_after = charge.commit();

        tracing::info!(%price, %due_at, "loan opened");
        self.publish(LendingEvent::LoanOpened {
            item_id,
            account_id,
            due_at,
            occurred_at: borrowed_at,
        });

        Ok(LoanReceipt {
            item_id,
            account_id,
            price,
            borrowed_at,
            due_at,
            balance_after,
        })
    }

    /// Give the copy back. The borrowing fee is flat, so nothing is refunded.
    #[tracing::instrument(skip_all, fields(item_id = %item_id, account_id = %account_id))]
    pub fn return_item(&self, item_id: ItemId, account_id: AccountId) -> LendingResult<()> {
        let loan = self.catalog.release_copy(item_id, account_id)?;
        let now = self.clock.now();
        tracing::info!(overdue = loan.is_overdue(now), "loan closed");
        self.publish(LendingEvent::LoanClosed {
            item_id,
            account_id,
            occurred_at: now,
        });
        Ok(())
    }

    /// Items the account currently holds, oldest first.
    pub fn borrowed_by(&self, account_id: AccountId) -> LendingResult<Vec<BorrowedItem>> {
        self.ledger.get(account_id)?;
        let now = self.clock.now();
        Ok(self
            .catalog
            .loans_of(account_id)
            .into_iter()
            .map(|(item, loan)| BorrowedItem {
                item,
                due_at: loan.due_at,
                overdue: loan.is_overdue(now),
            })
            .collect())
    }

    /// Whether `account_id` holds an active loan on `item_id` right now.
    pub fn is_entitled(&self, item_id: ItemId, account_id: AccountId) -> bool {
        self.catalog
            .inspect(item_id, |item| item.loan_of(account_id).is_some())
            .unwrap_or(false)
    }

    /// Hand the item's content to `delivery`, if the account is entitled.
    ///
    /// Fails with `NotFound` for unknown items and `NotBorrowed` when the
    /// account holds no loan; `delivery` is not called in either case.
    pub fn open_content<D>(
        &self,
        item_id: ItemId,
        account_id: AccountId,
        delivery: &D,
    ) -> LendingResult<D::Output>
    where
        D: ContentDelivery + ?Sized,
    {
        let grant = self.catalog.inspect(item_id, |item| {
            item.loan_of(account_id).map(|loan| ContentGrant {
                item_id,
                account_id,
                content_ref: item.metadata().content_ref.clone(),
                title: item.metadata().title.clone(),
                valid_until: loan.due_at,
            })
        })?;
        let grant = grant.ok_or(LendingError::NotBorrowed)?;
        tracing::debug!(%item_id, %account_id, "content access granted");
        Ok(delivery.deliver(&grant))
    }
}

/// A committed borrowing fee that is refunded on drop unless the borrow
/// commits.
struct PendingCharge<'a, P, C, B>
where
    P: PricingPolicy,
    C: Clock,
    B: EventBus<LendingEvent>,
{
    service: &'a LendingService<P, C, B>,
    item_id: ItemId,
    account_id: AccountId,
    amount: Money,
    balance_after: Money,
    charged_at: DateTime<Utc>,
    committed: bool,
}

impl<'a, P, C, B> PendingCharge<'a, P, C, B>
where
    P: PricingPolicy,
    C: Clock,
    B: EventBus<LendingEvent>,
{
    fn take(
        service: &'a LendingService<P, C, B>,
        item_id: ItemId,
        account_id: AccountId,
        amount: Money,
        charged_at: DateTime<Utc>,
    ) -> LendingResult<Self> {
        // A free loan posts nothing, but the account must still exist.
        let balance_after = if amount.is_positive() {
            let balance = service.ledger.charge(account_id, amount)?;
            service.publish(LendingEvent::Charged {
                account_id,
                item_id,
                amount,
                balance,
                occurred_at: charged_at,
            });
            balance
        } else {
            service.ledger.balance_of(account_id)?
        };

        Ok(Self {
            service,
            item_id,
            account_id,
            amount,
            balance_after,
            charged_at,
            committed: false,
        })
    }

    fn commit(mut self) -> Money {
        self.committed = true;
        self.balance_after
    }
}

impl<P, C, B> Drop for PendingCharge<'_, P, C, B>
where
    P: PricingPolicy,
    C: Clock,
    B: EventBus<LendingEvent>,
{
    fn drop(&mut self) {
        if self.committed || !self.amount.is_positive() {
            return;
        }
        let service = self.service;
        match service.ledger.refund(self.account_id, self.amount) {
            Ok(balance) => {
                tracing::warn!(
                    item_id = %self.item_id,
                    account_id = %self.account_id,
                    amount = %self.amount,
                    "borrow failed after charge; refunded"
                );
                service.publish(LendingEvent::Refunded {
                    account_id: self.account_id,
                    item_id: self.item_id,
                    amount: self.amount,
                    balance,
                    occurred_at: self.charged_at,
                });
            }
            Err(err) => {
                tracing::error!(
                    item_id = %self.item_id,
                    account_id = %self.account_id,
                    amount = %self.amount,
                    error = %err,
                    "compensating refund failed"
                );
            }
        }
    }
}
