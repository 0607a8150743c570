use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use libris_auth::Role;
use libris_core::{AccountId, Entity, LendingError, LendingResult, Money};

use crate::account::{Account, AccountProfile, AccountView, EntryKind, LedgerEntry};

type AccountHandle = Arc<Mutex<Account>>;

// `Account::post` validates before writing, so a poisoned lock still guards a
// consistent account.
fn lock_account(handle: &Mutex<Account>) -> MutexGuard<'_, Account> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of every account balance.
///
/// One mutex per account; concurrent operations on the same account are
/// serialized, different accounts never contend. Accounts are never deleted.
#[derive(Debug, Default)]
pub struct AccountLedger {
    accounts: RwLock<HashMap<AccountId, AccountHandle>>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, account_id: AccountId) -> LendingResult<AccountHandle> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&account_id)
            .cloned()
            .ok_or_else(|| LendingError::not_found(format!("account {account_id}")))
    }

    fn post(&self, account_id: AccountId, kind: EntryKind, amount: Money) -> LendingResult<Money> {
        let handle = self.handle(account_id)?;
        let mut account = lock_account(&handle);
        account.post(kind, amount).inspect_err(|err| {
            tracing::debug!(%account_id, ?kind, %amount, error = %err, "posting rejected");
        })
    }

    /// Open a new account. `opening_balance` must not be negative.
    pub fn open(&self, role: Role, opening_balance: Money) -> LendingResult<AccountId> {
        self.open_with_profile(role, opening_balance, AccountProfile::default())
    }

    pub fn open_with_profile(
        &self,
        role: Role,
        opening_balance: Money,
        profile: AccountProfile,
    ) -> LendingResult<AccountId> {
        let account_id = AccountId::new();
        self.insert(Account::open(account_id, role, opening_balance)?.with_profile(profile))?;
        Ok(account_id)
    }

    /// Insert a fully-built account (restore path). Fails if the id is taken.
    pub fn insert(&self, account: Account) -> LendingResult<()> {
        let account_id = *account.id();
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        if accounts.contains_key(&account_id) {
            return Err(LendingError::invalid_spec(format!("account {account_id} already exists")));
        }
        accounts.insert(account_id, Arc::new(Mutex::new(account)));
        Ok(())
    }

    /// Add funds. Returns the new balance.
    pub fn deposit(&self, account_id: AccountId, amount: Money) -> LendingResult<Money> {
        self.post(account_id, EntryKind::Deposit, amount)
    }

    /// Take funds out at the holder's request. Returns the new balance.
    pub fn withdraw(&self, account_id: AccountId, amount: Money) -> LendingResult<Money> {
        self.post(account_id, EntryKind::Withdrawal, amount)
    }

    /// Take a borrowing fee. Same balance rules as [`AccountLedger::withdraw`].
    pub fn charge(&self, account_id: AccountId, amount: Money) -> LendingResult<Money> {
        self.post(account_id, EntryKind::Charge, amount)
    }

    /// Give back a fee taken by [`AccountLedger::charge`].
    pub fn refund(&self, account_id: AccountId, amount: Money) -> LendingResult<Money> {
        self.post(account_id, EntryKind::Refund, amount)
    }

    pub fn balance_of(&self, account_id: AccountId) -> LendingResult<Money> {
        let handle = self.handle(account_id)?;
        let account = lock_account(&handle);
        Ok(account.balance())
    }

    pub fn get(&self, account_id: AccountId) -> LendingResult<AccountView> {
        let handle = self.handle(account_id)?;
        let account = lock_account(&handle);
        Ok(account.view())
    }

    /// Recent posted movements for one account, oldest first. At most
    /// [`crate::account::JOURNAL_CAPACITY`] entries.
    pub fn history(&self, account_id: AccountId) -> LendingResult<Vec<LedgerEntry>> {
        let handle = self.handle(account_id)?;
        let account = lock_account(&handle);
        Ok(account.journal().cloned().collect())
    }

    pub fn accounts(&self) -> Vec<AccountView> {
        let handles: Vec<AccountHandle> = self
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let mut views: Vec<AccountView> =
            handles.iter().map(|h| lock_account(h).view()).collect();
        views.sort_by_key(|v| v.id);
        views
    }

    pub fn len(&self) -> usize {
        self.accounts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
