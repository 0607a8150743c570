use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use libris_auth::Role;
use libris_core::{AccountId, Entity, LendingError, LendingResult, Money};

/// Why a balance moved.
///
/// `Withdrawal` and `Charge` (and likewise `Deposit` and `Refund`) have the
/// same effect on the balance; they are kept apart for auditing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deposit,
    Withdrawal,
    Charge,
    Refund,
}

impl EntryKind {
    fn is_credit(self) -> bool {
        matches!(self, EntryKind::Deposit | EntryKind::Refund)
    }
}

/// One posted balance movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: EntryKind,
    /// Always positive; direction comes from `kind`.
    pub amount: Money,
    pub balance_after: Money,
}

/// Most recent postings kept per account; older ones are dropped first.
pub const JOURNAL_CAPACITY: usize = 512;

/// Who the holder says they are. Opaque to the lending rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl AccountProfile {
    pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            display_name: non_blank(display_name.into()),
            email: non_blank(email.into()),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// An account holder and their balance.
///
/// Invariant: `balance >= 0`. Debits that would go below zero are rejected
/// with `InsufficientFunds`, and credits that would overflow with
/// `InvalidAmount`; either way the account is left untouched.
///
/// The journal is a rolling window of the last [`JOURNAL_CAPACITY`] postings,
/// not a full history. The balance is authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    role: Role,
    profile: AccountProfile,
    balance: Money,
    journal: VecDeque<LedgerEntry>,
}

impl Account {
    pub fn open(id: AccountId, role: Role, opening_balance: Money) -> LendingResult<Self> {
        if opening_balance.is_negative() {
            return Err(LendingError::invalid_amount(format!(
                "opening balance cannot be negative: {opening_balance}"
            )));
        }
        Ok(Self {
            id,
            role,
            profile: AccountProfile::default(),
            balance: opening_balance,
            journal: VecDeque::new(),
        })
    }

    pub fn with_profile(mut self, profile: AccountProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> &AccountProfile {
        &self.profile
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Recent postings, oldest first.
    pub fn journal(&self) -> impl ExactSizeIterator<Item = &LedgerEntry> + '_ {
        self.journal.iter()
    }

    /// Apply a balance movement of the given kind. Returns the new balance.
    pub fn post(&mut self, kind: EntryKind, amount: Money) -> LendingResult<Money> {
        if !amount.is_positive() {
            return Err(LendingError::invalid_amount(format!(
                "amount must be positive: {amount}"
            )));
        }
        let balance_after = if kind.is_credit() {
            self.balance.checked_add(amount).ok_or_else(|| {
                LendingError::invalid_amount(format!("{amount} would overflow the balance"))
            })?
        } else {
            if amount > self.balance {
                return Err(LendingError::InsufficientFunds);
            }
            self.balance
                .checked_sub(amount)
                .ok_or(LendingError::InsufficientFunds)?
        };

        self.balance = balance_after;
        if self.journal.len() == JOURNAL_CAPACITY {
            self.journal.pop_front();
        }
        self.journal.push_back(LedgerEntry {
            kind,
            amount,
            balance_after,
        });
        Ok(balance_after)
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            role: self.role,
            profile: self.profile.clone(),
            balance: self.balance,
        }
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Detached snapshot of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: AccountId,
    pub role: Role,
    pub profile: AccountProfile,
    pub balance: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn member(balance_cents: i64) -> Account {
        Account::open(AccountId::new(), Role::Member, Money::from_cents(balance_cents)).unwrap()
    }

    #[test]
    fn negative_opening_balance_is_rejected() {
        let err = Account::open(AccountId::new(), Role::Member, Money::from_cents(-1)).unwrap_err();
        assert!(matches!(err, LendingError::InvalidAmount(_)));
    }

    #[test]
    fn deposit_and_charge_are_journaled_separately() {
        let mut account = member(0);
        account.post(EntryKind::Deposit, Money::from_cents(2000)).unwrap();
        let balance = account.post(EntryKind::Charge, Money::from_cents(1349)).unwrap();

        assert_eq!(balance, Money::from_cents(651));
        let kinds: Vec<EntryKind> = account.journal().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Deposit, EntryKind::Charge]);
    }

    #[test]
    fn overdraw_is_rejected_without_side_effects() {
        let mut account = member(1000);
        let before = account.clone();
        assert_eq!(
            account.post(EntryKind::Withdrawal, Money::from_cents(1001)),
            Err(LendingError::InsufficientFunds)
        );
        assert_eq!(account, before);
    }

    #[test]
    fn exact_balance_can_be_withdrawn() {
        let mut account = member(1000);
        assert_eq!(
            account.post(EntryKind::Withdrawal, Money::from_cents(1000)),
            Ok(Money::ZERO)
        );
    }

    #[test]
    fn non_positive_amounts_are_invalid() {
        let mut account = member(1000);
        for kind in [EntryKind::Deposit, EntryKind::Withdrawal, EntryKind::Charge, EntryKind::Refund] {
            assert!(matches!(
                account.post(kind, Money::from_cents(-500)),
                Err(LendingError::InvalidAmount(_))
            ));
            assert!(matches!(
                account.post(kind, Money::ZERO),
                Err(LendingError::InvalidAmount(_))
            ));
        }
        assert_eq!(account.balance(), Money::from_cents(1000));
        assert_eq!(account.journal().len(), 0);
    }

    #[test]
    fn credit_overflow_is_invalid_amount_not_a_panic() {
        let mut account =
            Account::open(AccountId::new(), Role::Member, Money::MAX).unwrap();
        for kind in [EntryKind::Deposit, EntryKind::Refund] {
            assert!(matches!(
                account.post(kind, Money::from_cents(100)),
                Err(LendingError::InvalidAmount(_))
            ));
        }
        assert_eq!(account.balance(), Money::MAX);
        assert_eq!(account.journal().len(), 0);

        // Debits from the top of the range still work.
        assert!(account.post(EntryKind::Charge, Money::MAX).is_ok());
        assert_eq!(account.balance(), Money::ZERO);
    }

    #[test]
    fn journal_keeps_only_the_most_recent_postings() {
        let mut account = member(0);
        let extra = 5;
        for _ in 0..JOURNAL_CAPACITY + extra {
            account.post(EntryKind::Deposit, Money::from_cents(1)).unwrap();
        }

        assert_eq!(account.journal().len(), JOURNAL_CAPACITY);
        let oldest = account.journal().next().unwrap();
        assert_eq!(oldest.balance_after, Money::from_cents(extra as i64 + 1));
        // Trimming the journal never touches the balance.
        assert_eq!(account.balance(), Money::from_cents((JOURNAL_CAPACITY + extra) as i64));
    }

    #[test]
    fn profile_blanks_become_none() {
        let profile = AccountProfile::new("  Ada Lovelace ", "   ");
        assert_eq!(profile.display_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.email, None);

        let account = member(0).with_profile(profile.clone());
        assert_eq!(account.view().profile, profile);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: no sequence of postings, accepted or rejected, drives the
        /// balance below zero, and the balance always equals credits - debits.
        #[test]
        fn balance_never_negative(
            ops in prop::collection::vec((0u8..4, -500i64..5_000i64), 1..64)
        ) {
            let mut account = member(0);
            for (kind, cents) in ops {
                let kind = match kind {
                    0 => EntryKind::Deposit,
                    1 => EntryKind::Withdrawal,
                    2 => EntryKind::Charge,
                    _ => EntryKind::Refund,
                };
                let _ = account.post(kind, Money::from_cents(cents));
                prop_assert!(!account.balance().is_negative());
            }

            let (credits, debits) = account.journal().fold((Money::ZERO, Money::ZERO), |(c, d), e| {
                if e.kind.is_credit() {
                    (c.saturating_add(e.amount), d)
                } else {
                    (c, d.saturating_add(e.amount))
                }
            });
            prop_assert_eq!(credits.checked_sub(debits), Some(account.balance()));
        }
    }
}
