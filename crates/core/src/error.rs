//! Domain error model.

use thiserror::Error;

/// Result type used across the lending domain.
pub type LendingResult<T> = Result<T, LendingError>;

/// Domain-level error.
///
/// Every failure of a catalog, ledger or lending operation is one of these.
/// All of them are recoverable at the call boundary and none is retried
/// automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LendingError {
    /// An item specification (or copy adjustment) was malformed.
    #[error("invalid item spec: {0}")]
    InvalidSpec(String),

    /// The referenced item or account does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The item still has active loans and cannot be removed.
    #[error("item is on loan")]
    ItemOnLoan,

    /// Every copy of the item is currently lent out.
    #[error("no copies available")]
    NoCopiesAvailable,

    /// The account already holds a loan on this item.
    #[error("item already borrowed by this account")]
    AlreadyBorrowed,

    /// The account holds no loan on this item.
    #[error("item not borrowed by this account")]
    NotBorrowed,

    /// A money amount was zero, negative or otherwise unusable.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The balance does not cover the requested amount.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Borrow duration outside the allowed window.
    #[error("invalid duration: {0} days")]
    InvalidDuration(u32),

    /// The acting principal's role does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl LendingError {
    pub fn invalid_spec(msg: impl Into<String>) -> Self {
        Self::InvalidSpec(msg.into())
    }

    pub fn not_found(what: impl core::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Stable, machine-readable name of the error kind (for logs and audit).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSpec(_) => "invalid_spec",
            Self::NotFound(_) => "not_found",
            Self::ItemOnLoan => "item_on_loan",
            Self::NoCopiesAvailable => "no_copies_available",
            Self::AlreadyBorrowed => "already_borrowed",
            Self::NotBorrowed => "not_borrowed",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InsufficientFunds => "insufficient_funds",
            Self::InvalidDuration(_) => "invalid_duration",
            Self::Forbidden(_) => "forbidden",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        assert_eq!(
            LendingError::not_found("item 42").to_string(),
            "not found: item 42"
        );
        assert_eq!(
            LendingError::InvalidDuration(31).to_string(),
            "invalid duration: 31 days"
        );
    }

    #[test]
    fn kind_is_stable() {
        assert_eq!(LendingError::InsufficientFunds.kind(), "insufficient_funds");
        assert_eq!(LendingError::invalid_spec("x").kind(), "invalid_spec");
    }
}
