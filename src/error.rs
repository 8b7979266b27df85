use thiserror::Error;

use crate::types::{Amount, ParticipantId};

/// An expense refers to participants that cannot be resolved against the roster.
///
/// The caller has to fix the input (e.g. register the external member) and
/// run the whole computation again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferentialError {
    #[error("expense #{expense} references `{participant}`, which is not a group participant")]
    UnknownParticipant {
        expense: usize,
        participant: ParticipantId,
    },

    #[error("expense #{expense} is not split with anybody")]
    EmptySplit { expense: usize },

    #[error("expense #{expense} lists `{participant}` more than once among the people it is split with")]
    DuplicateSplitMember {
        expense: usize,
        participant: ParticipantId,
    },
}

/// Balances that cannot be settled. This is always a bug upstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnbalancedLedgerError {
    #[error("balances sum to {sum} minor units instead of zero")]
    NonZeroSum { sum: i128 },

    #[error("ran out of counterparts while `{participant}` still has {remaining} minor units to settle")]
    Exhausted {
        participant: ParticipantId,
        remaining: Amount,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Referential(#[from] ReferentialError),

    #[error(transparent)]
    Unbalanced(#[from] UnbalancedLedgerError),

    #[error("expense #{expense} makes a total exceed the largest representable amount")]
    Overflow { expense: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("line {line}: invalid syntax ({reason}); example of a valid expense: 1 12.50 1 2 ext:carol #food @2024-05-01 - dinner")]
    InvalidSyntax { line: usize, reason: String },

    #[error(
        "invalid participant id `{0}`: use a number for account participants or \
             `ext:name` for external ones (name must start with a letter)"
    )]
    InvalidParticipantId(String),

    #[error("participant `{0}` is registered more than once")]
    DuplicateParticipant(String),

    #[error("line {line}: invalid amount `{amount}`: expected a positive amount")]
    InvalidAmount { line: usize, amount: String },

    #[error("line {line}: invalid date `{date}`: expected YYYY-MM-DD")]
    InvalidDate { line: usize, date: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {variable}: {reason}")]
    InvalidValue {
        variable: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl InputError {
    // TODO: nom errors only carry the error kind; report the offending token too.
    pub fn invalid_syntax(line: usize, e: nom::Err<nom::error::Error<&str>>) -> Self {
        InputError::InvalidSyntax {
            line,
            reason: e.to_string(),
        }
    }

    pub fn invalid_participant_id(id: String) -> Self {
        InputError::InvalidParticipantId(id)
    }

    pub fn duplicate_participant(id: String) -> Self {
        InputError::DuplicateParticipant(id)
    }

    pub fn invalid_amount(line: usize, amount: String) -> Self {
        InputError::InvalidAmount { line, amount }
    }

    pub fn invalid_date(line: usize, date: String) -> Self {
        InputError::InvalidDate { line, date }
    }
}

impl ConfigError {
    pub fn invalid_value(variable: &'static str, value: String, reason: &'static str) -> Self {
        ConfigError::InvalidValue {
            variable,
            value,
            reason,
        }
    }
}
