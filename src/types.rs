use std::collections::{btree_map, BTreeMap};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::InputError;

/// An amount of money in minor currency units (e.g. cents).
pub type Amount = i64;

/// Net balance of every participant. Positive means the participant is owed money.
pub type Balances = BTreeMap<ParticipantId, Amount>;

const EXTERNAL_PREFIX: &str = "ext:";

/// Identity of someone who can owe or be owed money.
///
/// Account participants are registered (or guest) users with a numeric id.
/// External participants have no account and are only known inside one group.
/// The derived ordering puts accounts before externals and is used as the
/// tie-break when balances are equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParticipantId {
    Account(u64),
    External(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
}

/// The participants taking part in one computation, indexed by id.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    participants: BTreeMap<ParticipantId, Participant>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Expense {
    pub amount: Amount,
    pub paid_by: ParticipantId,
    pub split_with: Vec<ParticipantId>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// A settlement instruction: `from` pays `amount` to `to`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Amount,
}

impl ParticipantId {
    pub fn external(name: &str) -> ParticipantId {
        ParticipantId::External(name.to_string())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParticipantId::Account(id) => write!(f, "{id}"),
            ParticipantId::External(name) => write!(f, "{EXTERNAL_PREFIX}{name}"),
        }
    }
}

impl FromStr for ParticipantId {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix(EXTERNAL_PREFIX) {
            if is_valid_external_name(name) {
                return Ok(ParticipantId::external(name));
            }
        } else if let Ok(id) = s.parse::<u64>() {
            return Ok(ParticipantId::Account(id));
        }
        Err(InputError::invalid_participant_id(s.to_string()))
    }
}

/// External names must be alphanumeric (underscores allowed) and start with a letter.
fn is_valid_external_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

impl Participant {
    pub fn new(id: ParticipantId, display_name: &str) -> Participant {
        Participant {
            id,
            display_name: display_name.to_string(),
        }
    }

    pub fn new_account(id: u64, display_name: &str) -> Participant {
        Participant::new(ParticipantId::Account(id), display_name)
    }

    pub fn new_external(name: &str, display_name: &str) -> Participant {
        Participant::new(ParticipantId::external(name), display_name)
    }
}

impl Roster {
    pub fn new() -> Roster {
        Roster::default()
    }

    /// Build a roster, rejecting ids that appear more than once.
    pub fn from_participants<I>(participants: I) -> Result<Roster, InputError>
    where
        I: IntoIterator<Item = Participant>,
    {
        let mut roster = Roster::new();
        for participant in participants {
            roster.add(participant)?;
        }
        Ok(roster)
    }

    pub fn add(&mut self, participant: Participant) -> Result<(), InputError> {
        match self.participants.entry(participant.id.clone()) {
            btree_map::Entry::Occupied(_) => {
                Err(InputError::duplicate_participant(participant.id.to_string()))
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(participant);
                Ok(())
            }
        }
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Display name of the participant, falling back to the textual id.
    pub fn display_name(&self, id: &ParticipantId) -> String {
        self.get(id)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Iterate participants in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ParticipantId> {
        self.participants.keys()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl Expense {
    pub fn new(amount: Amount, paid_by: ParticipantId, split_with: Vec<ParticipantId>) -> Expense {
        Expense {
            amount,
            paid_by,
            split_with,
            category: None,
            date: None,
            description: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Expense {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Expense {
        self.date = Some(date);
        self
    }

    pub fn with_description(mut self, description: &str) -> Expense {
        self.description = Some(description.to_string());
        self
    }
}

impl Transfer {
    pub fn new(from: &ParticipantId, to: &ParticipantId, amount: Amount) -> Transfer {
        Transfer {
            from: from.clone(),
            to: to.clone(),
            amount,
        }
    }
}
