//! Command and filter structs for engine operations.
//!
//! These types group parameters for write operations and list filters,
//! keeping call sites readable and avoiding long argument lists.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, JoinRequestStatus, Pocket, Role, SpendType};

/// Create a pocket.
#[derive(Clone, Debug)]
pub struct NewPocket {
    pub name: String,
    pub currency: Currency,
    pub icon: Option<String>,
    pub editor_ids: BTreeSet<String>,
    pub watcher_ids: BTreeSet<String>,
}

impl NewPocket {
    #[must_use]
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        Self {
            name: name.into(),
            currency,
            icon: None,
            editor_ids: BTreeSet::new(),
            watcher_ids: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn editor(mut self, user_id: impl Into<String>) -> Self {
        self.editor_ids.insert(user_id.into());
        self
    }

    #[must_use]
    pub fn watcher(mut self, user_id: impl Into<String>) -> Self {
        self.watcher_ids.insert(user_id.into());
        self
    }
}

/// Partial pocket update. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct PocketPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub currency: Option<Currency>,
    /// Reject the edit unless the stored version still matches.
    pub expected_version: Option<i64>,
}

impl PocketPatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none() && self.icon.is_none() && self.currency.is_none()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn expected_version(mut self, version: i64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Create a spend in a pocket.
#[derive(Clone, Debug)]
pub struct NewSpend {
    pub pocket_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub price: i64,
    pub is_income: bool,
    pub spend_type: SpendType,
    pub date: DateTime<Utc>,
}

impl NewSpend {
    /// An expense of `price` minor units; see [`NewSpend::income`].
    #[must_use]
    pub fn new(pocket_id: Uuid, name: impl Into<String>, price: i64, date: DateTime<Utc>) -> Self {
        Self {
            pocket_id,
            category_id: None,
            name: name.into(),
            price,
            is_income: false,
            spend_type: SpendType::General,
            date,
        }
    }

    #[must_use]
    pub fn income(mut self) -> Self {
        self.is_income = true;
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn spend_type(mut self, spend_type: SpendType) -> Self {
        self.spend_type = spend_type;
        self
    }
}

/// Partial spend update. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct SpendPatch {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub is_income: Option<bool>,
    /// `Some(None)` detaches the category.
    pub category_id: Option<Option<Uuid>>,
    pub spend_type: Option<SpendType>,
    pub date: Option<DateTime<Utc>>,
    pub expected_version: Option<i64>,
}

impl SpendPatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.is_income.is_none()
            && self.category_id.is_none()
            && self.spend_type.is_none()
            && self.date.is_none()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn price(mut self, price: i64) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn is_income(mut self, is_income: bool) -> Self {
        self.is_income = Some(is_income);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Option<Uuid>) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn spend_type(mut self, spend_type: SpendType) -> Self {
        self.spend_type = Some(spend_type);
        self
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn expected_version(mut self, version: i64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Move money from one pocket to another as a linked expense/income pair.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_pocket_id: Uuid,
    pub to_pocket_id: Uuid,
    pub price: i64,
    pub date: DateTime<Utc>,
    pub name: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(from_pocket_id: Uuid, to_pocket_id: Uuid, price: i64, date: DateTime<Utc>) -> Self {
        Self {
            from_pocket_id,
            to_pocket_id,
            price,
            date,
            name: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewCategory {
    pub name: String,
    pub icon: Option<String>,
    pub is_income: bool,
    pub default_spend_type: Option<SpendType>,
}

impl NewCategory {
    #[must_use]
    pub fn new(name: impl Into<String>, is_income: bool) -> Self {
        Self {
            name: name.into(),
            icon: None,
            is_income,
            default_spend_type: None,
        }
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn default_spend_type(mut self, spend_type: SpendType) -> Self {
        self.default_spend_type = Some(spend_type);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    /// `Some(None)` clears the default.
    pub default_spend_type: Option<Option<SpendType>>,
}

impl CategoryPatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none() && self.icon.is_none() && self.default_spend_type.is_none()
    }
}

/// Filters for single-pocket spend lists.
///
/// `date_start` is inclusive and `date_end` exclusive, both in UTC.
#[derive(Clone, Debug)]
pub struct SpendFilter {
    pub pocket_id: Uuid,
    pub user_id: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_income: Option<bool>,
    pub spend_type: Option<SpendType>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    /// Case-insensitive substring.
    pub name: Option<String>,
}

impl SpendFilter {
    #[must_use]
    pub fn new(pocket_id: Uuid) -> Self {
        Self {
            pocket_id,
            user_id: None,
            category_id: None,
            is_income: None,
            spend_type: None,
            date_start: None,
            date_end: None,
            name: None,
        }
    }

    #[must_use]
    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.date_start = Some(start);
        self.date_end = Some(end);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Filters for spend search across pockets. Empty sets match everything.
#[derive(Clone, Debug, Default)]
pub struct MultiPocketSpendFilter {
    /// Empty means every pocket the caller belongs to.
    pub pocket_ids: Vec<Uuid>,
    pub user_ids: Vec<String>,
    pub category_ids: Vec<Uuid>,
    pub spend_types: Vec<SpendType>,
    pub is_income: Option<bool>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PocketFilter {
    /// Case-insensitive substring.
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct JoinRequestFilter {
    pub status: Option<JoinRequestStatus>,
}

/// A user id with its resolved display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub name: String,
}

/// A pocket as seen by one caller, with member names resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PocketDetail {
    pub pocket: Pocket,
    pub owner: Member,
    pub editors: Vec<Member>,
    pub watchers: Vec<Member>,
    pub role: Role,
}

/// Both legs of a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub outgoing: crate::Spend,
    pub incoming: crate::Spend,
}
