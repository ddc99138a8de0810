use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Idr,
    Usd,
    Eur,
    Gbp,
    Jpy,
    Sgd,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendType {
    #[default]
    General,
    Need,
    Want,
    Saving,
    Transfer,
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH bodies.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub mod page {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Page<T> {
        pub items: Vec<T>,
        pub page: u64,
        pub page_size: u64,
        pub total: u64,
        pub total_pages: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CursorMeta {
        pub current_cursor: String,
        pub cursor_type: String,
        pub page_size: u64,
        pub next_cursor: Option<String>,
        pub next_page: Option<String>,
        pub reverse_cursor: Option<String>,
        pub reverse_cursor_type: Option<String>,
        pub reverse_page: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CursorPage<T> {
        pub items: Vec<T>,
        pub meta: CursorMeta,
    }
}

pub mod pocket {
    use super::*;

    /// Role of the caller on a pocket.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Owner,
        Editor,
        Watcher,
        None,
    }

    /// Empty member lists default to the creator.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PocketNew {
        pub name: String,
        pub currency: Option<Currency>,
        pub icon: Option<String>,
        #[serde(default)]
        pub editor_ids: Vec<String>,
        #[serde(default)]
        pub watcher_ids: Vec<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PocketUpdate {
        pub name: Option<String>,
        pub icon: Option<String>,
        pub currency: Option<Currency>,
        /// Reject the update unless the pocket is still at this version.
        pub version: Option<i64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PocketListQuery {
        pub name: Option<String>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
        pub sort: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PocketCursorQuery {
        pub name: Option<String>,
        pub cursor: Option<String>,
        pub cursor_type: Option<String>,
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PocketView {
        pub id: Uuid,
        pub owner_id: String,
        pub editor_ids: Vec<String>,
        pub watcher_ids: Vec<String>,
        pub name: String,
        pub currency: Currency,
        pub icon: String,
        pub balance: i64,
        pub level: i32,
        pub version: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user_id: String,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PocketDetailView {
        pub pocket: PocketView,
        pub owner: MemberView,
        pub editors: Vec<MemberView>,
        pub watchers: Vec<MemberView>,
        pub role: Role,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberAdd {
        pub user_id: String,
        /// Add as watcher instead of editor.
        #[serde(default)]
        pub read_only: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub pocket_id: Uuid,
        pub balance: i64,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub icon: Option<String>,
        #[serde(default)]
        pub is_income: bool,
        pub default_spend_type: Option<SpendType>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub icon: Option<String>,
        /// `null` clears the default.
        #[serde(default, deserialize_with = "double_option")]
        pub default_spend_type: Option<Option<SpendType>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryListQuery {
        pub is_income: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub pocket_id: Uuid,
        pub name: String,
        pub icon: String,
        pub is_income: bool,
        pub default_spend_type: Option<SpendType>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod spend {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SpendNew {
        pub pocket_id: Uuid,
        pub category_id: Option<Uuid>,
        pub name: String,
        /// Non-negative amount in minor units; the sign comes from `is_income`.
        pub price: i64,
        #[serde(default)]
        pub is_income: bool,
        pub spend_type: Option<SpendType>,
        pub date: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SpendUpdate {
        pub name: Option<String>,
        pub price: Option<i64>,
        pub is_income: Option<bool>,
        /// `null` detaches the category.
        #[serde(default, deserialize_with = "double_option")]
        pub category_id: Option<Option<Uuid>>,
        pub spend_type: Option<SpendType>,
        pub date: Option<DateTime<Utc>>,
        pub version: Option<i64>,
    }

    /// Query for `GET /spends`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SpendListQuery {
        pub pocket_id: Uuid,
        pub user_id: Option<String>,
        pub category_id: Option<Uuid>,
        pub is_income: Option<bool>,
        pub spend_type: Option<SpendType>,
        pub date_start: Option<DateTime<Utc>>,
        pub date_end: Option<DateTime<Utc>>,
        pub name: Option<String>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
        pub sort: Option<String>,
    }

    /// Query for `GET /spends/cursor`. `date_range` (`last-7-days`,
    /// `2024-03`) overrides the explicit date bounds and is read in
    /// `time_zone` (default UTC).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SpendCursorQuery {
        pub pocket_id: Uuid,
        pub user_id: Option<String>,
        pub category_id: Option<Uuid>,
        pub is_income: Option<bool>,
        pub spend_type: Option<SpendType>,
        pub date_start: Option<DateTime<Utc>>,
        pub date_end: Option<DateTime<Utc>>,
        pub name: Option<String>,
        pub date_range: Option<String>,
        pub time_zone: Option<String>,
        pub cursor: Option<String>,
        pub cursor_type: Option<String>,
        pub page_size: Option<u64>,
    }

    /// Query for `GET /spends/search`. List parameters are comma separated.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SpendSearchQuery {
        pub pocket_ids: Option<String>,
        pub user_ids: Option<String>,
        pub category_ids: Option<String>,
        pub spend_types: Option<String>,
        pub is_income: Option<bool>,
        pub date_start: Option<DateTime<Utc>>,
        pub date_end: Option<DateTime<Utc>>,
        pub name: Option<String>,
        pub cursor: Option<String>,
        pub cursor_type: Option<String>,
        pub page_size: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SpendView {
        pub id: Uuid,
        pub user_id: String,
        pub pocket_id: Uuid,
        pub category_id: Option<Uuid>,
        pub name: String,
        pub price: i64,
        pub is_income: bool,
        pub spend_type: SpendType,
        pub date: DateTime<Utc>,
        pub balance_snapshot: i64,
        pub linked_spend_id: Option<Uuid>,
        pub version: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_pocket_id: Uuid,
        pub to_pocket_id: Uuid,
        pub price: i64,
        pub date: DateTime<Utc>,
        pub name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub outgoing: SpendView,
        pub incoming: SpendView,
    }
}

pub mod join_request {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum JoinRequestStatus {
        Pending,
        Approved,
        Rejected,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinRequestNew {
        pub pocket_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinRequestDecision {
        pub approve: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct JoinRequestListQuery {
        pub status: Option<JoinRequestStatus>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
        pub sort: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinRequestView {
        pub id: Uuid,
        pub requester_id: String,
        pub pocket_id: Uuid,
        pub pocket_name: String,
        pub approver_id: String,
        pub status: JoinRequestStatus,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_null_differs_from_missing() {
        let cleared: spend::SpendUpdate =
            serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(cleared.category_id, Some(None));

        let untouched: spend::SpendUpdate = serde_json::from_str(r#"{"name": "tea"}"#).unwrap();
        assert_eq!(untouched.category_id, None);
    }

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(serde_json::to_string(&Currency::Idr).unwrap(), "\"IDR\"");
        assert_eq!(
            serde_json::to_string(&SpendType::Saving).unwrap(),
            "\"saving\""
        );
    }
}
