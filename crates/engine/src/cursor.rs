//! Keyset cursor pagination.
//!
//! A cursor is the URL-safe base64 (no padding) encoding of
//! `{"v": <sort column value>, "id": <row id>}` taken from the last row of the
//! previous page. The id breaks ties, so rows sharing a sort value are never
//! skipped or repeated while other rows are inserted concurrently.
//!
//! Each list declares a `cursor_list` of allowed cursor types (`-date`,
//! `date`, `-id`, ...). A leading `-` means descending.

use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{ColumnTrait, Condition, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    pagination::{Direction, resolve_sort_token, split_sort_token, validate_page_size},
};

/// Cursor parameters as received from the client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CursorRequest {
    pub cursor: Option<String>,
    pub cursor_type: Option<String>,
    pub page_size: Option<u64>,
}

/// Decoded cursor position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorKey {
    #[serde(rename = "v")]
    pub value: String,
    pub id: String,
}

fn invalid_cursor() -> EngineError {
    EngineError::Validation("invalid cursor".to_string())
}

impl CursorKey {
    pub fn from_timestamp(at: DateTime<Utc>, id: Uuid) -> Self {
        Self {
            value: at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            id: id.to_string(),
        }
    }

    pub fn from_id(id: Uuid) -> Self {
        Self {
            value: id.to_string(),
            id: id.to_string(),
        }
    }

    pub fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self).map_err(|_| invalid_cursor())?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| invalid_cursor())?;
        serde_json::from_slice::<Self>(&bytes).map_err(|_| invalid_cursor())
    }

    /// The sort value read back as a timestamp column.
    pub(crate) fn timestamp(&self) -> ResultEngine<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.value)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|_| invalid_cursor())
    }
}

/// Rows that can produce their own cursor position for a given sort column.
pub trait CursorRow {
    fn cursor_key(&self, column: &str) -> CursorKey;
}

/// `column op v OR (column = v AND id op id)`.
pub(crate) fn keyset_condition<C, V>(
    column: C,
    id_column: C,
    value: V,
    id: String,
    direction: Direction,
) -> Condition
where
    C: ColumnTrait,
    V: Into<Value> + Clone,
{
    match direction {
        Direction::Desc => Condition::any().add(column.lt(value.clone())).add(
            Condition::all()
                .add(column.eq(value))
                .add(id_column.lt(id)),
        ),
        Direction::Asc => Condition::any().add(column.gt(value.clone())).add(
            Condition::all()
                .add(column.eq(value))
                .add(id_column.gt(id)),
        ),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
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

impl CursorMeta {
    /// Fill `next_page`/`reverse_page` from the request URL, replacing its
    /// `cursor`, `cursor_type` and `page_size` parameters.
    pub fn with_links(mut self, request_url: &str) -> Self {
        self.next_page = self
            .next_cursor
            .as_deref()
            .map(|cursor| page_link(request_url, cursor, &self.cursor_type, self.page_size));
        self.reverse_page = match (&self.reverse_cursor, &self.reverse_cursor_type) {
            (Some(cursor), Some(cursor_type)) => Some(page_link(
                request_url,
                cursor,
                cursor_type,
                self.page_size,
            )),
            _ => None,
        };
        self
    }
}

fn page_link(request_url: &str, cursor: &str, cursor_type: &str, page_size: u64) -> String {
    let (path, query) = request_url
        .split_once('?')
        .unwrap_or((request_url, ""));
    let mut params: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
            !matches!(key, "cursor" | "cursor_type" | "page_size")
        })
        .map(ToString::to_string)
        .collect();
    params.push(format!("cursor={cursor}"));
    params.push(format!("cursor_type={cursor_type}"));
    params.push(format!("page_size={page_size}"));
    format!("{path}?{}", params.join("&"))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub meta: CursorMeta,
}

impl<T> CursorPage<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// A validated cursor request bound to one list's `cursor_list`.
#[derive(Clone, Debug)]
pub(crate) struct CursorPagination {
    cursor_list: &'static [&'static str],
    cursor_type: &'static str,
    raw_cursor: String,
    after: Option<CursorKey>,
    page_size: u64,
}

impl CursorPagination {
    pub(crate) fn new(
        cursor_list: &'static [&'static str],
        request: &CursorRequest,
    ) -> ResultEngine<Self> {
        let cursor_type =
            resolve_sort_token(cursor_list, request.cursor_type.as_deref(), "cursor_type")?;
        let page_size = validate_page_size(request.page_size)?;
        let raw_cursor = request
            .cursor
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let after = if raw_cursor.is_empty() {
            None
        } else {
            Some(CursorKey::decode(&raw_cursor)?)
        };
        Ok(Self {
            cursor_list,
            cursor_type,
            raw_cursor,
            after,
            page_size,
        })
    }

    pub(crate) fn column(&self) -> &'static str {
        split_sort_token(self.cursor_type).0
    }

    pub(crate) fn direction(&self) -> Direction {
        split_sort_token(self.cursor_type).1
    }

    pub(crate) fn after(&self) -> Option<&CursorKey> {
        self.after.as_ref()
    }

    /// One extra row tells whether a next page exists.
    pub(crate) fn fetch_limit(&self) -> u64 {
        self.page_size.saturating_add(1)
    }

    fn reverse_cursor_type(&self) -> Option<&'static str> {
        let flipped = match self.cursor_type.strip_prefix('-') {
            Some(column) => column.to_string(),
            None => format!("-{}", self.cursor_type),
        };
        self.cursor_list.iter().copied().find(|t| *t == flipped)
    }

    pub(crate) fn finish<T: CursorRow>(&self, mut rows: Vec<T>) -> ResultEngine<CursorPage<T>> {
        let page_size = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);

        let column = self.column();
        let next_cursor = match rows.last() {
            Some(row) if has_more => Some(row.cursor_key(column).encode()?),
            _ => None,
        };

        let (reverse_cursor, reverse_cursor_type) = match (
            self.after.is_some(),
            rows.first(),
            self.reverse_cursor_type(),
        ) {
            (true, Some(row), Some(reverse_type)) => (
                Some(row.cursor_key(column).encode()?),
                Some(reverse_type.to_string()),
            ),
            _ => (None, None),
        };

        Ok(CursorPage {
            items: rows,
            meta: CursorMeta {
                current_cursor: self.raw_cursor.clone(),
                cursor_type: self.cursor_type.to_string(),
                page_size: self.page_size,
                next_cursor,
                next_page: None,
                reverse_cursor,
                reverse_cursor_type,
                reverse_page: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const LIST: &[&str] = &["-date", "date", "-id", "id"];

    #[derive(Debug)]
    struct Row {
        id: Uuid,
        date: DateTime<Utc>,
    }

    impl CursorRow for Row {
        fn cursor_key(&self, column: &str) -> CursorKey {
            match column {
                "date" => CursorKey::from_timestamp(self.date, self.id),
                _ => CursorKey::from_id(self.id),
            }
        }
    }

    fn rows(n: u128) -> Vec<Row> {
        (1..=n)
            .map(|i| Row {
                id: Uuid::from_u128(i),
                date: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
            })
            .collect()
    }

    #[test]
    fn defaults_to_first_cursor_type_descending() {
        let page = CursorPagination::new(LIST, &CursorRequest::default()).unwrap();
        assert_eq!(page.column(), "date");
        assert_eq!(page.direction(), Direction::Desc);
        assert_eq!(page.fetch_limit(), 51);
        assert!(page.after().is_none());
    }

    #[test]
    fn rejects_unknown_cursor_type_and_bad_page_size() {
        let bad_type = CursorRequest {
            cursor_type: Some("price".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            CursorPagination::new(LIST, &bad_type),
            Err(EngineError::Validation(_))
        ));
        let bad_size = CursorRequest {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(CursorPagination::new(LIST, &bad_size).is_err());
    }

    #[test]
    fn garbage_cursor_is_a_validation_error() {
        let req = CursorRequest {
            cursor: Some("not base64 at all!".to_string()),
            ..Default::default()
        };
        assert_eq!(
            CursorPagination::new(LIST, &req).unwrap_err(),
            EngineError::Validation("invalid cursor".to_string())
        );
        let not_a_date = CursorKey {
            value: "yesterday".to_string(),
            id: "x".to_string(),
        };
        assert!(not_a_date.timestamp().is_err());
    }

    #[test]
    fn timestamp_survives_the_cursor_encoding() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let key = CursorKey::from_timestamp(at, Uuid::nil());
        let decoded = CursorKey::decode(&key.encode().unwrap()).unwrap();
        assert_eq!(decoded.timestamp().unwrap(), at);
    }

    #[test]
    fn first_page_has_next_but_no_reverse() {
        let req = CursorRequest {
            page_size: Some(2),
            ..Default::default()
        };
        let page = CursorPagination::new(LIST, &req)
            .unwrap()
            .finish(rows(3))
            .unwrap();
        assert_eq!(page.items.len(), 2);
        let next = CursorKey::decode(page.meta.next_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(next.id, Uuid::from_u128(2).to_string());
        assert_eq!(page.meta.reverse_cursor, None);
        assert_eq!(page.meta.current_cursor, "");
    }

    #[test]
    fn later_page_reverses_from_first_row_with_flipped_type() {
        let cursor = CursorKey::from_id(Uuid::from_u128(9)).encode().unwrap();
        let req = CursorRequest {
            cursor: Some(cursor.clone()),
            cursor_type: Some("-id".to_string()),
            page_size: Some(2),
        };
        let page = CursorPagination::new(LIST, &req)
            .unwrap()
            .finish(rows(2))
            .unwrap();
        assert_eq!(page.meta.next_cursor, None);
        assert_eq!(page.meta.reverse_cursor_type.as_deref(), Some("id"));
        let reverse = CursorKey::decode(page.meta.reverse_cursor.as_deref().unwrap()).unwrap();
        assert_eq!(reverse.id, Uuid::from_u128(1).to_string());
        assert_eq!(page.meta.current_cursor, cursor);
    }

    #[test]
    fn links_keep_other_query_parameters() {
        let meta = CursorMeta {
            current_cursor: String::new(),
            cursor_type: "-date".to_string(),
            page_size: 2,
            next_cursor: Some("abc".to_string()),
            next_page: None,
            reverse_cursor: None,
            reverse_cursor_type: None,
            reverse_page: None,
        }
        .with_links("/spends/cursor?pocket_id=p1&cursor=old&page_size=9");
        assert_eq!(
            meta.next_page.as_deref(),
            Some("/spends/cursor?pocket_id=p1&cursor=abc&cursor_type=-date&page_size=2")
        );
        assert_eq!(meta.reverse_page, None);
    }
}
