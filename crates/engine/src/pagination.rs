//! Classic page/offset pagination and the sort-token grammar shared with the
//! cursor codec.
//!
//! A sort token is a column name, optionally prefixed with `-` for descending
//! order (`date`, `-date`). Every list operation declares a safelist of
//! tokens; the first one is the default.

use sea_orm::Order;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub(crate) fn order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

/// Split a safelisted token into `(column, direction)`.
pub(crate) fn split_sort_token(token: &'static str) -> (&'static str, Direction) {
    match token.strip_prefix('-') {
        Some(column) => (column, Direction::Desc),
        None => (token, Direction::Asc),
    }
}

/// Resolve a requested token against the safelist, falling back to its head.
pub(crate) fn resolve_sort_token(
    safelist: &'static [&'static str],
    requested: Option<&str>,
    label: &str,
) -> ResultEngine<&'static str> {
    let default = safelist
        .first()
        .copied()
        .ok_or_else(|| EngineError::Validation(format!("no {label} available")))?;
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(requested) => safelist
            .iter()
            .copied()
            .find(|token| *token == requested)
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "invalid {label} '{requested}', expected one of: {}",
                    safelist.join(", ")
                ))
            }),
    }
}

pub(crate) fn validate_page_size(page_size: Option<u64>) -> ResultEngine<u64> {
    let size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err(EngineError::Validation(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(size)
}

/// `page`/`page_size`/`sort` as received from the client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub sort: Option<String>,
}

/// A validated [`PageRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PageSpec {
    pub(crate) page: u64,
    pub(crate) page_size: u64,
    offset: u64,
    pub(crate) column: &'static str,
    pub(crate) direction: Direction,
}

impl PageSpec {
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }
}

impl PageRequest {
    pub(crate) fn resolve(&self, sort_list: &'static [&'static str]) -> ResultEngine<PageSpec> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(EngineError::Validation("page must be >= 1".to_string()));
        }
        let page_size = validate_page_size(self.page_size)?;
        // SQLite binds OFFSET as a signed 64-bit integer.
        let offset = (page - 1)
            .checked_mul(page_size)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| EngineError::Validation("page is out of range".to_string()))?;
        let token = resolve_sort_token(sort_list, self.sort.as_deref(), "sort")?;
        let (column, direction) = split_sort_token(token);
        Ok(PageSpec {
            page,
            page_size,
            offset,
            column,
            direction,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, spec: &PageSpec, total: u64) -> Self {
        Self {
            items,
            page: spec.page,
            page_size: spec.page_size,
            total,
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1))
    }
}
