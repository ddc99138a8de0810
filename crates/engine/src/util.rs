//! Internal helpers for model validation and conversion.

use sea_orm::sea_query::LikeExpr;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::Validation(format!("invalid {label} id")))
}

/// Trim a display name and reject it when nothing is left.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Spend names are stored case-normalized: NFKC, lowercase, inner runs of
/// whitespace collapsed.
pub(crate) fn normalize_spend_name(value: &str) -> ResultEngine<String> {
    let normalized: String = value.nfkc().collect::<String>().to_lowercase();
    let collapsed = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EngineError::Validation(
            "spend name must not be empty".to_string(),
        ));
    }
    Ok(collapsed)
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Largest accepted price, in minor units.
pub const MAX_PRICE: i64 = 1_000_000_000_000_000;

/// Prices are magnitudes; the sign lives in `is_income`.
pub(crate) fn validate_price(price: i64) -> ResultEngine<()> {
    if price < 0 {
        return Err(EngineError::Validation(
            "price must be >= 0".to_string(),
        ));
    }
    if price > MAX_PRICE {
        return Err(EngineError::Validation(format!(
            "price must be <= {MAX_PRICE}"
        )));
    }
    Ok(())
}

pub(crate) fn balance_out_of_range() -> EngineError {
    EngineError::Validation("pocket balance out of range".to_string())
}

const LIKE_ESCAPE: char = '!';

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

/// `LIKE` pattern matching `needle` literally anywhere in the value.
pub(crate) fn contains_pattern(needle: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(needle))).escape(LIKE_ESCAPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_names_are_case_normalized() {
        assert_eq!(normalize_spend_name("  Coffee   BEANS ").unwrap(), "coffee beans");
        assert_eq!(normalize_spend_name("Ｃａｆé").unwrap(), "café");
        assert!(normalize_spend_name("   ").is_err());
    }

    #[test]
    fn price_bounds_are_enforced() {
        assert!(validate_price(0).is_ok());
        assert_eq!(
            validate_price(-1),
            Err(EngineError::Validation("price must be >= 0".to_string()))
        );
        assert!(validate_price(MAX_PRICE).is_ok());
        assert!(validate_price(MAX_PRICE + 1).is_err());
        assert!(validate_price(i64::MAX).is_err());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("coffee"), "coffee");
        assert_eq!(escape_like("100%"), "100!%");
        assert_eq!(escape_like("a_b!"), "a!_b!!");
    }
}
