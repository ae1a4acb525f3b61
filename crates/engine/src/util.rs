//! Internal helpers for model validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation logic so create and update paths enforce the same invariants.

use std::{collections::HashSet, hash::Hash};

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

pub(crate) const MAX_NAME_LEN: usize = 200;
pub(crate) const MIN_COOKING_TIME: i32 = 1;
pub(crate) const MIN_AMOUNT: i32 = 1;
pub(crate) const MAX_AMOUNT: i32 = i16::MAX as i32;

/// Trim `value` and reject it when empty or longer than `max_len` chars.
pub(crate) fn normalize_required_text(
    value: &str,
    field: &str,
    max_len: Option<usize>,
) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::validation(field, "must not be empty"));
    }
    if let Some(max_len) = max_len
        && trimmed.chars().count() > max_len
    {
        return Err(EngineError::validation(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_cooking_time(value: i32) -> ResultEngine<()> {
    if value < MIN_COOKING_TIME {
        return Err(EngineError::validation(
            "cooking_time",
            format!("cooking time must be at least {MIN_COOKING_TIME} minute"),
        ));
    }
    Ok(())
}

/// Validate an ingredient amount and narrow it to the column type.
pub(crate) fn validate_amount(value: i32) -> ResultEngine<i16> {
    if value < MIN_AMOUNT {
        return Err(EngineError::validation(
            "amount",
            format!("amount must be at least {MIN_AMOUNT}"),
        ));
    }
    if value > MAX_AMOUNT {
        return Err(EngineError::validation(
            "amount",
            format!("amount must be at most {MAX_AMOUNT}"),
        ));
    }
    i16::try_from(value).map_err(|_| EngineError::validation("amount", "amount out of range"))
}

/// Reject the first repeated item.
pub(crate) fn ensure_unique<T, I>(items: I, field: &str, message: &str) -> ResultEngine<()>
where
    T: Eq + Hash,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item) {
            return Err(EngineError::validation(field, message));
        }
    }
    Ok(())
}

/// `#RRGGBB`, stored uppercase.
pub(crate) fn normalize_color(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let valid = trimmed.len() == 7
        && trimmed.starts_with('#')
        && trimmed[1..].chars().all(|ch| ch.is_ascii_hexdigit());
    if !valid {
        return Err(EngineError::validation(
            "color",
            "color must be a hex value like #E26C2D",
        ));
    }
    Ok(trimmed.to_ascii_uppercase())
}

pub(crate) fn normalize_slug(value: &str) -> ResultEngine<String> {
    let slug = normalize_required_text(value, "slug", Some(MAX_NAME_LEN))?;
    if !slug
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(EngineError::validation(
            "slug",
            "slug may contain only letters, digits, hyphens and underscores",
        ));
    }
    Ok(slug)
}

/// Search key: NFKD, combining marks dropped, lowercase alphanumerics with
/// single spaces between words.
pub(crate) fn normalize_key(input: &str) -> String {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    out.trim_end().to_string()
}
