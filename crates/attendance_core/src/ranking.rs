//! Canonical personnel ordering.
//!
//! # Responsibility
//! - Order personnel for every listing and report.
//!
//! # Invariants
//! - Category rank is RSI < ARSI < HC < PC < anything unrecognized.
//! - Within a category, `employee_id` compares digit runs numerically and
//!   text case-insensitively, so `PC 9` precedes `PC 10`.
//! - The comparator is total; equal keys fall back to byte order.
//! - Input slices are never mutated.

use crate::model::personnel::{Category, Personnel};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

/// Rank assigned to categories outside the known table.
pub const UNRANKED_CATEGORY: u8 = 99;

static CODE_CHUNK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+|\D+").expect("valid code chunk regex"));

/// Returns the display rank of a category.
pub fn category_rank(category: &Category) -> u8 {
    match category {
        Category::Rsi => 1,
        Category::Arsi => 2,
        Category::Hc => 3,
        Category::Pc => 4,
        Category::Unrecognized(_) => UNRANKED_CATEGORY,
    }
}

/// Returns a newly allocated, ranked copy of `personnel`.
pub fn rank_personnel(personnel: &[Personnel]) -> Vec<Personnel> {
    let mut ranked = personnel.to_vec();
    ranked.sort_by(compare_personnel);
    ranked
}

/// Canonical comparator used by [`rank_personnel`].
pub fn compare_personnel(a: &Personnel, b: &Personnel) -> Ordering {
    category_rank(&a.category)
        .cmp(&category_rank(&b.category))
        .then_with(|| compare_employee_codes(&a.employee_id, &b.employee_id))
}

/// Natural comparison of human-visible codes.
pub fn compare_employee_codes(a: &str, b: &str) -> Ordering {
    let mut left = CODE_CHUNK_RE.find_iter(a).map(|m| m.as_str());
    let mut right = CODE_CHUNK_RE.find_iter(b).map(|m| m.as_str());

    loop {
        match (left.next(), right.next()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = compare_chunks(x, y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }

    // "PC 01" and "PC 1" tie numerically; keep the order total anyway.
    a.cmp(b)
}

fn compare_chunks(x: &str, y: &str) -> Ordering {
    let x_digits = x.bytes().all(|byte| byte.is_ascii_digit());
    let y_digits = y.bytes().all(|byte| byte.is_ascii_digit());
    if x_digits && y_digits {
        return compare_digit_runs(x, y);
    }
    x.to_lowercase().cmp(&y.to_lowercase())
}

fn compare_digit_runs(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

#[cfg(test)]
mod tests {
    use super::{category_rank, compare_employee_codes, rank_personnel, UNRANKED_CATEGORY};
    use crate::model::personnel::{Category, Personnel};
    use std::cmp::Ordering;
    use uuid::Uuid;

    fn person(code: &str, category: Category) -> Personnel {
        Personnel {
            id: Uuid::new_v4(),
            employee_id: code.to_string(),
            name: format!("name of {code}"),
            category,
            sub_category: None,
            is_active: true,
        }
    }

    fn codes(items: &[Personnel]) -> Vec<&str> {
        items.iter().map(|p| p.employee_id.as_str()).collect()
    }

    #[test]
    fn digit_runs_compare_numerically() {
        assert_eq!(compare_employee_codes("PC 9", "PC 10"), Ordering::Less);
        assert_eq!(compare_employee_codes("HC 2", "HC 10"), Ordering::Less);
        assert_eq!(compare_employee_codes("HC 100", "HC 20"), Ordering::Greater);
        assert_eq!(compare_employee_codes("A2B10", "A2B9"), Ordering::Greater);
    }

    #[test]
    fn text_compares_case_insensitively_and_stays_total() {
        assert_eq!(compare_employee_codes("pc 1", "PC 2"), Ordering::Less);
        assert_ne!(compare_employee_codes("PC 01", "PC 1"), Ordering::Equal);
        assert_eq!(compare_employee_codes("PC 1", "PC 1"), Ordering::Equal);
        assert_eq!(compare_employee_codes("PC", "PC 1"), Ordering::Less);
    }

    #[test]
    fn unknown_categories_rank_last() {
        assert_eq!(
            category_rank(&Category::Unrecognized("SI".into())),
            UNRANKED_CATEGORY
        );
        let input = vec![
            person("SI 1", Category::Unrecognized("SI".into())),
            person("PC 1", Category::Pc),
            person("RSI 1", Category::Rsi),
        ];
        assert_eq!(codes(&rank_personnel(&input)), ["RSI 1", "PC 1", "SI 1"]);
    }

    #[test]
    fn ranking_is_repeatable_and_leaves_input_untouched() {
        let input = vec![
            person("PC 10", Category::Pc),
            person("PC 9", Category::Pc),
            person("HC 1", Category::Hc),
            person("ARSI 3", Category::Arsi),
            person("RSI 1", Category::Rsi),
        ];
        let snapshot = input.clone();

        let once = rank_personnel(&input);
        let twice = rank_personnel(&once);

        assert_eq!(input, snapshot);
        assert_eq!(once, twice);
        assert_eq!(codes(&once), ["RSI 1", "ARSI 3", "HC 1", "PC 9", "PC 10"]);
    }
}
