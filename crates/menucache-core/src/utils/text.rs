//! Name collation and matching.
//!
//! Names sort the way people expect a menu to read: case and accents are
//! ignored at first, runs of digits compare by value ("Item 2" before
//! "Item 10"), and only exact ties fall back to accents, then case, then
//! raw code points.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Precomputed sort key for a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollationKey {
    folded: Vec<char>,
    lowered: String,
    upper_mask: Vec<bool>,
    raw: String,
}

impl CollationKey {
    pub fn new(name: &str) -> Self {
        Self {
            folded: fold(name),
            lowered: name.to_lowercase(),
            upper_mask: name.chars().map(char::is_uppercase).collect(),
            raw: name.to_string(),
        }
    }
}

impl Ord for CollationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.folded, &other.folded)
            .then_with(|| self.lowered.cmp(&other.lowered))
            // lowercase before uppercase
            .then_with(|| self.upper_mask.cmp(&other.upper_mask))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for CollationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Locale-aware comparison of two names.
pub fn cmp_names(a: &str, b: &str) -> Ordering {
    CollationKey::new(a).cmp(&CollationKey::new(b))
}

/// Case-insensitive substring test.
/// `needle` must already be lowercased.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(needle)
}

/// Strip accents and case: NFD, drop combining marks, lowercase.
fn fold(s: &str) -> Vec<char> {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn trim_leading_zeros(digits: &[char]) -> &[char] {
    let first = digits.iter().position(|&c| c != '0').unwrap_or(digits.len());
    &digits[first..]
}

fn natural_cmp(a: &[char], b: &[char]) -> Ordering {
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let start_a = i;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            let start_b = j;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }

            let num_a = trim_leading_zeros(&a[start_a..i]);
            let num_b = trim_leading_zeros(&b[start_b..j]);
            let ord = num_a.len().cmp(&num_b.len()).then_with(|| num_a.cmp(num_b));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        v.sort_by_cached_key(|s| CollationKey::new(s));
        v
    }

    #[test]
    fn test_case_does_not_dominate() {
        // Byte order would put "Zucchini" before "apple"
        assert_eq!(sorted(&["Zucchini", "apple", "Banana"]), vec!["apple", "Banana", "Zucchini"]);
    }

    #[test]
    fn test_diacritics_sort_with_base_letter() {
        assert_eq!(
            sorted(&["Zeppole", "Éclair", "Eggplant", "Creme"]),
            vec!["Creme", "Éclair", "Eggplant", "Zeppole"]
        );
    }

    #[test]
    fn test_accent_breaks_tie() {
        assert_eq!(cmp_names("resume", "résumé"), Ordering::Less);
        assert_eq!(cmp_names("résumé", "resume"), Ordering::Greater);
    }

    #[test]
    fn test_natural_numbers() {
        assert_eq!(sorted(&["Combo 10", "Combo 2", "Combo 1"]), vec!["Combo 1", "Combo 2", "Combo 10"]);
        assert_eq!(cmp_names("Combo 02", "Combo 2"), Ordering::Less);
    }

    #[test]
    fn test_lowercase_before_uppercase_on_tie() {
        assert_eq!(cmp_names("pasta", "Pasta"), Ordering::Less);
        assert_eq!(cmp_names("Pasta", "Pasta"), Ordering::Equal);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(cmp_names("Lemon", "Lemon Dessert"), Ordering::Less);
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Greek Salad", "greek"));
        assert!(contains_ignore_case("GREEK SALAD", "k sal"));
        assert!(contains_ignore_case("Crème Brûlée", "brûl"));
        assert!(!contains_ignore_case("Bruschetta", "greek"));
        assert!(contains_ignore_case("anything", ""));
    }
}
