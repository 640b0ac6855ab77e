//! Extraction of the file list from a ranking reply.
//!
//! The collaborator is asked for a bare list such as `['a.csv', 'b.csv']` but
//! replies often wrap it in prose. The first bracketed span is taken and must
//! be a list of quoted strings.

use once_cell::sync::Lazy;
use regex::Regex;

// Shortest span from the first '[' to the next ']', across lines
static FIRST_BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*?\]").expect("Invalid regex: bracketed list"));

/// Extract the first bracketed list of quoted strings from `response`.
///
/// Returns `None` when there is no bracketed span, when it is not a list of
/// single- or double-quoted strings, or when the list is empty.
pub fn extract_file_list(response: &str) -> Option<Vec<String>> {
    let span = FIRST_BRACKETED.find(response)?.as_str();
    let inner = &span[1..span.len() - 1];

    parse_quoted_list(inner).filter(|names| !names.is_empty())
}

/// Parse `'a', "b", 'c'` (trailing comma allowed).
fn parse_quoted_list(inner: &str) -> Option<Vec<String>> {
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        skip_whitespace(&mut chars);
        let Some(quote) = chars.next() else {
            return Some(items);
        };
        if quote != '\'' && quote != '"' {
            return None;
        }

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);

        skip_whitespace(&mut chars);
        match chars.next() {
            None => return Some(items),
            Some(',') => continue,
            Some(_) => return None,
        }
    }
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(items: &[&str]) -> Option<Vec<String>> {
        Some(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_bare_list() {
        assert_eq!(
            extract_file_list("['sales.csv', 'orders.csv']"),
            names(&["sales.csv", "orders.csv"])
        );
    }

    #[test]
    fn test_list_inside_prose() {
        let response = "Sure! Here are the files:\n[\"customers.csv\",\n \"products.csv\"]\nHope this helps.";
        assert_eq!(
            extract_file_list(response),
            names(&["customers.csv", "products.csv"])
        );
    }

    #[test]
    fn test_trailing_comma_and_escapes() {
        assert_eq!(
            extract_file_list(r"['it\'s.csv', 'b.csv',]"),
            names(&["it's.csv", "b.csv"])
        );
    }

    #[test]
    fn test_no_list() {
        assert_eq!(extract_file_list("I think maybe..."), None);
    }

    #[test]
    fn test_empty_list_is_rejected() {
        assert_eq!(extract_file_list("[]"), None);
        assert_eq!(extract_file_list("[  ]"), None);
    }

    #[test]
    fn test_unquoted_items_are_rejected() {
        assert_eq!(extract_file_list("[sales.csv, orders.csv]"), None);
        assert_eq!(extract_file_list("[1, 2]"), None);
    }

    #[test]
    fn test_only_first_bracket_counts() {
        // The first span is not a list of strings, so the second is never tried.
        assert_eq!(extract_file_list("[see below] ['a.csv']"), None);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(extract_file_list("['a.csv, 'b.csv']"), None);
    }
}
