//! Search query assembly
//!
//! The platform's advanced search is driven through the same text box a
//! human would use, so the engine assembles one query string from the
//! requested keywords, author handles and date bounds.

use chrono::NaiveDate;

/// Operator excluding reply posts from search results
const REPLY_FILTER: &str = "-filter:replies";

/// Normalizes a caller-supplied date bound
///
/// Accepts `yyyy-mm-dd` or `dd-mm-yyyy`, ignoring any trailing time
/// portion. Returns `None` when the text does not parse as either form.
pub fn parse_date_bound(text: &str) -> Option<NaiveDate> {
    let token = text.trim().split_whitespace().next()?;

    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(token, "%d-%m-%Y"))
        .ok()
}

/// Assembles the search query submitted before pagination begins
///
/// Usernames become a `from:` union; when keywords are also present both
/// groups are parenthesized. Replies are always filtered out, and date
/// bounds are appended as `since:`/`until:` operators.
pub fn build_search_query(
    keywords: Option<&str>,
    usernames: &[String],
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
) -> String {
    let keywords = keywords.unwrap_or("").trim();

    let mut query = if usernames.is_empty() {
        keywords.to_string()
    } else {
        let user_part = usernames
            .iter()
            .map(|u| format!("from:{}", u.trim_start_matches('@')))
            .collect::<Vec<_>>()
            .join(" OR ");

        if keywords.is_empty() {
            user_part
        } else {
            format!("({}) ({})", keywords, user_part)
        }
    };

    if query.is_empty() {
        query = REPLY_FILTER.to_string();
    } else {
        query.push(' ');
        query.push_str(REPLY_FILTER);
    }

    if let Some(date) = from_date {
        query.push_str(&format!(" since:{}", date.format("%Y-%m-%d")));
    }

    if let Some(date) = to_date {
        query.push_str(&format!(" until:{}", date.format("%Y-%m-%d")));
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_only() {
        let query = build_search_query(Some("road closure"), &[], None, None);
        assert_eq!(query, "road closure -filter:replies");
    }

    #[test]
    fn test_usernames_only() {
        let users = vec!["alice".to_string(), "@bob".to_string()];
        let query = build_search_query(None, &users, None, None);
        assert_eq!(query, "from:alice OR from:bob -filter:replies");
    }

    #[test]
    fn test_keywords_and_usernames_are_grouped() {
        let users = vec!["alice".to_string()];
        let query = build_search_query(Some("flooding"), &users, None, None);
        assert_eq!(query, "(flooding) (from:alice) -filter:replies");
    }

    #[test]
    fn test_date_bounds_appended() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        let query = build_search_query(Some("storm"), &[], Some(from), Some(to));
        assert_eq!(
            query,
            "storm -filter:replies since:2024-01-15 until:2024-02-01"
        );
    }

    #[test]
    fn test_empty_input_still_filters_replies() {
        let query = build_search_query(None, &[], None, None);
        assert_eq!(query, "-filter:replies");
    }

    #[test]
    fn test_parse_date_bound_iso() {
        assert_eq!(
            parse_date_bound("2024-03-09"),
            NaiveDate::from_ymd_opt(2024, 3, 9)
        );
    }

    #[test]
    fn test_parse_date_bound_day_first() {
        assert_eq!(
            parse_date_bound("09-03-2024"),
            NaiveDate::from_ymd_opt(2024, 3, 9)
        );
    }

    #[test]
    fn test_parse_date_bound_drops_time_portion() {
        assert_eq!(
            parse_date_bound("2024-03-09 18:30:00"),
            NaiveDate::from_ymd_opt(2024, 3, 9)
        );
    }

    #[test]
    fn test_parse_date_bound_rejects_garbage() {
        assert_eq!(parse_date_bound("soon"), None);
        assert_eq!(parse_date_bound(""), None);
    }
}
