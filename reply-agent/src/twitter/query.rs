//! Recent-search query composition.

use crate::error::ConfigError;

/// Build a recent-search expression for tweets from `authors`.
///
/// Clauses are appended in a fixed order: authors, retweet exclusion, key
/// phrase, quote exclusion.
pub fn build_query<S: AsRef<str>>(
    authors: &[S],
    key_phrase: Option<&str>,
    exclude_retweets: bool,
    exclude_quotes: bool,
) -> Result<String, ConfigError> {
    let authors: Vec<&str> = authors
        .iter()
        .map(|a| a.as_ref().trim().trim_start_matches('@'))
        .filter(|a| !a.is_empty())
        .collect();

    if authors.is_empty() {
        return Err(ConfigError::new(
            "cannot build a search query without key users",
        ));
    }

    let mut query = format!("(from:{})", authors.join(" OR from:"));

    if exclude_retweets {
        query.push_str(" -is:retweet");
    }

    if let Some(phrase) = key_phrase.map(str::trim).filter(|p| !p.is_empty()) {
        // Exact-phrase operator cannot nest quotes
        let unquoted = phrase.replace('"', "");
        if unquoted != phrase {
            log::debug!("[TWITTER] Removed double quotes from key phrase: {} -> {}", phrase, unquoted);
        }
        let unquoted = unquoted.trim();
        if unquoted.is_empty() {
            log::warn!("[TWITTER] Key phrase {} is empty without quotes, ignoring it", phrase);
        } else {
            query.push_str(&format!(" \"{}\"", unquoted));
        }
    }

    if exclude_quotes {
        query.push_str(" -is:quote");
    }

    Ok(query)
}
