//! Command normalization — from a recognized phrase to the canonical slug
//! the remote endpoint expects.
//!
//! The slug convention is deliberately narrow: lower-case, collapse
//! whitespace runs, join the FIRST TWO tokens with a hyphen, append any
//! remainder verbatim. This is not a general slugifier — "search mail
//! quarterly report" becomes `search-mail quarterly report`.
//!
//! When a live command list exists for the provider, a candidate that is
//! absent from it is retried as hyphen / underscore / space variants of the
//! same tokens; the first listed variant wins. Otherwise the candidate is
//! kept and the executor is allowed to fail naturally.

/// Build the candidate slug from a command phrase.
///
/// Idempotent: an already-canonical slug passes through unchanged (it is a
/// single whitespace-token).
pub fn canonical_slug(phrase: &str) -> String {
    let lowered = phrase.to_lowercase();
    let mut tokens = lowered.split_whitespace();

    let Some(first) = tokens.next() else {
        return String::new();
    };
    let Some(second) = tokens.next() else {
        return first.to_string();
    };

    let mut slug = format!("{first}-{second}");
    let remainder: Vec<&str> = tokens.collect();
    if !remainder.is_empty() {
        slug.push(' ');
        slug.push_str(&remainder.join(" "));
    }
    slug
}

/// Naming-convention variants of a slug: the same tokens joined by hyphen,
/// underscore, and space, in that order.
pub fn slug_variants(slug: &str) -> Vec<String> {
    let tokens: Vec<&str> = slug
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut variants = vec![
        tokens.join("-"),
        tokens.join("_"),
        tokens.join(" "),
    ];
    variants.dedup();
    variants
}

/// Normalize a phrase, consulting the provider's live command list when one
/// is available.
pub fn normalize_command(phrase: &str, live_commands: Option<&[String]>) -> String {
    let candidate = canonical_slug(phrase);

    let Some(list) = live_commands else {
        return candidate;
    };

    if list.iter().any(|c| c == &candidate) {
        return candidate;
    }

    for variant in slug_variants(&candidate) {
        if list.iter().any(|c| c == &variant) {
            tracing::debug!(
                candidate = %candidate,
                substituted = %variant,
                "slug variant matched live command list"
            );
            return variant;
        }
    }

    // Nothing matched — keep the candidate and let the endpoint decide.
    candidate
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_slug_joins_first_two_tokens() {
        assert_eq!(canonical_slug("list repos"), "list-repos");
        assert_eq!(canonical_slug("List   Repos"), "list-repos");
    }

    #[test]
    fn test_canonical_slug_single_token() {
        assert_eq!(canonical_slug("list"), "list");
        assert_eq!(canonical_slug("  LIST  "), "list");
    }

    #[test]
    fn test_canonical_slug_empty() {
        assert_eq!(canonical_slug(""), "");
        assert_eq!(canonical_slug("   "), "");
    }

    #[test]
    fn test_canonical_slug_keeps_remainder_verbatim() {
        // Only the first two tokens are joined.
        assert_eq!(
            canonical_slug("search mail quarterly report"),
            "search-mail quarterly report"
        );
        assert_eq!(canonical_slug("create issue fix the build"), "create-issue fix the build");
    }

    #[test]
    fn test_canonical_slug_idempotent() {
        for slug in ["list-repos", "list", "search-mail", "create-issue"] {
            assert_eq!(canonical_slug(slug), slug);
        }
    }

    #[test]
    fn test_slug_variants_order() {
        assert_eq!(
            slug_variants("list-repos"),
            vec!["list-repos", "list_repos", "list repos"]
        );
        assert_eq!(
            slug_variants("list_repos"),
            vec!["list-repos", "list_repos", "list repos"]
        );
    }

    #[test]
    fn test_slug_variants_single_token() {
        assert_eq!(slug_variants("list"), vec!["list"]);
    }

    #[test]
    fn test_normalize_without_live_list_keeps_candidate() {
        assert_eq!(normalize_command("list repos", None), "list-repos");
    }

    #[test]
    fn test_normalize_exact_match_in_live_list() {
        let live = vec!["list-repos".to_string(), "create-issue".to_string()];
        assert_eq!(normalize_command("list repos", Some(&live)), "list-repos");
    }

    #[test]
    fn test_normalize_substitutes_underscore_variant() {
        // The provider's catalog uses underscores; the candidate adapts.
        let live = vec!["list_repos".to_string()];
        assert_eq!(normalize_command("list repos", Some(&live)), "list_repos");
    }

    #[test]
    fn test_normalize_substitutes_space_variant() {
        let live = vec!["list repos".to_string()];
        assert_eq!(normalize_command("list repos", Some(&live)), "list repos");
    }

    #[test]
    fn test_normalize_unlisted_candidate_kept() {
        // Absent from the live list in every variant — the executor gets to
        // fail naturally.
        let live = vec!["create-issue".to_string()];
        assert_eq!(normalize_command("list repos", Some(&live)), "list-repos");
    }

    #[test]
    fn test_normalize_already_canonical_is_stable() {
        let live = vec!["list-repos".to_string()];
        let once = normalize_command("list repos", Some(&live));
        let twice = normalize_command(&once, Some(&live));
        assert_eq!(once, twice);
    }
}
