//! Intent classification — from raw chat text to a (provider, phrase) pair.
//!
//! The classifier is a declaratively ordered table of
//! `(provider, pattern, phrase template)` rules, evaluated strictly in
//! declaration order: the first matching rule anywhere in the table wins.
//! The ordering is load-bearing — rules for one provider can deliberately
//! shadow later, broader rules — and is pinned by tests.
//!
//! Inputs that match no rule but start with an explicit `/provider` marker
//! bypass classification: the remainder passes through verbatim. Anything
//! else falls to the configured default provider, or errors.

use std::sync::OnceLock;

use regex::Regex;

use crate::providers::ProviderRegistry;

use super::errors::DispatchError;

// ─── Rule Table ──────────────────────────────────────────────────────────────

/// One declarative classification rule.
struct RuleSpec {
    provider: &'static str,
    pattern: &'static str,
    /// Phrase template; `$1`, `$2`, … expand capture groups.
    phrase: &'static str,
}

/// The ordered rule table. Grouped by provider; both the group order and
/// the rule order within a group decide ties.
const RULE_SPECS: &[RuleSpec] = &[
    // github
    RuleSpec {
        provider: "github",
        pattern: r"(?i)^list (?:my )?repos(?:itories)?$",
        phrase: "list repos",
    },
    RuleSpec {
        provider: "github",
        pattern: r"(?i)^list (?:my )?(?:open )?issues$",
        phrase: "list issues",
    },
    RuleSpec {
        provider: "github",
        pattern: r"(?i)^(?:show|list) (?:my )?pull requests$",
        phrase: "list pulls",
    },
    RuleSpec {
        provider: "github",
        pattern: r"(?i)^create issue (.+)$",
        phrase: "create issue $1",
    },
    // gitlab
    RuleSpec {
        provider: "gitlab",
        pattern: r"(?i)^list (?:my )?gitlab (?:projects|repos)$",
        phrase: "list projects",
    },
    // drive — declared before dropbox: the bare "list files" form matches
    // both groups and must resolve here.
    RuleSpec {
        provider: "drive",
        pattern: r"(?i)^list (?:my )?(?:drive )?files$",
        phrase: "list files",
    },
    RuleSpec {
        provider: "drive",
        pattern: r"(?i)^search (?:my )?drive for (.+)$",
        phrase: "search files $1",
    },
    // dropbox
    RuleSpec {
        provider: "dropbox",
        pattern: r"(?i)^list (?:my )?(?:dropbox )?files$",
        phrase: "list files",
    },
    // mail
    RuleSpec {
        provider: "mail",
        pattern: r"(?i)^(?:check|list) (?:my )?(?:mail|email|inbox)$",
        phrase: "list inbox",
    },
    RuleSpec {
        provider: "mail",
        pattern: r"(?i)^search (?:my )?(?:mail|email) for (.+)$",
        phrase: "search mail $1",
    },
    // calendar
    RuleSpec {
        provider: "calendar",
        pattern: r"(?i)^(?:what'?s on|show) (?:my )?calendar(?: today)?$",
        phrase: "list events",
    },
    RuleSpec {
        provider: "calendar",
        pattern: r"(?i)^list (?:my )?events$",
        phrase: "list events",
    },
    // automate
    RuleSpec {
        provider: "automate",
        pattern: r"(?i)^run (?:automation|workflow) (.+)$",
        phrase: "run automation $1",
    },
    // openai
    RuleSpec {
        provider: "openai",
        pattern: r"(?i)^ask (?:the )?(?:ai|assistant) (.+)$",
        phrase: "prompt $1",
    },
];

/// A compiled classification rule.
pub struct IntentRule {
    pub provider: &'static str,
    regex: Regex,
    phrase: &'static str,
}

/// The compiled rule table, built once per process.
pub fn rules() -> &'static [IntentRule] {
    static RULES: OnceLock<Vec<IntentRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        RULE_SPECS
            .iter()
            .map(|spec| IntentRule {
                provider: spec.provider,
                regex: Regex::new(spec.pattern).expect("intent rule pattern must compile"),
                phrase: spec.phrase,
            })
            .collect()
    })
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Where a submission should go.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// A rule matched: provider plus recognized command phrase.
    Command { provider: String, phrase: String },
    /// Explicit `/provider` marker: the remainder bypasses classification.
    Passthrough { provider: String, command: String },
    /// Default-provider fallback: the whole input is a prompt.
    Prompt { provider: String },
}

/// Classify raw input against the rule table and the registry.
///
/// Pure apart from the registry marker lookup — no side effects.
pub fn classify(
    input: &str,
    registry: &ProviderRegistry,
    default_provider: Option<&str>,
) -> Result<Intent, DispatchError> {
    let trimmed = input.trim();

    // 1. Ordered rule table — first match wins.
    for rule in rules() {
        if let Some(caps) = rule.regex.captures(trimmed) {
            let mut phrase = String::new();
            caps.expand(rule.phrase, &mut phrase);
            tracing::debug!(
                provider = rule.provider,
                phrase = %phrase,
                "intent rule matched"
            );
            return Ok(Intent::Command {
                provider: rule.provider.to_string(),
                phrase,
            });
        }
    }

    // 2. Explicit provider marker — verbatim pass-through.
    if let Some(rest) = trimmed.strip_prefix('/') {
        let (marker, remainder) = match rest.split_once(char::is_whitespace) {
            Some((marker, remainder)) => (marker, remainder.trim()),
            None => (rest, ""),
        };
        let marker_id = marker.to_lowercase();

        if !registry.contains(&marker_id) {
            return Err(DispatchError::UnknownProvider {
                marker: marker.to_string(),
            });
        }
        if remainder.is_empty() {
            return Err(DispatchError::Invalid {
                reason: format!("nothing after '/{marker}'"),
            });
        }
        return Ok(Intent::Passthrough {
            provider: marker_id,
            command: remainder.to_string(),
        });
    }

    // 3. No explicit provider — default path, or nothing to do.
    match default_provider {
        Some(id) if registry.contains(id) => Ok(Intent::Prompt {
            provider: id.to_string(),
        }),
        Some(id) => Err(DispatchError::UnknownProvider {
            marker: id.to_string(),
        }),
        None => Err(DispatchError::NoIntent),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProviderRegistry {
        ProviderRegistry::builtin()
    }

    #[test]
    fn test_table_compiles_and_groups_by_provider() {
        let table = rules();
        assert_eq!(table.len(), RULE_SPECS.len());

        // Rules are grouped: a provider's rules are contiguous, so group
        // order + in-group order fully determine evaluation order.
        let mut seen: Vec<&str> = Vec::new();
        for rule in table {
            match seen.last() {
                Some(last) if *last == rule.provider => {}
                _ => {
                    assert!(
                        !seen.contains(&rule.provider),
                        "provider '{}' declared in two separate groups",
                        rule.provider
                    );
                    seen.push(rule.provider);
                }
            }
        }
    }

    #[test]
    fn test_classify_list_repos() {
        let intent = classify("list my repos", &registry(), None).unwrap();
        assert_eq!(
            intent,
            Intent::Command {
                provider: "github".into(),
                phrase: "list repos".into()
            }
        );

        // Variants collapse to the same phrase
        let intent = classify("List Repositories", &registry(), None).unwrap();
        assert_eq!(
            intent,
            Intent::Command {
                provider: "github".into(),
                phrase: "list repos".into()
            }
        );
    }

    #[test]
    fn test_classify_capture_expansion() {
        let intent =
            classify("search my mail for quarterly report", &registry(), None).unwrap();
        assert_eq!(
            intent,
            Intent::Command {
                provider: "mail".into(),
                phrase: "search mail quarterly report".into()
            }
        );
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        // "list files" matches both the drive and the dropbox rule (each
        // treats its service name as optional). Drive is declared first
        // and wins.
        let intent = classify("list files", &registry(), None).unwrap();
        assert_eq!(
            intent,
            Intent::Command {
                provider: "drive".into(),
                phrase: "list files".into()
            }
        );

        // The dropbox-specific form still reaches dropbox.
        let intent = classify("list dropbox files", &registry(), None).unwrap();
        assert_eq!(
            intent,
            Intent::Command {
                provider: "dropbox".into(),
                phrase: "list files".into()
            }
        );
    }

    #[test]
    fn test_passthrough_marker() {
        let intent = classify("/drive list", &registry(), None).unwrap();
        assert_eq!(
            intent,
            Intent::Passthrough {
                provider: "drive".into(),
                command: "list".into()
            }
        );

        // Remainder is verbatim (classification skipped entirely).
        let intent = classify("/github list-pulls --all", &registry(), None).unwrap();
        assert_eq!(
            intent,
            Intent::Passthrough {
                provider: "github".into(),
                command: "list-pulls --all".into()
            }
        );
    }

    #[test]
    fn test_passthrough_marker_case_insensitive() {
        let intent = classify("/GitHub list-repos", &registry(), None).unwrap();
        assert!(matches!(
            intent,
            Intent::Passthrough { ref provider, .. } if provider == "github"
        ));
    }

    #[test]
    fn test_unknown_marker_is_user_input_error() {
        let err = classify("/jira list issues", &registry(), None).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownProvider { ref marker } if marker == "jira"));
    }

    #[test]
    fn test_bare_marker_is_invalid() {
        let err = classify("/drive", &registry(), None).unwrap_err();
        assert!(matches!(err, DispatchError::Invalid { .. }));
    }

    #[test]
    fn test_default_provider_fallback() {
        let intent =
            classify("what should I cook tonight", &registry(), Some("openai")).unwrap();
        assert_eq!(
            intent,
            Intent::Prompt {
                provider: "openai".into()
            }
        );
    }

    #[test]
    fn test_no_match_without_default_errors() {
        let err = classify("what should I cook tonight", &registry(), None).unwrap_err();
        assert!(matches!(err, DispatchError::NoIntent));
    }

    #[test]
    fn test_rules_win_over_default_provider() {
        // A matching rule is preferred even when a default is configured.
        let intent = classify("list my repos", &registry(), Some("openai")).unwrap();
        assert!(matches!(
            intent,
            Intent::Command { ref provider, .. } if provider == "github"
        ));
    }
}
