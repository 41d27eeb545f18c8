//! Fail-closed safety gate applied before any script is parsed.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::error::SandboxError;

/// Keywords rejected anywhere in a script, matched case-insensitively as
/// substrings.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "require",
    "import",
    "eval",
    "Function",
    "setTimeout",
    "setInterval",
    "process",
    "global",
    "__dirname",
    "__filename",
    "module",
    "exports",
];

const FORBIDDEN_PATTERNS: &[(&str, &str)] = &[
    (r"new\s+function", "dynamic function construction"),
    (r"function\s*\(", "dynamic function construction"),
    (r"eval\s*\(", "eval call"),
    (r"\bwindow\s*\.", "browser global access"),
    (r"\bdocument\s*\.", "browser global access"),
    (r"\blocation\s*\.", "browser global access"),
    (r"\bnavigator\s*\.", "browser global access"),
    (r"xmlhttprequest", "network access"),
    (r"fetch\s*\(", "network access"),
    (r"import\s*\(", "dynamic import"),
    (r"require\s*\(", "dynamic require"),
];

static COMPILED_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    FORBIDDEN_PATTERNS
        .iter()
        .filter_map(|(pattern, label)| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .ok()
                .map(|regex| (regex, *label))
        })
        .collect()
});

/// Runs both checks and reports the first rule the script violates.
///
/// # Errors
///
/// Returns `SandboxError::UnsafeScript` naming the matched keyword or pattern.
pub fn check(script: &str) -> Result<(), SandboxError> {
    // Gate is closed if any pattern failed to compile.
    if COMPILED_PATTERNS.len() != FORBIDDEN_PATTERNS.len() {
        return Err(SandboxError::UnsafeScript {
            reason: "safety patterns unavailable".to_owned(),
        });
    }

    let lowered = script.to_lowercase();
    if let Some(keyword) = FORBIDDEN_KEYWORDS
        .iter()
        .find(|keyword| lowered.contains(&keyword.to_lowercase()))
    {
        return Err(SandboxError::UnsafeScript {
            reason: format!("forbidden keyword `{keyword}`"),
        });
    }

    if let Some((regex, label)) = COMPILED_PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(script))
    {
        return Err(SandboxError::UnsafeScript {
            reason: format!("{label} (`{}`)", regex.as_str()),
        });
    }

    Ok(())
}

/// Returns whether the script passes the safety gate. Never executes it.
#[must_use]
pub fn is_safe(script: &str) -> bool {
    check(script).is_ok()
}
