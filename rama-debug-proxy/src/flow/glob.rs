//! Case-insensitive `*`/`?` glob matching for flow Entry match rules
//! (spec.md §4.3).
//!
//! No crate in the teacher workspace performs this particular shape of
//! match (the `wildcard` dependency elsewhere targets byte patterns for
//! TLS ClientHello matching, not host/path text) — see DESIGN.md's
//! `flow` entry. Hand-rolled, classic two-pointer wildcard matching with
//! backtracking, same algorithm shape as POSIX `fnmatch`.

/// Match `text` against `pattern`, where `*` matches any run of
/// characters (including none) and `?` matches exactly one character.
/// Matching is case-insensitive.
#[must_use]
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
    let text: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    let (mut star_pi, mut star_ti) = (None::<usize>, 0usize);

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star_pi = Some(pi);
            star_ti = ti;
            pi += 1;
        } else if let Some(sp) = star_pi {
            pi = sp + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }

    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }

    pi == pattern.len()
}

/// `true` when `text` matches any pattern in `patterns`, or when
/// `patterns` is empty/absent (spec.md §4.3: "omission means 'match
/// anything'").
#[must_use]
pub fn matches_any(patterns: Option<&[String]>, text: &str) -> bool {
    match patterns {
        None => true,
        Some(patterns) if patterns.is_empty() => true,
        Some(patterns) => patterns.iter().any(|p| glob_match(p, text)),
    }
}
