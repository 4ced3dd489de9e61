//! Regex utilities for prompt handling
//! Extracted to a separate crate for compilation optimization

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder syntax used by prompt templates.
///
/// A placeholder is `{name}` where `name` is an identifier. Doubled braces
/// (`{{` and `}}`) are escapes for a literal brace.
pub mod placeholder {
    use super::*;

    /// Matches an escaped brace or a placeholder. Group 1 holds the name.
    pub static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex pattern")
    });

    /// One lexical piece of a template.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Segment<'a> {
        Literal(&'a str),
        Brace(char),
        Placeholder(&'a str),
    }

    /// Split a template into literal text, escaped braces and placeholders
    pub fn segments(template: &str) -> Vec<Segment<'_>> {
        let mut out = Vec::new();
        let mut last = 0;

        for caps in TOKEN_PATTERN.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.start() > last {
                out.push(Segment::Literal(&template[last..whole.start()]));
            }
            match caps.get(1) {
                Some(name) => out.push(Segment::Placeholder(name.as_str())),
                None if whole.as_str() == "{{" => out.push(Segment::Brace('{')),
                None => out.push(Segment::Brace('}')),
            }
            last = whole.end();
        }

        if last < template.len() {
            out.push(Segment::Literal(&template[last..]));
        }

        out
    }

    /// Names of all placeholders, in first-appearance order, without duplicates
    pub fn names(template: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for segment in segments(template) {
            if let Segment::Placeholder(name) = segment {
                if !found.iter().any(|n| n == name) {
                    found.push(name.to_string());
                }
            }
        }
        found
    }

    /// Check whether rendered text still carries something that looks like a placeholder
    pub fn has_unresolved(text: &str) -> bool {
        segments(text).iter().any(|s| matches!(s, Segment::Placeholder(_)))
    }
}

/// Guard verdict token detection
pub mod verdict {
    /// Token the guard model emits for out-of-scope or unsafe questions
    pub const BLOCKED_TOKEN: &str = "BLOCKED";

    /// Substring match on the trimmed, upper-cased completion.
    ///
    /// Verbose completions such as "blocked due to policy" still count.
    pub fn mentions_blocked(completion: &str) -> bool {
        completion.trim().to_uppercase().contains(BLOCKED_TOKEN)
    }
}
