// src/analysis/parser.rs
// Pulls the structured findings block out of free-form model output.
//
// Strategies run in a fixed order and the first one that yields findings wins:
//   1. ```json fence, strict, then with trailing commas removed
//   2. unlabeled fence holding braces, strict, repaired, then quote-normalized
//   3. any balanced {...} span read as a Python-style literal
// Nothing found is not an error; the report text stands on its own.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use super::findings::StructuredFindings;

static LABELED_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("labeled fence regex"));
static BARE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("bare fence regex"));
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma regex"));
static BARE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)").expect("bare key regex")
});

/// Candidate `{` positions tried by the literal strategy.
const MAX_BRACE_CANDIDATES: usize = 32;

type Strategy = fn(&str) -> Option<StructuredFindings>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("labeled_fence", labeled_fence),
    ("bare_fence", bare_fence),
    ("brace_literal", brace_literal),
];

pub fn extract_structured(text: &str) -> Option<StructuredFindings> {
    for (name, strategy) in STRATEGIES {
        if let Some(findings) = strategy(text) {
            debug!(strategy = name, "Extracted structured findings");
            return Some(findings);
        }
    }
    debug!("No structured findings in model output");
    None
}

fn labeled_fence(text: &str) -> Option<StructuredFindings> {
    let body = LABELED_FENCE.captures(text)?.get(1)?.as_str().trim();
    parse_strict(body).or_else(|| parse_strict(&strip_trailing_commas(body)))
}

fn bare_fence(text: &str) -> Option<StructuredFindings> {
    BARE_FENCE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| body.contains('{') && body.contains('}'))
        .find_map(|body| {
            parse_strict(body)
                .or_else(|| parse_strict(&strip_trailing_commas(body)))
                .or_else(|| parse_strict(&normalize_quotes(body)))
        })
}

fn brace_literal(text: &str) -> Option<StructuredFindings> {
    text.match_indices('{')
        .take(MAX_BRACE_CANDIDATES)
        .filter_map(|(start, _)| balanced_span(&text[start..]))
        .find_map(|span| {
            let json = literal_to_json(span)?;
            parse_strict(&strip_trailing_commas(&json))
        })
}

fn parse_strict(body: &str) -> Option<StructuredFindings> {
    let value: Value = serde_json::from_str(body).ok()?;
    StructuredFindings::from_value(&value)
}

fn strip_trailing_commas(body: &str) -> String {
    TRAILING_COMMA.replace_all(body, "$1").into_owned()
}

/// Single quotes become double quotes and bare keys get quoted.
fn normalize_quotes(body: &str) -> String {
    let swapped = body.replace('\'', "\"");
    let keyed = BARE_KEY.replace_all(&swapped, |caps: &Captures| {
        format!("{}\"{}\"{}", &caps[1], &caps[2], &caps[3])
    });
    strip_trailing_commas(&keyed)
}

/// The `{...}` prefix of `text` with balanced braces, skipping quoted strings.
fn balanced_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Re-encode a Python-style literal (single quotes, True/False/None, tuples,
/// bare identifiers) as JSON text.
fn literal_to_json(literal: &str) -> Option<String> {
    let chars: Vec<char> = literal.chars().collect();
    let mut out = String::with_capacity(literal.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                let (value, next) = read_string(&chars, i)?;
                out.push_str(&serde_json::to_string(&value).ok()?);
                i = next;
            }
            '(' => {
                out.push('[');
                i += 1;
            }
            ')' => {
                out.push(']');
                i += 1;
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_digit() || matches!(chars[i], '.' | 'e' | 'E' | '-' | '+'))
                {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                let token = token.trim_start_matches('+');
                out.push_str(token);
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                match ident.as_str() {
                    "True" | "true" => out.push_str("true"),
                    "False" | "false" => out.push_str("false"),
                    "None" | "null" => out.push_str("null"),
                    _ => out.push_str(&serde_json::to_string(&ident).ok()?),
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Some(out)
}

/// Read a quoted string starting at `start`; returns the value and the index after it.
fn read_string(chars: &[char], start: usize) -> Option<(String, usize)> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = *chars.get(i + 1)?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
                i += 2;
            }
            c if c == quote => return Some((value, i + 1)),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }
    None
}

/// Report text for end users: findings fences removed, angle brackets escaped.
pub fn clean_analysis_text(text: &str) -> String {
    let without_labeled = LABELED_FENCE.replace_all(text, "");
    let without_blocks = BARE_FENCE.replace_all(&without_labeled, |caps: &Captures| {
        if caps[1].contains('{') {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    escape_angle_brackets(without_blocks.trim_end())
}

pub fn escape_angle_brackets(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}
