//! Textual repairs for JSON emitted by language models.
//!
//! Each step is a pure `&str -> String` rewrite, tuned to the usual model
//! mistakes (code fences, prose around the object, unquoted keys and enum
//! values, trailing commas, `undefined`). This is not a JSON5 parser.
//! Every rewrite except fence stripping leaves double-quoted string literals
//! untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").expect("static fence pattern"));

static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)").expect("static bare key pattern")
});

static BARE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(:\s*)([A-Za-z][A-Za-z0-9_-]*)(\s*)([,}\]]|$)").expect("static bare value pattern")
});

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("static trailing comma pattern"));

static UNDEFINED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bundefined\b").expect("static undefined pattern"));

/// Bare tokens that are already valid JSON (or become valid later in the chain).
const LITERALS: [&str; 4] = ["true", "false", "null", "undefined"];

/// Remove fence markers (with or without a language tag) anywhere in the text.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").into_owned()
}

/// The inclusive span from the first `{` to the last `}`, or `None` when
/// either is missing or they are out of order.
pub fn slice_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// `{shotType: "clean"}` -> `{"shotType": "clean"}`.
pub fn quote_bare_keys(text: &str) -> String {
    rewrite_outside_strings(text, |code, _| {
        BARE_KEY.replace_all(code, "$1\"$2\"$3").into_owned()
    })
}

/// `"movement": static,` -> `"movement": "static",`.
///
/// Only tokens that start with a letter are quoted, so numbers are left
/// alone, as are `true`, `false`, `null` and `undefined`.
pub fn quote_bare_values(text: &str) -> String {
    rewrite_outside_strings(text, |code, is_tail| {
        BARE_VALUE
            .replace_all(code, |caps: &Captures| {
                let token = &caps[2];
                let at_segment_end = caps[4].is_empty();
                if LITERALS.contains(&token) || (at_segment_end && !is_tail) {
                    caps[0].to_string()
                } else {
                    format!("{}\"{}\"{}{}", &caps[1], token, &caps[3], &caps[4])
                }
            })
            .into_owned()
    })
}

/// Drop a comma that directly precedes `}` or `]`.
pub fn strip_trailing_commas(text: &str) -> String {
    rewrite_outside_strings(text, |code, _| {
        TRAILING_COMMA.replace_all(code, "$1").into_owned()
    })
}

/// Bare `undefined` becomes `null`. Quoted "undefined" is content and stays.
pub fn replace_undefined(text: &str) -> String {
    rewrite_outside_strings(text, |code, _| UNDEFINED.replace_all(code, "null").into_owned())
}

/// Full repair chain. `None` when no JSON object can be located.
pub fn repair_json(raw: &str) -> Option<String> {
    let unfenced = strip_code_fences(raw);
    let object = slice_object(unfenced.trim())?;

    let repaired = quote_bare_keys(object);
    let repaired = quote_bare_values(&repaired);
    let repaired = strip_trailing_commas(&repaired);
    Some(replace_undefined(&repaired))
}

/// Apply `rewrite` to every run of text outside double-quoted strings.
///
/// The closure also learns whether the run is the tail of the input, so
/// end-of-input anchors only fire where the input really ends. An unterminated
/// string swallows the rest of the input untouched.
fn rewrite_outside_strings<F>(text: &str, mut rewrite: F) -> String
where
    F: FnMut(&str, bool) -> String,
{
    let mut out = String::with_capacity(text.len() + 16);
    let mut segment_start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                out.push_str(&text[segment_start..=i]);
                segment_start = i + 1;
                in_string = false;
            }
        } else if c == '"' {
            out.push_str(&rewrite(&text[segment_start..i], false));
            segment_start = i;
            in_string = true;
        }
    }

    if in_string {
        out.push_str(&text[segment_start..]);
    } else {
        out.push_str(&rewrite(&text[segment_start..], true));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
