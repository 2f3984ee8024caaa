use once_cell::sync::Lazy;
use regex::Regex;

/// Splits a capitalized word off whatever precedes it (`HTTPResponse` -> `HTTP_Response`).
static UNCAMEL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid uncamel word pattern"));

/// Splits a lowercase letter or digit from a following capital (`get2HTTP` -> `get2_HTTP`).
static UNCAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid uncamel boundary pattern"));

/// Placeholder attribute name for identifiers with no usable characters.
pub const EMPTY_ATTNAME: &str = "field";
/// Placeholder class name for identifiers with no usable characters.
pub const EMPTY_MODEL_NAME: &str = "Model";

const KEYWORD_SUFFIX: &str = "_field";
const DIGIT_PREFIX: &str = "number_";

/// Python reserved words; generated attributes and classes must not shadow them.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// True when `name` is a reserved word of the generated source language.
pub fn is_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

/// Return the identifier without surrounding double quotes or backticks.
pub fn unquote_identifier(ident: &str) -> &str {
    ident
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| ident.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(ident)
}

/// Split a potentially schema-qualified name into `(schema, relation)`.
///
/// Handles dots inside quoted identifiers, e.g. `"my.schema"."table.name"`.
pub fn split_schema_and_relation(name: &str) -> Option<(String, String)> {
    let mut in_quotes = false;
    let mut start = 0usize;
    let mut parts: Vec<&str> = Vec::new();

    for (idx, ch) in name.char_indices() {
        match ch {
            '"' | '`' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                parts.push(name[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(name[start..].trim());

    if parts.len() < 2 {
        return None;
    }

    let schema = unquote_identifier(parts[parts.len() - 2]).to_string();
    let relation = unquote_identifier(parts[parts.len() - 1]).to_string();
    Some((schema, relation))
}

/// Reduce a catalog object name to its terminal relation, keeping its case.
///
/// Examples:
/// - `"public.docs"` -> `"docs"`
/// - `"\"auth\".\"UserDocs\""` -> `"UserDocs"`
pub fn relation_name(name: &str) -> String {
    if let Some((_, relation)) = split_schema_and_relation(name.trim()) {
        return relation;
    }
    unquote_identifier(name.trim()).to_string()
}

/// Make camel case lowercase and use underscores.
///
/// The word rule runs before the boundary rule; swapping them breaks acronym
/// runs apart letter by letter.
///
/// ```
/// use db2model::parser::names::uncamel;
///
/// assert_eq!(uncamel("CamelCamelCase"), "camel_camel_case");
/// assert_eq!(uncamel("getHTTPResponseCode"), "get_http_response_code");
/// ```
pub fn uncamel(s: &str) -> String {
    let s = UNCAMEL_WORD.replace_all(s, "${1}_${2}");
    let s = UNCAMEL_BOUNDARY.replace_all(&s, "${1}_${2}");
    s.to_lowercase()
}

/// Convert a column name into a Python attribute name.
///
/// Rules:
/// - uncamel the name
/// - replace anything outside `[a-z0-9_]` with `_`
/// - collapse repeated `_`
/// - trim leading/trailing `_`
/// - if empty, return `"field"`
/// - if starting with a digit, prefix with `"number_"`
/// - if a keyword, suffix with `"_field"`
pub fn to_attname(s: &str) -> String {
    let uncameled = uncamel(s);

    let mut normalized = String::with_capacity(uncameled.len());
    let mut previous_was_underscore = false;

    for ch in uncameled.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            normalized.push(ch);
            previous_was_underscore = false;
        } else if !previous_was_underscore {
            normalized.push('_');
            previous_was_underscore = true;
        }
    }

    let trimmed = normalized.trim_matches('_');
    let mut attname = if trimmed.is_empty() {
        EMPTY_ATTNAME.to_string()
    } else {
        trimmed.to_string()
    };

    if attname.starts_with(|ch: char| ch.is_ascii_digit()) {
        attname.insert_str(0, DIGIT_PREFIX);
    }
    if is_keyword(&attname) {
        attname.push_str(KEYWORD_SUFFIX);
    }
    attname
}

/// Convert a table name into a class name.
///
/// Separators (`-`, `_`, spaces) start a new word whose first letter is
/// capitalized; the rest of each word keeps its original case, so
/// `user_HTTPLog` becomes `UserHTTPLog`. Characters outside ASCII letters,
/// digits and separators are dropped.
pub fn to_model(s: &str) -> String {
    let mut model = String::with_capacity(s.len());
    let mut start_of_word = true;

    for ch in s.chars() {
        match ch {
            '-' | '_' | ' ' => start_of_word = true,
            c if c.is_ascii_alphanumeric() => {
                if start_of_word {
                    model.push(c.to_ascii_uppercase());
                    start_of_word = false;
                } else {
                    model.push(c);
                }
            }
            _ => {}
        }
    }

    if model.is_empty() {
        return EMPTY_MODEL_NAME.to_string();
    }
    if model.starts_with(|ch: char| ch.is_ascii_digit()) {
        model.insert_str(0, EMPTY_MODEL_NAME);
    }
    if is_keyword(&model) {
        model.push_str(EMPTY_MODEL_NAME);
    }
    model
}
