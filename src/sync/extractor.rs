//! Extracts translation key usages from a source file using Tree-sitter.

use thiserror::Error;
use tree_sitter::{
    Language,
    Node,
    Parser,
};

/// Failure to extract references from one file.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to set language: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),

    #[error("Failed to parse source")]
    ParseFailed,

    #[error("Syntax error near line {line}")]
    SyntaxError { line: usize },
}

/// One `t("key", ...)` usage found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReference {
    pub key: String,
    /// English fallback given in source, if any.
    pub fallback: Option<String>,
    /// 1-based line of the call.
    pub line: usize,
}

/// Extracts calls to any of `functions` whose first argument is a static string.
///
/// Member calls (`i18n.t("key")`) match on the property name. Keys built at
/// runtime (identifiers, concatenations, templates with substitutions) are ignored.
///
/// # Errors
/// Returns `ExtractError` if:
/// - Language setup fails
/// - Source code parsing fails
/// - The syntax tree contains errors
pub fn extract_key_references(
    source: &str,
    language: &Language,
    functions: &[String],
) -> Result<Vec<KeyReference>, ExtractError> {
    let mut parser = Parser::new();
    parser.set_language(language)?;
    let tree = parser.parse(source, None).ok_or(ExtractError::ParseFailed)?;
    let root_node = tree.root_node();

    if root_node.has_error() {
        return Err(ExtractError::SyntaxError { line: first_error_line(root_node) });
    }

    let source_bytes = source.as_bytes();
    let mut references = Vec::new();
    let mut cursor = root_node.walk();

    // 深さ優先でソース順に走査する
    loop {
        let node = cursor.node();
        if node.kind() == "call_expression"
            && let Some(reference) = reference_from_call(node, source_bytes, functions)
        {
            references.push(reference);
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return Ok(references);
            }
        }
    }
}

/// 1-based line of the first `ERROR` or missing node.
fn first_error_line(root: Node<'_>) -> usize {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return node.start_position().row + 1;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return root.start_position().row + 1;
            }
        }
    }
}

/// Key and fallback of a translation call, if `call` is one.
fn reference_from_call(
    call: Node<'_>,
    source_bytes: &[u8],
    functions: &[String],
) -> Option<KeyReference> {
    let callee = call.child_by_field_name("function")?;
    let name = callee_name(callee, source_bytes)?;
    if !functions.iter().any(|function| function == name) {
        return None;
    }

    let arguments = call.child_by_field_name("arguments")?;
    // tagged template (t`key`)
    if arguments.kind() != "arguments" {
        return None;
    }

    let mut cursor = arguments.walk();
    let mut args = arguments.named_children(&mut cursor).filter(|arg| arg.kind() != "comment");

    // 保存されるキーと同じ形に揃える
    let key = string_literal_value(args.next()?, source_bytes)?.trim().to_string();
    if key.is_empty() {
        return None;
    }
    let fallback = args.next().and_then(|arg| fallback_value(arg, source_bytes));

    Some(KeyReference { key, fallback, line: call.start_position().row + 1 })
}

/// `t` for `t(...)`, `t` for `i18n.t(...)`.
fn callee_name<'a>(callee: Node<'_>, source_bytes: &'a [u8]) -> Option<&'a str> {
    match callee.kind() {
        "identifier" => callee.utf8_text(source_bytes).ok(),
        "member_expression" => {
            callee.child_by_field_name("property")?.utf8_text(source_bytes).ok()
        }
        _ => None,
    }
}

/// Second argument: a string, or an options object with `defaultValue`.
fn fallback_value(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    if node.kind() != "object" {
        return string_literal_value(node, source_bytes);
    }

    let mut cursor = node.walk();
    let pair = node.named_children(&mut cursor).find(|child| {
        child.kind() == "pair"
            && child.child_by_field_name("key").is_some_and(|key| {
                property_name(key, source_bytes).as_deref() == Some("defaultValue")
            })
    })?;
    string_literal_value(pair.child_by_field_name("value")?, source_bytes)
}

/// Object key as written (`defaultValue` or `"defaultValue"`).
fn property_name(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    match node.kind() {
        "property_identifier" => node.utf8_text(source_bytes).ok().map(ToString::to_string),
        _ => string_literal_value(node, source_bytes),
    }
}

/// Static value of a quoted string or a substitution-free template literal.
fn string_literal_value(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    if node.kind() != "string" && node.kind() != "template_string" {
        return None;
    }

    let mut value = String::new();
    let mut cursor = node.walk();
    for part in node.named_children(&mut cursor) {
        let text = part.utf8_text(source_bytes).ok()?;
        match part.kind() {
            "template_substitution" => return None,
            "escape_sequence" => value.push_str(&unescape(text)),
            _ => value.push_str(text),
        }
    }
    Some(value)
}

/// Decodes one JavaScript escape sequence.
fn unescape(sequence: &str) -> String {
    match sequence {
        "\\n" => "\n".to_string(),
        "\\t" => "\t".to_string(),
        "\\r" => "\r".to_string(),
        "\\0" => "\0".to_string(),
        // 改行の継続
        "\\\n" | "\\\r\n" => String::new(),
        other => {
            let body = other.strip_prefix('\\').unwrap_or(other);
            if let Some(hex) = body.strip_prefix('u').or_else(|| body.strip_prefix('x')) {
                let hex = hex.trim_start_matches('{').trim_end_matches('}');
                if let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                    return c.to_string();
                }
            }
            body.to_string()
        }
    }
}

/// Human-readable English text for the last segment of a dotted key.
///
/// `admin.tours.createTour` becomes `Create Tour`; `common.save_changes`
/// becomes `Save Changes`.
#[must_use]
pub fn humanize_key(key: &str) -> String {
    let segment = key.rsplit('.').find(|segment| !segment.trim().is_empty()).unwrap_or(key);

    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous: Option<char> = None;
    for c in segment.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous = None;
            continue;
        }
        let boundary = c.is_uppercase()
            && previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        previous = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let humanized = words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ");

    if humanized.is_empty() { key.trim().to_string() } else { humanized }
}

/// First segment of a dotted key, used as the default category.
#[must_use]
pub fn key_category(key: &str) -> Option<&str> {
    key.split_once('.').map(|(first, _)| first.trim()).filter(|first| !first.is_empty())
}
