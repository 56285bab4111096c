// Name conversion utilities for codegen.

/// Prefix reserved for locals in generated code. Source parameter names
/// starting with it are renamed.
pub const GENERATED_LOCAL_PREFIX: &str = "seq_";

/// Convert a PascalCase or UPPER_CASE name to snake_case.
pub fn to_snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 8);
    let chars: Vec<char> = name.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                // Insert underscore before uppercase if preceded by lowercase/digit,
                // or if it starts a new word in an acronym (e.g., "HTTPServer" -> "http_server").
                if prev.is_ascii_lowercase() || prev.is_ascii_digit() {
                    result.push('_');
                } else if prev.is_ascii_uppercase()
                    && i + 1 < chars.len()
                    && chars[i + 1].is_ascii_lowercase()
                {
                    result.push('_');
                }
            }
            result.push(ch.to_ascii_lowercase());
        } else {
            result.push(ch);
        }
    }

    result
}

/// snake_case upper-cased, for generated constants.
pub fn to_screaming_snake_case(name: &str) -> String {
    to_snake_case(name).to_ascii_uppercase()
}

const RESERVED_WORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
    "trait", "true", "type", "unsafe", "use", "where", "while", "async",
    "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
];

/// Check if a name is a Rust reserved word.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Escape Rust reserved words by prepending `r#`.
pub fn escape_reserved(name: &str) -> String {
    // These cannot be raw identifiers.
    if matches!(name, "self" | "Self" | "super" | "crate") {
        return format!("{name}_");
    }
    if is_reserved(name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Rust identifier for a source declaration or member name.
pub fn rust_ident(name: &str) -> String {
    escape_reserved(&to_snake_case(name))
}

/// Go export rule: the name starts with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Upper-case the first character.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Caller-side wrapper type name: `<prefix><Package><Decl>`, e.g. `SeqTestpkgS`.
pub fn wrapper_name(prefix: &str, package: &str, decl: &str) -> String {
    format!("{prefix}{}{decl}", capitalize(package))
}

/// Name of the `index`-th parameter in generated code. Names that are empty,
/// blank, look like a synthesized name, or could shadow a generated local
/// (all judged after snake-casing) are replaced by `p<index>`.
pub fn param_name(index: usize, name: &str) -> String {
    if name.is_empty() || name == "_" {
        return format!("p{index}");
    }
    let snake = to_snake_case(name);
    if is_synthesized(&snake) || snake.starts_with(GENERATED_LOCAL_PREFIX) {
        return format!("p{index}");
    }
    escape_reserved(&snake)
}

// `p` followed by one or more digits.
fn is_synthesized(name: &str) -> bool {
    name.strip_prefix('p')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("TryTwoStrings"), "try_two_strings");
        assert_eq!(to_snake_case("NewS"), "new_s");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("X"), "x");
        assert_eq!(to_snake_case("URL"), "url");
        assert_eq!(to_snake_case("Int64Value"), "int64_value");
        assert_eq!(to_snake_case("timeoutSec"), "timeout_sec");
    }

    #[test]
    fn test_escape_reserved() {
        assert_eq!(escape_reserved("type"), "r#type");
        assert_eq!(escape_reserved("move"), "r#move");
        assert_eq!(escape_reserved("self"), "self_");
        assert_eq!(escape_reserved("label"), "label");
        assert_eq!(rust_ident("Type"), "r#type");
    }

    #[test]
    fn test_exported() {
        assert!(is_exported("Sum"));
        assert!(!is_exported("sum"));
        assert!(!is_exported("_X"));
        assert!(!is_exported(""));
    }

    #[test]
    fn test_wrapper_name() {
        assert_eq!(wrapper_name("Seq", "testpkg", "S"), "SeqTestpkgS");
        assert_eq!(wrapper_name("", "testpkg", "Greeter"), "TestpkgGreeter");
    }

    #[test]
    fn test_param_name_synthesis() {
        assert_eq!(param_name(0, ""), "p0");
        assert_eq!(param_name(1, "_"), "p1");
        assert_eq!(param_name(2, "p0"), "p2");
        assert_eq!(param_name(3, "seq_in"), "p3");
        assert_eq!(param_name(0, "p"), "p");
        assert_eq!(param_name(0, "p1x"), "p1x");
        assert_eq!(param_name(0, "type"), "r#type");
        assert_eq!(param_name(0, "timeoutSec"), "timeout_sec");
        assert_eq!(param_name(1, "P0"), "p1");
        assert_eq!(param_name(2, "SeqIn"), "p2");
    }
}
