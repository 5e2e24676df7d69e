//! Declarator and literal helpers
//!
//! Small pure functions that split C declarations into type and name,
//! derive synthesized array type names and classify numeric literals.

use crate::sanitize::{doc_block_text, doc_lines_text, strip_comments};

/// Guess the C type of a numeric literal from its spelling
pub fn guess_number_type(literal: &str) -> &'static str {
    let s = literal.to_ascii_lowercase();
    let hex = s.contains('x');
    if s.contains("lf") {
        "double"
    } else if s.contains('f') && !hex {
        "float"
    } else if s.contains('.') || (s.contains('e') && !hex) {
        "double"
    } else if s.contains("ull") {
        "unsigned long long"
    } else if s.contains("ll") {
        "long long"
    } else if s.contains('u') {
        "unsigned"
    } else {
        "int"
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split a trailing identifier off `text`. Returns `(head, identifier)`.
fn trailing_identifier(text: &str) -> Option<(&str, &str)> {
    let start = text
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_ident_char(c))
        .last()
        .map(|(i, _)| i)?;
    let name = &text[start..];
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some((&text[..start], name))
}

/// One declarator of a member variable declaration, e.g. `*entries` or
/// `matrix[4][4]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    /// Pointer or reference sigils in front of the name
    pub sigils: String,
    pub name: String,
    /// Array dimensions, outermost first
    pub dims: Vec<String>,
}

impl Declarator {
    /// Member type given the base type of the declaration
    pub fn member_type(&self, base_type: &str) -> String {
        if self.sigils.is_empty() {
            base_type.to_string()
        } else {
            format!("{} {}", base_type, self.sigils)
        }
    }
}

/// Parse a single declarator
pub fn parse_declarator(raw: &str) -> Option<Declarator> {
    let mut head = raw.trim();
    let mut dims = Vec::new();
    while let Some(inner) = head.strip_suffix(']') {
        let open = inner.rfind('[')?;
        dims.push(inner[open + 1..].trim().to_string());
        head = inner[..open].trim_end();
    }
    dims.reverse();

    let (sigils, name) = trailing_identifier(head)?;
    let sigils = sigils.trim();
    if !sigils.chars().all(|c| matches!(c, '*' | '&' | ' ' | '\t')) {
        return None;
    }
    Some(Declarator {
        sigils: sigils.chars().filter(|c| !c.is_whitespace()).collect(),
        name: name.to_string(),
        dims,
    })
}

/// Split a function argument into its type (direction marker included)
/// and its name. Unnamed and array arguments yield `None`.
pub fn split_argument(raw: &str) -> Option<(String, String)> {
    let code = strip_comments(raw);
    let code = code.trim();
    let (head, name) = trailing_identifier(code)?;
    if !head.ends_with(|c: char| c.is_whitespace() || c == '*' || c == '&') {
        return None;
    }
    let type_start = head
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_ident_char(c) || c.is_whitespace() || c == '*' || c == '&')
        .last()
        .map(|(i, _)| i)?;
    let type_name = head[type_start..].trim();
    if type_name.is_empty() {
        return None;
    }
    Some((type_name.to_string(), name.to_string()))
}

/// Name of the synthesized entity for a fixed-size array type,
/// e.g. `float` + `[4][4]` -> `float_array_4_4`
pub fn array_instance_name(element_type: &str, dims: &[String]) -> String {
    let mut name = element_type
        .split(|c: char| !is_ident_char(c))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    for _ in element_type.matches('*') {
        name.push_str("_ptr");
    }
    name.push_str("_array");
    for dim in dims {
        name.push('_');
        name.extend(dim.chars().filter(|&c| is_ident_char(c)));
    }
    name
}

/// Full array type, e.g. `float[16]`
pub fn array_type(element_type: &str, dims: &[String]) -> String {
    let mut ty = element_type.to_string();
    for dim in dims {
        ty.push('[');
        ty.push_str(dim);
        ty.push(']');
    }
    ty
}

/// Type of a member variable declared together with a nested entity,
/// e.g. `struct Entry {...} *entries;` -> `ODE_LayerList::Entry *`
pub fn nested_member_type(qualifier: Option<&str>, qualified_name: &str, sigils: &str) -> String {
    let mut ty = String::new();
    if let Some(q) = qualifier.map(str::trim).filter(|q| !q.is_empty() && *q != "typedef") {
        ty.push_str(q);
        ty.push(' ');
    }
    ty.push_str(qualified_name);
    ty.push(' ');
    ty.push_str(sigils.trim());
    ty.replace("* ", "*").trim().to_string()
}

/// A single enumerator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    /// Explicit initializer expression
    pub value: Option<String>,
    pub description: Option<String>,
}

/// Parse one comma-separated piece of an enum body.
///
/// Leading documentation comments become the description; other comments
/// (e.g. a trailing `// ...` belonging to the previous enumerator) are
/// ignored.
pub fn parse_enum_value(piece: &str) -> Option<EnumValue> {
    let mut rest = piece.trim_start();
    let mut description = None;
    loop {
        if rest.starts_with("///") {
            let end = rest.find('\n').unwrap_or(rest.len());
            description = Some(doc_lines_text(&rest[..end]));
            rest = rest[end..].trim_start();
        } else if rest.starts_with("/**") && !rest.starts_with("/**/") {
            let end = rest[3..].find("*/").map(|i| i + 5).unwrap_or(rest.len());
            description = Some(doc_block_text(&rest[..end]));
            rest = rest[end..].trim_start();
        } else if rest.starts_with("//") {
            let end = rest.find('\n').unwrap_or(rest.len());
            rest = rest[end..].trim_start();
        } else if rest.starts_with("/*") {
            let end = rest[2..].find("*/").map(|i| i + 4).unwrap_or(rest.len());
            rest = rest[end..].trim_start();
        } else {
            break;
        }
    }

    let code = strip_comments(rest);
    let (name, value) = match code.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (code.trim(), None),
    };
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return None;
    }
    if value.is_some_and(str::is_empty) {
        return None;
    }
    Some(EnumValue {
        name: name.to_string(),
        value: value.map(str::to_string),
        description: description.filter(|d| !d.is_empty()),
    })
}

/// Value of an enumerator without initializer: one past the previous
/// integer literal, zero for the first enumerator.
pub fn implicit_enum_value(previous: Option<Option<&str>>) -> Option<String> {
    match previous {
        None => Some("0".to_string()),
        Some(value) => parse_integer(value?).map(|v| (v + 1).to_string()),
    }
}

fn parse_integer(literal: &str) -> Option<i64> {
    let s = literal.trim().trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_guess_number_type() {
        assert_eq!(guess_number_type("1.5f"), "float");
        assert_eq!(guess_number_type("0x1F"), "int");
        assert_eq!(guess_number_type("10ull"), "unsigned long long");
        assert_eq!(guess_number_type("1e3"), "double");
        assert_eq!(guess_number_type("2.0"), "double");
        assert_eq!(guess_number_type("1.0lf"), "double");
        assert_eq!(guess_number_type("3ll"), "long long");
        assert_eq!(guess_number_type("7u"), "unsigned");
        assert_eq!(guess_number_type("(-1)"), "int");
    }

    #[test]
    fn test_parse_declarator() {
        let d = parse_declarator(" *entries").unwrap();
        assert_eq!(d.sigils, "*");
        assert_eq!(d.name, "entries");
        assert!(d.dims.is_empty());
        assert_eq!(d.member_type("const char"), "const char *");

        let m = parse_declarator("matrix[4][4]").unwrap();
        assert_eq!(m.name, "matrix");
        assert_eq!(m.dims, vec!["4", "4"]);

        assert!(parse_declarator("4abc").is_none());
    }

    #[test]
    fn test_split_argument() {
        assert_eq!(
            split_argument("ODE_OUT_RETURN ODE_MemoryBuffer *buffer"),
            Some(("ODE_OUT_RETURN ODE_MemoryBuffer *".into(), "buffer".into()))
        );
        assert_eq!(
            split_argument("/** Length */ size_t length"),
            Some(("size_t".into(), "length".into()))
        );
        assert_eq!(split_argument("void"), None);
        assert_eq!(split_argument("float m[16]"), None);
    }

    #[test]
    fn test_array_names() {
        let dims = vec!["4".to_string(), "4".to_string()];
        assert_eq!(array_instance_name("float", &dims), "float_array_4_4");
        assert_eq!(array_type("float", &dims), "float[4][4]");
        assert_eq!(array_instance_name("char *", &["8".into()]), "char_ptr_array_8");
        assert_eq!(array_instance_name("ODE_Scalar", &["6".into()]), "ODE_Scalar_array_6");
    }

    #[test]
    fn test_nested_member_type() {
        assert_eq!(nested_member_type(None, "ODE_LayerList::Entry", "*"), "ODE_LayerList::Entry *");
        assert_eq!(nested_member_type(Some("const"), "Outer::inner", ""), "const Outer::inner");
        assert_eq!(nested_member_type(Some("typedef"), "Outer::Inner", ""), "Outer::Inner");
    }

    #[test]
    fn test_parse_enum_value() {
        let v = parse_enum_value("/// Parse failed\nODE_RESULT_PARSE_ERROR = 2").unwrap();
        assert_eq!(v.name, "ODE_RESULT_PARSE_ERROR");
        assert_eq!(v.value.as_deref(), Some("2"));
        assert_eq!(v.description.as_deref(), Some("Parse failed"));

        let plain = parse_enum_value("// trailing note of previous\nNEXT").unwrap();
        assert_eq!(plain.name, "NEXT");
        assert_eq!(plain.value, None);
        assert_eq!(plain.description, None);

        assert!(parse_enum_value("").is_none());
        assert!(parse_enum_value("A B").is_none());
    }

    #[test]
    fn test_implicit_enum_value() {
        assert_eq!(implicit_enum_value(None), Some("0".into()));
        assert_eq!(implicit_enum_value(Some(Some("4"))), Some("5".into()));
        assert_eq!(implicit_enum_value(Some(Some("0x0f"))), Some("16".into()));
        assert_eq!(implicit_enum_value(Some(Some("A | B"))), None);
        assert_eq!(implicit_enum_value(Some(None)), None);
    }
}
