//! Pointer usage analysis
//!
//! Collects the names of types that appear behind a pointer in any API
//! function argument. Such types cannot be exposed as plain value objects.

use std::collections::BTreeSet;

use odegen_core::{Entity, EntityCategory, MemberCategory};
use serde::{Deserialize, Serialize};

/// Set of type names used as pointers in function arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerUsage {
    types: BTreeSet<String>,
}

impl PointerUsage {
    /// Scan the arguments of all functions in `entities`
    pub fn collect<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        let mut usage = Self::default();
        for entity in entities {
            if entity.category != EntityCategory::Function {
                continue;
            }
            for arg in entity.members_of(MemberCategory::Argument) {
                usage.add_type(arg.type_str());
            }
        }
        usage
    }

    /// Record every identifier directly followed by `*` (optionally with
    /// `const` in between) in a type string
    pub fn add_type(&mut self, type_str: &str) {
        let mut previous: Vec<&str> = Vec::new();
        for token in tokenize(type_str) {
            if token == "*" {
                let pointee = match previous.as_slice() {
                    [.., ident, "const"] if is_identifier(ident) => Some(*ident),
                    [.., ident] if is_identifier(ident) => Some(*ident),
                    _ => None,
                };
                if let Some(name) = pointee {
                    self.types.insert(name.to_string());
                }
            }
            previous.push(token);
        }
    }

    /// Merge another set into this one
    pub fn extend(&mut self, other: &PointerUsage) {
        self.types.extend(other.types.iter().cloned());
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains(type_name)
    }
}

fn is_identifier(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_alphabetic())
}

/// Split a type string into identifiers and single punctuation characters
fn tokenize(type_str: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in type_str.char_indices() {
        let ident = c.is_ascii_alphanumeric() || c == '_';
        match (ident, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                tokens.push(&type_str[s..i]);
                start = None;
            }
            _ => {}
        }
        if !ident && !c.is_whitespace() {
            tokens.push(&type_str[i..i + c.len_utf8()]);
        }
    }
    if let Some(s) = start {
        tokens.push(&type_str[s..]);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use odegen_core::Member;

    fn function(args: &[&str]) -> Entity {
        let members = args
            .iter()
            .enumerate()
            .map(|(i, ty)| Member::new(MemberCategory::Argument, Some(ty.to_string()), format!("a{}", i), None, None))
            .collect();
        Entity::new(EntityCategory::Function, Some("ODE_Result".into()), "f").with_members(members)
    }

    #[test]
    fn test_collect_from_arguments() {
        let entities = vec![
            function(&["ODE_OUT_RETURN ODE_DesignHandle *", "const ODE_EngineAttributes *", "ODE_StringRef"]),
            Entity::new(EntityCategory::Typedef, Some("const char *".into()), "ODE_ConstCharPtr"),
        ];
        let usage = PointerUsage::collect(&entities);
        let names: Vec<&str> = usage.types.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["ODE_DesignHandle", "ODE_EngineAttributes"]);
    }

    #[test]
    fn test_const_between_name_and_star() {
        let mut usage = PointerUsage::default();
        usage.add_type("char const *");
        usage.add_type("ODE_X **");
        assert!(usage.contains("char"));
        assert!(usage.contains("ODE_X"));
        assert_eq!(usage.types.len(), 2);
    }

    #[test]
    fn test_no_pointer() {
        let mut usage = PointerUsage::default();
        usage.add_type("ODE_StringRef");
        assert!(usage.types.is_empty());
    }
}
