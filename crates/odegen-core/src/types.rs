//! Intermediate representation of a parsed API header

use serde::{Deserialize, Serialize};

/// Separator between namespace levels in a qualified name
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Kind of a top-level or nested declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// `#define NAME <number>`
    Define,
    /// `extern API const TYPE NAME;`
    Const,
    Enum,
    Typedef,
    /// Opaque handle declared through the handle marker macro
    Handle,
    Struct,
    /// Struct marked with the tuple marker, exposed as an array-like value
    Tuple,
    Function,
    /// Synthesized for fixed-size array members
    ArrayInstance,
}

impl EntityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Define => "define",
            EntityCategory::Const => "const",
            EntityCategory::Enum => "enum",
            EntityCategory::Typedef => "typedef",
            EntityCategory::Handle => "handle",
            EntityCategory::Struct => "struct",
            EntityCategory::Tuple => "tuple",
            EntityCategory::Function => "function",
            EntityCategory::ArrayInstance => "array_instance",
        }
    }
}

impl std::fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a sub-declaration attached to an [`Entity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberCategory {
    EnumValue,
    Argument,
    MemberVariable,
    ConstructorBind,
    MethodBind,
    PtrGetterBind,
    ArrayGetterBind,
}

impl MemberCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberCategory::EnumValue => "enum_value",
            MemberCategory::Argument => "argument",
            MemberCategory::MemberVariable => "member_variable",
            MemberCategory::ConstructorBind => "constructor_bind",
            MemberCategory::MethodBind => "method_bind",
            MemberCategory::PtrGetterBind => "ptr_getter_bind",
            MemberCategory::ArrayGetterBind => "array_getter_bind",
        }
    }
}

impl std::fmt::Display for MemberCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named declaration extracted from a header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub category: EntityCategory,
    /// Semantic type for simple entities (defines, constants, typedefs,
    /// handles, function return types, array instances)
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Enclosing entity names, outermost first
    pub namespace: Vec<String>,
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<Member>,
}

impl Entity {
    /// Create an entity without namespace, description or members
    pub fn new(category: EntityCategory, type_name: Option<String>, name: impl Into<String>) -> Self {
        Self {
            category,
            type_name,
            namespace: Vec::new(),
            name: name.into(),
            description: None,
            members: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: Vec<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    /// Fully qualified name, e.g. `ODE_LayerList::Entry`
    pub fn qualified_name(&self) -> String {
        namespaced_name(&self.namespace, &self.name)
    }

    /// Type string, or an empty string for compound entities
    pub fn type_str(&self) -> &str {
        self.type_name.as_deref().unwrap_or("")
    }

    /// Members of the given category, in declaration order
    pub fn members_of(&self, category: MemberCategory) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(move |m| m.category == category)
    }
}

/// A struct field, enum value, function argument or binding directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub category: MemberCategory,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub name: String,
    /// Enum value, bound method implementation, pointer field, or
    /// `array_field,length_field` pair
    pub value: Option<String>,
    pub description: Option<String>,
}

impl Member {
    pub fn new(
        category: MemberCategory,
        type_name: Option<String>,
        name: impl Into<String>,
        value: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            category,
            type_name,
            name: name.into(),
            value,
            description,
        }
    }

    /// Type string, or an empty string when the member carries none
    pub fn type_str(&self) -> &str {
        self.type_name.as_deref().unwrap_or("")
    }
}

/// Join a namespace chain and a name with `::`
pub fn namespaced_name<S: AsRef<str>>(namespace: &[S], name: &str) -> String {
    let mut full_name = String::new();
    for ns in namespace {
        full_name.push_str(ns.as_ref());
        full_name.push_str(NAMESPACE_SEPARATOR);
    }
    full_name.push_str(name);
    full_name
}

/// Find the type of the first typed member with the given name
pub fn find_member_type<'a>(members: &'a [Member], name: &str) -> Option<&'a str> {
    members
        .iter()
        .find(|m| m.name == name && m.type_name.as_deref().is_some_and(|t| !t.is_empty()))
        .and_then(|m| m.type_name.as_deref())
}
