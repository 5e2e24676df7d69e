//! Declaration rules
//!
//! The grammar is a fixed-priority list of anchored rules. At each position
//! the rules are tried in order and the first one that matches wins; each
//! rule yields a tagged result together with the number of bytes consumed.

use odegen_core::{Dialect, Error, Result};
use regex::{Captures, Regex};

use crate::cursor::Cursor;
use crate::sanitize::{doc_block_text, doc_lines_text, matching_delimiter, split_top_level};

/// A `struct`/`enum` with a brace-delimited body, e.g.
/// `typedef struct Tag { ... } Name;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compound<'t> {
    /// `typedef` or `const` in front of the keyword
    pub qualifier: Option<&'t str>,
    pub tag: &'t str,
    pub body: &'t str,
    /// Text between the closing brace and the semicolon, e.g. `*entries`
    pub declarator: &'t str,
}

impl<'t> Compound<'t> {
    pub fn is_typedef(&self) -> bool {
        self.qualifier == Some("typedef")
    }

    /// Identifier of the trailing declarator without pointer sigils
    pub fn declared_name(&self) -> &'t str {
        self.declarator.trim_start_matches(|c: char| c == '*' || c.is_whitespace())
    }

    /// Pointer sigils of the trailing declarator
    pub fn declarator_sigils(&self) -> &'t str {
        let name_len = self.declared_name().len();
        self.declarator[..self.declarator.len() - name_len].trim()
    }

    /// Name the compound is known by: for a typedef the declared name wins
    /// over the tag, otherwise the tag wins.
    pub fn resolved_name(&self) -> Option<&'t str> {
        let (first, second) = if self.is_typedef() {
            (self.declared_name(), self.tag)
        } else {
            (self.tag, self.declared_name())
        };
        [first, second].into_iter().find(|name| !name.is_empty())
    }

    /// Member variable declared together with a non-typedef compound
    pub fn variable(&self) -> Option<&'t str> {
        let name = self.declared_name();
        (!self.is_typedef() && !name.is_empty()).then_some(name)
    }
}

/// File-scope declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl<'t> {
    Define { name: &'t str, value: &'t str },
    Const { type_name: &'t str, name: &'t str },
    Enum(Compound<'t>),
    Typedef { type_name: &'t str, name: &'t str, dims: &'t str },
    Handle { tag: &'t str, name: &'t str },
    Struct(Compound<'t>),
    Function { return_type: &'t str, name: &'t str, args: &'t str },
    DocComment(String),
    /// Directive or plain comment
    Skip,
}

/// Declaration inside a struct body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem<'t> {
    TupleMarker,
    Constructor { params: String, expression: &'t str },
    Method { signature: String, name: &'t str, expression: &'t str },
    PtrGetter { name: &'t str, field: &'t str },
    ArrayGetter { name: &'t str, array_field: &'t str, length_field: &'t str },
    Enum(Compound<'t>),
    Struct(Compound<'t>),
    Variables { base_type: &'t str, declarators: &'t str },
    DocComment(String),
    Skip,
}

type DeclRule = for<'t> fn(&Grammar, Cursor<'t>) -> Option<(Decl<'t>, usize)>;
type BodyRule = for<'t> fn(&Grammar, Cursor<'t>) -> Option<(BodyItem<'t>, usize)>;

const DECL_RULES: &[DeclRule] = &[
    Grammar::define,
    Grammar::constant,
    Grammar::enum_decl,
    Grammar::typedef,
    Grammar::handle,
    Grammar::struct_decl,
    Grammar::function,
    Grammar::doc_comment,
    Grammar::skip,
];

const BODY_RULES: &[BodyRule] = &[
    Grammar::tuple_marker,
    Grammar::constructor_bind,
    Grammar::method_bind,
    Grammar::ptr_getter_bind,
    Grammar::array_getter_bind,
    Grammar::nested_enum,
    Grammar::nested_struct,
    Grammar::member_variables,
    Grammar::body_doc_comment,
    Grammar::body_skip,
];

/// Compiled rule set for one header dialect
pub struct Grammar {
    define: Regex,
    constant: Regex,
    enum_head: Regex,
    struct_head: Regex,
    compound_tail: Regex,
    typedef: Regex,
    handle: Regex,
    function: Regex,
    doc_lines: Regex,
    doc_block: Regex,
    skip_line: Regex,
    skip_block: Regex,
    tuple: Regex,
    constructor_head: Regex,
    constructor_params: Regex,
    method_head: Regex,
    method_signature: Regex,
    ptr_getter: Regex,
    array_getter: Regex,
    member_variables: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Pattern(e.to_string()))
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Grammar {
    /// Compile the rule set for a dialect
    pub fn new(dialect: &Dialect) -> Result<Self> {
        let api = regex::escape(&dialect.api_marker);
        Ok(Self {
            define: compile(&format!(
                r"^#define[^\S\n]+({}[A-Z0-9_]+)[^\S\n]+([0-9+\-.][\w+\-.]*|\([^\S\n]*[0-9+\-.][\w+\-.]*[^\S\n]*\))[^\S\n]*(?://[^\n]*|/\*[^\n]*?\*/[^\S\n]*)?(?:\n|$)",
                regex::escape(&dialect.define_prefix)
            ))?,
            constant: compile(&format!(
                r"^extern\s+{}\s+(const\s+[\w\s*]+[\s*]|\w[\w\s*]*[\s*]const\s+)(\w+)(?:\s*=[^;]*)?;",
                api
            ))?,
            enum_head: compile(r"^(typedef\s+|const\s+)?enum\b\s*(\w*)\s*\{")?,
            struct_head: compile(r"^(typedef\s+|const\s+)?struct\b\s*(\w*)\s*\{")?,
            compound_tail: compile(r"^\s*((?:\*\s*)?\w*)\s*;")?,
            typedef: compile(r"^typedef\s+(\w[\w\s*]*[\s*])\s*(\w+)\s*((?:\[\s*[0-9]+\s*\]\s*)*);")?,
            handle: compile(&format!(
                r"^{}\s*\(\s*(\w+)\s*\)\s*(\w+)\s*;",
                regex::escape(&dialect.handle_marker)
            ))?,
            function: compile(&format!(
                r"(?s)^\s*([\w*][\w* \t]*[ \t*]){}\s+(\w+)\s*\(\s*(.*?)\s*\)\s*;",
                api
            ))?,
            doc_lines: compile(r"^///[^\n]*(?:\n[^\S\n]*///[^\n]*)*")?,
            doc_block: compile(r"(?s)^/\*\*.*?\*/")?,
            skip_line: compile(r"^(?:#|//)[^\n]*")?,
            skip_block: compile(r"(?s)^/\*.*?\*/")?,
            tuple: compile(&format!(r"^{}(?:\s|$)", regex::escape(&dialect.tuple_marker)))?,
            constructor_head: compile(&format!(r"^{}\s*\(", regex::escape(&dialect.bind_constructor)))?,
            constructor_params: compile(r"^\(\s*([\w\s:*&,]*?)\s*\)$")?,
            method_head: compile(&format!(r"^{}\s*\(", regex::escape(&dialect.bind_method)))?,
            method_signature: compile(r"^([\w\s:*&]+?)\s*\(\s*([\w\s:*&,]*?)\s*\)$")?,
            ptr_getter: compile(&format!(
                r"^{}\s*\(\s*(\w+)\s*,\s*(\w+)\s*\)\s*;",
                regex::escape(&dialect.bind_ptr_getter)
            ))?,
            array_getter: compile(&format!(
                r"^{}\s*\(\s*(\w+)\s*,\s*(\w+)\s*,\s*(\w+)\s*\)\s*;",
                regex::escape(&dialect.bind_array_getter)
            ))?,
            member_variables: compile(
                r"^(\w[\w\s*]*\w|\w)([\s*&]+\w+(?:\s*\[\s*\w*\s*\])*(?:\s*,[\w\s*&,\[\]]*[\w\]])?)\s*;",
            )?,
        })
    }

    /// First file-scope rule matching at the cursor
    pub fn next_decl<'t>(&self, cursor: Cursor<'t>) -> Option<(Decl<'t>, usize)> {
        if cursor.continues_word() {
            return None;
        }
        DECL_RULES
            .iter()
            .find_map(|rule| rule(self, cursor))
            .filter(|(_, len)| *len > 0)
    }

    /// First struct-body rule matching at the cursor
    pub fn next_body_item<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        if cursor.continues_word() {
            return None;
        }
        BODY_RULES
            .iter()
            .find_map(|rule| rule(self, cursor))
            .filter(|(_, len)| *len > 0)
    }

    fn compound<'t>(&self, head: &Regex, rest: &'t str) -> Option<(Compound<'t>, usize)> {
        let caps = head.captures(rest)?;
        let open = caps.get(0)?.end() - 1;
        let close = matching_delimiter(rest, open)?;
        let tail = self.compound_tail.captures(&rest[close + 1..])?;
        let end = close + 1 + tail.get(0)?.end();
        let compound = Compound {
            qualifier: caps.get(1).map(|m| m.as_str().trim()),
            tag: group(&caps, 2),
            body: rest[open + 1..close].trim(),
            declarator: group(&tail, 1).trim(),
        };
        Some((compound, end))
    }

    fn doc_text(&self, rest: &str) -> Option<(String, usize)> {
        if let Some(m) = self.doc_lines.find(rest) {
            return Some((doc_lines_text(m.as_str()), m.end()));
        }
        let m = self.doc_block.find(rest)?;
        Some((doc_block_text(m.as_str()), m.end()))
    }

    fn skip_len(&self, rest: &str) -> Option<usize> {
        self.skip_line
            .find(rest)
            .or_else(|| self.skip_block.find(rest))
            .map(|m| m.end())
    }

    // File-scope rules

    fn define<'t>(&self, cursor: Cursor<'t>) -> Option<(Decl<'t>, usize)> {
        let caps = self.define.captures(cursor.rest())?;
        let decl = Decl::Define {
            name: group(&caps, 1),
            value: group(&caps, 2),
        };
        Some((decl, caps.get(0)?.end()))
    }

    fn constant<'t>(&self, cursor: Cursor<'t>) -> Option<(Decl<'t>, usize)> {
        let caps = self.constant.captures(cursor.rest())?;
        let decl = Decl::Const {
            type_name: group(&caps, 1).trim(),
            name: group(&caps, 2),
        };
        Some((decl, caps.get(0)?.end()))
    }

    fn enum_decl<'t>(&self, cursor: Cursor<'t>) -> Option<(Decl<'t>, usize)> {
        self.compound(&self.enum_head, cursor.rest())
            .map(|(c, len)| (Decl::Enum(c), len))
    }

    fn typedef<'t>(&self, cursor: Cursor<'t>) -> Option<(Decl<'t>, usize)> {
        let caps = self.typedef.captures(cursor.rest())?;
        let decl = Decl::Typedef {
            type_name: group(&caps, 1).trim(),
            name: group(&caps, 2),
            dims: group(&caps, 3).trim(),
        };
        Some((decl, caps.get(0)?.end()))
    }

    fn handle<'t>(&self, cursor: Cursor<'t>) -> Option<(Decl<'t>, usize)> {
        let caps = self.handle.captures(cursor.rest())?;
        let decl = Decl::Handle {
            tag: group(&caps, 1),
            name: group(&caps, 2),
        };
        Some((decl, caps.get(0)?.end()))
    }

    fn struct_decl<'t>(&self, cursor: Cursor<'t>) -> Option<(Decl<'t>, usize)> {
        self.compound(&self.struct_head, cursor.rest())
            .map(|(c, len)| (Decl::Struct(c), len))
    }

    /// Exported prototypes only start at the beginning of a line, so
    /// prototypes behind other markers (e.g. `ODE_NATIVE_API`) are skipped.
    fn function<'t>(&self, cursor: Cursor<'t>) -> Option<(Decl<'t>, usize)> {
        if !cursor.at_line_start() {
            return None;
        }
        let caps = self.function.captures(cursor.rest())?;
        let decl = Decl::Function {
            return_type: group(&caps, 1).trim(),
            name: group(&caps, 2),
            args: group(&caps, 3),
        };
        Some((decl, caps.get(0)?.end()))
    }

    fn doc_comment<'t>(&self, cursor: Cursor<'t>) -> Option<(Decl<'t>, usize)> {
        self.doc_text(cursor.rest())
            .map(|(text, len)| (Decl::DocComment(text), len))
    }

    fn skip<'t>(&self, cursor: Cursor<'t>) -> Option<(Decl<'t>, usize)> {
        self.skip_len(cursor.rest()).map(|len| (Decl::Skip, len))
    }

    // Struct-body rules

    fn tuple_marker<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        let m = self.tuple.find(cursor.rest())?;
        Some((BodyItem::TupleMarker, m.end()))
    }

    /// Arguments of a binding macro with balanced parentheses, followed by `;`
    fn macro_arguments<'t>(&self, head: &Regex, rest: &'t str) -> Option<(&'t str, usize)> {
        let open = head.find(rest)?.end() - 1;
        let close = matching_delimiter(rest, open)?;
        let after = &rest[close + 1..];
        let semicolon = after.len() - after.trim_start().len();
        if !after[semicolon..].starts_with(';') {
            return None;
        }
        Some((&rest[open + 1..close], close + 1 + semicolon + 1))
    }

    fn constructor_bind<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        let (args, len) = self.macro_arguments(&self.constructor_head, cursor.rest())?;
        let parts = split_top_level(args, ',', 2);
        let &[params, expression] = parts.as_slice() else {
            return None;
        };
        let caps = self.constructor_params.captures(params)?;
        if expression.is_empty() {
            return None;
        }
        let item = BodyItem::Constructor {
            params: normalize_params(group(&caps, 1)),
            expression,
        };
        Some((item, len))
    }

    fn method_bind<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        let (args, len) = self.macro_arguments(&self.method_head, cursor.rest())?;
        let parts = split_top_level(args, ',', 3);
        let &[signature, name, expression] = parts.as_slice() else {
            return None;
        };
        let caps = self.method_signature.captures(signature)?;
        if name.is_empty() || !name.chars().all(is_ident_char) || expression.is_empty() {
            return None;
        }
        let item = BodyItem::Method {
            signature: format!("{}{}", group(&caps, 1).trim(), normalize_params(group(&caps, 2))),
            name,
            expression,
        };
        Some((item, len))
    }

    fn ptr_getter_bind<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        let caps = self.ptr_getter.captures(cursor.rest())?;
        let item = BodyItem::PtrGetter {
            name: group(&caps, 1),
            field: group(&caps, 2),
        };
        Some((item, caps.get(0)?.end()))
    }

    fn array_getter_bind<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        let caps = self.array_getter.captures(cursor.rest())?;
        let item = BodyItem::ArrayGetter {
            name: group(&caps, 1),
            array_field: group(&caps, 2),
            length_field: group(&caps, 3),
        };
        Some((item, caps.get(0)?.end()))
    }

    fn nested_enum<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        self.compound(&self.enum_head, cursor.rest())
            .map(|(c, len)| (BodyItem::Enum(c), len))
    }

    fn nested_struct<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        self.compound(&self.struct_head, cursor.rest())
            .map(|(c, len)| (BodyItem::Struct(c), len))
    }

    fn member_variables<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        let caps = self.member_variables.captures(cursor.rest())?;
        let item = BodyItem::Variables {
            base_type: group(&caps, 1).trim(),
            declarators: group(&caps, 2),
        };
        Some((item, caps.get(0)?.end()))
    }

    fn body_doc_comment<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        self.doc_text(cursor.rest())
            .map(|(text, len)| (BodyItem::DocComment(text), len))
    }

    fn body_skip<'t>(&self, cursor: Cursor<'t>) -> Option<(BodyItem<'t>, usize)> {
        self.skip_len(cursor.rest()).map(|len| (BodyItem::Skip, len))
    }
}

/// `(const std::string & str , int n)` -> `(const std::string & str,int n)`
fn normalize_params(params: &str) -> String {
    let joined = params.split(',').map(str::trim).collect::<Vec<_>>().join(",");
    format!("({})", joined)
}
