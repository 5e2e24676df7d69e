//! TypeScript declarations
//!
//! Renders a `<stem>.d.ts` per header describing the objects the bindings
//! export, and `ode.d.ts` which declares the module loader and re-exports
//! every declared type.

use std::collections::HashSet;
use std::path::PathBuf;

use odegen_core::{find_member_type, Entity, EntityCategory, MemberCategory, Result};
use odegen_parser::{stripped_value_name, ParsedHeader};

use crate::artifact::Artifact;
use crate::naming::{array_getter_fields, bound_array, data_ptr_type, js_type_name, pointee_type};
use crate::{BindingContext, Generator};

const PADDING: &str = "    ";

const LOADER: &str = r#"
import * as ODE from "./exports.js";
export type ODE = typeof ODE;

export type LoadODEOptions = {
    locateFile?: () => string;
};

export default function loadODE(options?: LoadODEOptions): Promise<ODE>;
export const version: string;
"#;

/// TypeScript back end
pub struct TypeScriptGenerator {
    output_dir: PathBuf,
}

impl TypeScriptGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

impl Generator for TypeScriptGenerator {
    fn name(&self) -> &str {
        "typescript"
    }

    fn render_header(&self, ctx: &BindingContext<'_>, header: &ParsedHeader) -> Result<Vec<Artifact>> {
        let declarations = render(ctx, &header.entities);
        Ok(vec![Artifact::new(
            self.output_dir.join(format!("{}.d.ts", header.stem())),
            format!("{}{}", ctx.preamble(), declarations.text),
        )])
    }

    fn render_aggregate(&self, ctx: &BindingContext<'_>, headers: &[ParsedHeader]) -> Result<Vec<Artifact>> {
        let mut seen = HashSet::new();
        let mut contents = format!("{}{}\nexport {{\n", ctx.preamble(), LOADER);
        for header in headers {
            for name in render(ctx, &header.entities).types {
                if seen.insert(name.clone()) {
                    contents.push_str(&format!("{}type {},\n", PADDING, name));
                }
            }
        }
        contents.push_str("} from \"./exports.js\";\n");
        Ok(vec![Artifact::new(self.output_dir.join("ode.d.ts"), contents)])
    }
}

/// Declarations of one header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    pub text: String,
    /// Names of declared types, in declaration order
    pub types: Vec<String>,
}

/// Render the declarations of a header's entities
pub fn render(ctx: &BindingContext<'_>, entities: &[Entity]) -> Declarations {
    let mut out = Declarations {
        text: String::from(
            "\nimport { EngineSymbol, Enum, EnumValue } from \"./internal.js\";\nimport * as ode from \"./exports.js\";\n\n",
        ),
        types: Vec::new(),
    };

    let mut previous: Option<EntityCategory> = None;
    for entity in entities {
        let name = ctx.exposed_name(entity);
        let text = &mut out.text;

        if let Some((element, len)) = bound_array(entity) {
            out.types.push(name.clone());
            let element_type = ts_type(ctx, element);
            let description = entity
                .description
                .clone()
                .unwrap_or_else(|| format!("An array of {} {}s", len, element));
            text.push_str(&ts_description(Some(description.as_str()), ""));
            text.push_str(&format!("export type {} = readonly [\n", name));
            for _ in 0..len {
                text.push_str(&format!("{}{},\n", PADDING, element_type));
            }
            text.push_str("];\n\n");
            previous = Some(entity.category);
            continue;
        }

        match entity.category {
            EntityCategory::Define | EntityCategory::Const => {
                // Consecutive constants are not separated by blank lines
                if previous == Some(entity.category) {
                    text.pop();
                }
                text.push_str(&ts_description(entity.description.as_deref(), ""));
                text.push_str(&format!("export const {}: {};\n\n", name, ts_type(ctx, entity.type_str())));
            }
            EntityCategory::Enum => {
                out.types.push(name.clone());
                enum_declaration(ctx, text, entity, &name);
            }
            EntityCategory::Handle => {
                out.types.push(name.clone());
                text.push_str(&ts_description(entity.description.as_deref(), ""));
                text.push_str(&format!("export const {0}: {{ new (): ode.{0} }};\n", name));
                text.push_str(&format!("export type {} = {{\n", name));
                text.push_str(&format!("{}[EngineSymbol]: \"{}\";\n", PADDING, name));
                text.push_str(&format!("{}constructor();\n", PADDING));
                text.push_str(&format!("{}delete(): void;\n", PADDING));
                text.push_str("};\n\n");
            }
            EntityCategory::Struct if ctx.is_value_object(entity) => {
                out.types.push(name.clone());
                text.push_str(&ts_description(entity.description.as_deref(), ""));
                text.push_str(&format!("export type {} = {{\n", name));
                for member in entity.members_of(MemberCategory::MemberVariable) {
                    text.push_str(&ts_description(member.description.as_deref(), PADDING));
                    text.push_str(&format!("{}{}: {};\n", PADDING, member.name, ts_type(ctx, member.type_str())));
                }
                text.push_str("};\n\n");
            }
            EntityCategory::Struct => {
                out.types.push(name.clone());
                class_declaration(ctx, text, entity, &name);
            }
            EntityCategory::Tuple => {
                out.types.push(name.clone());
                text.push_str(&ts_description(entity.description.as_deref(), ""));
                let elements: Vec<String> = entity
                    .members_of(MemberCategory::MemberVariable)
                    .map(|m| format!("\n{}{}: {}", PADDING, m.name, ts_type(ctx, m.type_str())))
                    .collect();
                text.push_str(&format!("export type {} = readonly [{}\n];\n\n", name, elements.join(",")));
            }
            EntityCategory::Function => function_declaration(ctx, text, entity, &name),
            EntityCategory::Typedef | EntityCategory::ArrayInstance => {}
        }
        previous = Some(entity.category);
    }

    out.text.pop();
    out
}

fn enum_declaration(ctx: &BindingContext<'_>, text: &mut String, entity: &Entity, name: &str) {
    let prefix_len = ctx.enum_prefix_len(entity);
    text.push_str(&ts_description(entity.description.as_deref(), ""));
    text.push_str(&format!("export const {0}: Enum<{0}_Map>;\n", name));
    text.push_str(&format!("export type {0} = EnumValue<{0}_Index>;\n", name));
    text.push_str(&format!("export type {0}_Index = {0}_Map[keyof {0}_Map];\n", name));
    text.push_str(&format!("export type {}_Map = {{\n", name));
    for value in entity.members_of(MemberCategory::EnumValue) {
        text.push_str(&ts_description(value.description.as_deref(), PADDING));
        text.push_str(&format!(
            "{}{}: {};\n",
            PADDING,
            stripped_value_name(&value.name, prefix_len),
            ts_enum_value(value.value.as_deref())
        ));
    }
    text.push_str("};\n\n");
}

fn class_declaration(ctx: &BindingContext<'_>, text: &mut String, entity: &Entity, name: &str) {
    let constructor_args = entity
        .members_of(MemberCategory::ConstructorBind)
        .next()
        .map(|c| ts_arguments(ctx, c.type_str()))
        .unwrap_or_default();
    text.push_str(&ts_description(entity.description.as_deref(), ""));
    text.push_str(&format!("export const {0}: {{ new ({1}): ode.{0} }};\n", name, constructor_args));
    text.push_str(&format!("export type {} = {{\n", name));
    text.push_str(&format!("{}[EngineSymbol]: \"{}\";\n", PADDING, name));

    for member in &entity.members {
        let description = ts_description(member.description.as_deref(), PADDING);
        match member.category {
            MemberCategory::ConstructorBind => {
                text.push_str(&format!("{}constructor();\n", PADDING));
            }
            MemberCategory::MemberVariable if !member.type_str().contains('*') => {
                text.push_str(&description);
                text.push_str(&format!("{}{}: {};\n", PADDING, member.name, ts_type(ctx, member.type_str())));
            }
            MemberCategory::MethodBind => {
                let signature = member.type_str();
                let return_type = signature.split('(').next().unwrap_or_default();
                text.push_str(&description);
                text.push_str(&format!(
                    "{}{}({}): {};\n",
                    PADDING,
                    member.name,
                    ts_arguments(ctx, signature),
                    ts_type(ctx, return_type)
                ));
            }
            MemberCategory::PtrGetterBind => {
                let ptr_type = data_ptr_type(ctx.dialect, entity, member.value.as_deref().unwrap_or_default());
                text.push_str(&description);
                text.push_str(&format!("{}{}(): {};\n", PADDING, member.name, ts_type(ctx, ptr_type)));
            }
            MemberCategory::ArrayGetterBind => {
                let element = member
                    .value
                    .as_deref()
                    .and_then(array_getter_fields)
                    .and_then(|(array, _)| find_member_type(&entity.members, array))
                    .and_then(pointee_type);
                if let Some(element) = element {
                    text.push_str(&description);
                    text.push_str(&format!(
                        "{}{}(i: ode.Int): {};\n",
                        PADDING,
                        member.name,
                        ts_type(ctx, element)
                    ));
                }
            }
            _ => {}
        }
    }
    text.push_str(&format!("{}delete(): void;\n", PADDING));
    text.push_str("};\n\n");
}

/// Functions return `void` for status results; an `OUT_RETURN` argument
/// becomes the return type instead of a parameter.
fn function_declaration(ctx: &BindingContext<'_>, text: &mut String, entity: &Entity, name: &str) {
    let mut return_type = if entity.type_str() == ctx.dialect.result_type || entity.type_str() == "void" {
        "void".to_string()
    } else {
        ts_type(ctx, entity.type_str())
    };

    let mut doc: Vec<String> = entity.description.iter().cloned().collect();
    let mut returns = Vec::new();
    let mut params = String::new();
    for arg in entity.members_of(MemberCategory::Argument) {
        let is_return = ctx.directions.classify(arg.type_str()).direction.is_return();
        if is_return {
            return_type = ts_type(ctx, arg.type_str());
        } else {
            params.push_str(&format!("{}{}: {},\n", PADDING, arg.name, ts_type(ctx, arg.type_str())));
        }
        if let Some(description) = &arg.description {
            if is_return {
                returns.push(format!("@returns {} {}", arg.name, description));
            } else {
                doc.push(format!("@param {} {}", arg.name, description));
            }
        }
    }
    doc.extend(returns);

    let doc = doc.join("\n");
    text.push_str(&ts_description(Some(doc.as_str()).filter(|d| !d.is_empty()), ""));
    text.push_str(&format!("export function {}(\n{}): {};\n\n", name, params, return_type));
}

/// TypeScript type of a C type: qualifiers and pointers dropped and the
/// exposed name capitalized inside the `ode` namespace, e.g.
/// `const ODE_StringRef *` -> `ode.StringRef`
pub fn ts_type(ctx: &BindingContext<'_>, c_type: &str) -> String {
    let bare = ctx.directions.strip_marker(c_type);
    let words: Vec<&str> = bare
        .split(|c: char| c == '*' || c == '&' || c.is_whitespace())
        .filter(|w| !w.is_empty() && *w != "const")
        .collect();
    let exposed = js_type_name(ctx.dialect, &words.join("_"));
    let mut chars = exposed.chars();
    match chars.next() {
        Some(first) => format!("ode.{}{}", first.to_uppercase(), chars.as_str()),
        None => "unknown".to_string(),
    }
}

/// Parameter list of a bound signature such as `(const std::string &str)`
/// or `ODE_StringRef()`. Unnamed parameters are called `arg<i>`.
fn ts_arguments(ctx: &BindingContext<'_>, signature: &str) -> String {
    let Some((_, params)) = signature.split_once('(') else {
        return String::new();
    };
    params
        .replace(')', "")
        .split(',')
        .enumerate()
        .filter(|(_, param)| !param.trim().is_empty())
        .map(|(i, param)| {
            let words: Vec<&str> = param
                .split(|c: char| c == '*' || c == '&' || c.is_whitespace())
                .filter(|w| !w.is_empty() && *w != "const")
                .collect();
            match words.split_last() {
                Some((name, type_words)) if !type_words.is_empty() => {
                    format!("{}: {}", name, ts_type(ctx, &type_words.join(" ")))
                }
                _ => format!("arg{}: {}", i, ts_type(ctx, &words.join(" "))),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Integer literals are kept as literal types; anything else (expressions,
/// references to other enumerators, unknown values) is a plain `number`
fn ts_enum_value(value: Option<&str>) -> String {
    let Some(value) = value.map(str::trim) else {
        return "number".to_string();
    };
    let literal = value.trim_end_matches(['u', 'U', 'l', 'L']);
    let digits = literal.strip_prefix('-').unwrap_or(literal);
    let is_integer = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
    };
    if is_integer {
        literal.to_string()
    } else {
        "number".to_string()
    }
}

/// JSDoc comment; single lines stay on one line
fn ts_description(description: Option<&str>, padding: &str) -> String {
    let Some(description) = description else {
        return String::new();
    };
    if description.contains('\n') {
        let separator = format!("\n{} * ", padding);
        format!(
            "{0}/**\n{0} * {1}\n{0} */\n",
            padding,
            description.split('\n').collect::<Vec<_>>().join(&separator)
        )
    } else {
        format!("{}/** {} */\n", padding, description)
    }
}
