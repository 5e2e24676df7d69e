//! Header parser
//!
//! Walks a header with the declaration grammar and assembles the flat,
//! namespace-annotated entity list.

use std::collections::HashSet;
use std::path::Path;

use odegen_core::{Dialect, Entity, EntityCategory, Member, MemberCategory, Result};
use tracing::{debug, trace};

use crate::cursor::Cursor;
use crate::declarator::{
    array_instance_name, array_type, guess_number_type, implicit_enum_value, nested_member_type,
    parse_declarator, parse_enum_value, split_argument,
};
use crate::grammar::{BodyItem, Compound, Decl, Grammar};
use crate::pointer_usage::PointerUsage;
use crate::sanitize::{
    collapse_line_continuations, extract_argument_descriptions, leading_description, safe_split,
};
use crate::ParsedHeader;

/// Entities collected while walking one header
#[derive(Default)]
struct ParseState {
    entities: Vec<Entity>,
    array_instances: HashSet<String>,
}

impl ParseState {
    fn push(&mut self, entity: Entity) {
        trace!("{} {}", entity.category, entity.qualified_name());
        self.entities.push(entity);
    }

    /// Register the synthesized type of a fixed-size array member and
    /// return its name
    fn array_instance(&mut self, element_type: &str, dims: &[String]) -> String {
        let name = array_instance_name(element_type, dims);
        if self.array_instances.insert(name.clone()) {
            self.push(Entity::new(
                EntityCategory::ArrayInstance,
                Some(array_type(element_type, dims)),
                name.clone(),
            ));
        }
        name
    }
}

/// Parser for headers written in one dialect
pub struct HeaderParser {
    grammar: Grammar,
}

impl HeaderParser {
    /// Create a new header parser for a dialect
    pub fn new(dialect: &Dialect) -> Result<Self> {
        Ok(Self {
            grammar: Grammar::new(dialect)?,
        })
    }

    /// Parse header text into entities, in source order. Unrecognized
    /// text is skipped.
    pub fn parse(&self, source: &str) -> Vec<Entity> {
        let text = collapse_line_continuations(source);
        let mut state = ParseState::default();
        let mut description: Option<String> = None;
        let mut cursor = Cursor::new(&text);

        while !cursor.is_eof() {
            let Some((decl, len)) = self.grammar.next_decl(cursor) else {
                if ends_statement(cursor) {
                    description = None;
                }
                cursor.skip_token();
                continue;
            };
            cursor.advance(len);

            match decl {
                Decl::DocComment(doc) => {
                    description = Some(doc);
                    continue;
                }
                Decl::Skip => {}
                Decl::Define { name, value } => {
                    let entity = Entity::new(
                        EntityCategory::Define,
                        Some(guess_number_type(value).to_string()),
                        name,
                    );
                    state.push(entity.with_description(description.take()));
                }
                Decl::Const { type_name, name } => {
                    let entity = Entity::new(EntityCategory::Const, Some(type_name.to_string()), name);
                    state.push(entity.with_description(description.take()));
                }
                Decl::Typedef { type_name, name, dims } => {
                    let dims: String = dims.chars().filter(|c| !c.is_whitespace()).collect();
                    let entity = Entity::new(
                        EntityCategory::Typedef,
                        Some(format!("{}{}", type_name, dims)),
                        name,
                    );
                    state.push(entity.with_description(description.take()));
                }
                Decl::Handle { tag, name } => {
                    let entity = Entity::new(EntityCategory::Handle, Some(tag.to_string()), name);
                    state.push(entity.with_description(description.take()));
                }
                Decl::Enum(compound) => {
                    if let Some(entity) = self.parse_enum(&compound) {
                        state.push(entity.with_description(description.take()));
                    }
                }
                Decl::Struct(compound) => {
                    if let Some(entity) = self.parse_struct(&mut state, &compound, description.take(), &[]) {
                        state.push(entity);
                    }
                }
                Decl::Function { return_type, name, args } => {
                    let entity = self.parse_function(return_type, name, args, description.take());
                    state.push(entity);
                }
            }
            description = None;
        }

        debug!("Parsed {} entities", state.entities.len());
        state.entities
    }

    /// Parse a header file
    pub fn parse_file(&self, path: &Path) -> Result<ParsedHeader> {
        let source = std::fs::read_to_string(path)?;
        let entities = self.parse(&source);
        let pointer_usage = PointerUsage::collect(&entities);
        Ok(ParsedHeader {
            path: path.to_path_buf(),
            entities,
            pointer_usage,
        })
    }

    fn parse_enum(&self, compound: &Compound<'_>) -> Option<Entity> {
        let Some(name) = compound.resolved_name() else {
            debug!("Skipping unnamed enum");
            return None;
        };

        let mut values = Vec::new();
        let mut previous: Option<Option<String>> = None;
        for piece in safe_split(compound.body, ',') {
            let Some(parsed) = parse_enum_value(&piece) else {
                continue;
            };
            let value = parsed
                .value
                .or_else(|| implicit_enum_value(previous.as_ref().map(|p| p.as_deref())));
            previous = Some(value.clone());
            values.push(Member::new(
                MemberCategory::EnumValue,
                None,
                parsed.name,
                value,
                parsed.description,
            ));
        }

        Some(Entity::new(EntityCategory::Enum, None, name).with_members(values))
    }

    /// Parse a struct body. Nested entities are appended to `state` as they
    /// are completed, before the returned parent.
    fn parse_struct(
        &self,
        state: &mut ParseState,
        compound: &Compound<'_>,
        description: Option<String>,
        namespace: &[String],
    ) -> Option<Entity> {
        let name = compound.resolved_name();
        let mut child_namespace = namespace.to_vec();
        child_namespace.extend(name.map(str::to_string));

        let mut category = EntityCategory::Struct;
        let mut members = Vec::new();
        let mut member_description: Option<String> = None;
        let mut cursor = Cursor::new(compound.body);

        while !cursor.is_eof() {
            let Some((item, len)) = self.grammar.next_body_item(cursor) else {
                if ends_statement(cursor) {
                    member_description = None;
                }
                cursor.skip_token();
                continue;
            };
            cursor.advance(len);

            match item {
                BodyItem::DocComment(doc) => {
                    member_description = Some(doc);
                    continue;
                }
                BodyItem::Skip => {}
                BodyItem::TupleMarker => category = EntityCategory::Tuple,
                BodyItem::Constructor { params, expression } => members.push(Member::new(
                    MemberCategory::ConstructorBind,
                    Some(params),
                    expression,
                    None,
                    member_description.take(),
                )),
                BodyItem::Method { signature, name, expression } => members.push(Member::new(
                    MemberCategory::MethodBind,
                    Some(signature),
                    name,
                    Some(expression.to_string()),
                    member_description.take(),
                )),
                BodyItem::PtrGetter { name, field } => members.push(Member::new(
                    MemberCategory::PtrGetterBind,
                    None,
                    name,
                    Some(field.to_string()),
                    member_description.take(),
                )),
                BodyItem::ArrayGetter { name, array_field, length_field } => members.push(Member::new(
                    MemberCategory::ArrayGetterBind,
                    None,
                    name,
                    Some(format!("{},{}", array_field, length_field)),
                    member_description.take(),
                )),
                BodyItem::Enum(nested) => {
                    if let Some(entity) = self.parse_enum(&nested) {
                        let entity = entity
                            .with_namespace(child_namespace.clone())
                            .with_description(member_description.clone());
                        if let Some(variable) = nested.variable() {
                            members.push(Member::new(
                                MemberCategory::MemberVariable,
                                Some(nested_member_type(
                                    nested.qualifier,
                                    &entity.qualified_name(),
                                    nested.declarator_sigils(),
                                )),
                                variable,
                                None,
                                member_description.clone(),
                            ));
                        }
                        state.push(entity);
                    }
                }
                BodyItem::Struct(nested) => {
                    let nested_entity =
                        self.parse_struct(state, &nested, member_description.clone(), &child_namespace);
                    if let Some(entity) = nested_entity {
                        if let Some(variable) = nested.variable() {
                            members.push(Member::new(
                                MemberCategory::MemberVariable,
                                Some(nested_member_type(
                                    nested.qualifier,
                                    &entity.qualified_name(),
                                    nested.declarator_sigils(),
                                )),
                                variable,
                                None,
                                member_description.clone(),
                            ));
                        }
                        state.push(entity);
                    }
                }
                BodyItem::Variables { base_type, declarators } => {
                    for raw in declarators.split(',') {
                        let Some(declarator) = parse_declarator(raw) else {
                            continue;
                        };
                        let mut member_type = declarator.member_type(base_type);
                        if !declarator.dims.is_empty() {
                            member_type = state.array_instance(&member_type, &declarator.dims);
                        }
                        members.push(Member::new(
                            MemberCategory::MemberVariable,
                            Some(member_type),
                            declarator.name,
                            None,
                            member_description.clone(),
                        ));
                    }
                }
            }
            member_description = None;
        }

        let Some(name) = name else {
            debug!("Skipping unnamed struct");
            return None;
        };
        Some(
            Entity::new(category, None, name)
                .with_namespace(namespace.to_vec())
                .with_description(description)
                .with_members(members),
        )
    }

    fn parse_function(&self, return_type: &str, name: &str, args: &str, description: Option<String>) -> Entity {
        let (description, param_docs) = match description {
            Some(text) => {
                let (rest, params) = extract_argument_descriptions(&text);
                (Some(rest).filter(|r| !r.is_empty()), params)
            }
            None => Default::default(),
        };

        let arguments = safe_split(args, ',')
            .iter()
            .filter_map(|raw| {
                let (arg_type, arg_name) = split_argument(raw)?;
                let arg_description = leading_description(raw).or_else(|| param_docs.get(&arg_name).cloned());
                Some(Member::new(
                    MemberCategory::Argument,
                    Some(arg_type),
                    arg_name,
                    None,
                    arg_description,
                ))
            })
            .collect();

        Entity::new(EntityCategory::Function, Some(return_type.to_string()), name)
            .with_description(description)
            .with_members(arguments)
    }
}

/// Unrecognized declarations do not pass their documentation on
fn ends_statement(cursor: Cursor<'_>) -> bool {
    cursor.rest().starts_with([';', '}'])
}
