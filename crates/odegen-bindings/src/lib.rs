//! odegen Bindings
//!
//! Back ends turning parsed headers into binding glue.
//!
//! ## Modules
//!
//! - `naming` - Exposed names and type helpers shared by all back ends
//! - `embind` - Emscripten `EMSCRIPTEN_BINDINGS` sources
//! - `napi` - Node-API addon glue
//! - `typescript` - TypeScript declaration files
//! - `artifact` - Rendered files and change-aware writing

pub mod artifact;
pub mod embind;
pub mod naming;
pub mod napi;
pub mod typescript;

pub use artifact::{stale_artifacts, write_artifacts, Artifact, WriteReport};
pub use embind::EmbindGenerator;
pub use napi::NapiGenerator;
pub use typescript::TypeScriptGenerator;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use odegen_core::{Dialect, Entity, EntityCategory, Error, MemberCategory, OutputConfig, Result};
use odegen_parser::{common_enum_prefix_len, DirectionClassifier, ParsedHeader, PointerUsage};
use tracing::{debug, info};

/// Everything a back end needs besides the entities themselves
pub struct BindingContext<'a> {
    pub dialect: &'a Dialect,
    /// Pointer usage across all headers of the run
    pub pointer_usage: &'a PointerUsage,
    pub directions: DirectionClassifier,
    pub generator_name: &'a str,
    /// First header of the run declaring each array instance
    array_instance_owners: HashMap<String, &'a Path>,
}

impl<'a> BindingContext<'a> {
    pub fn new(dialect: &'a Dialect, pointer_usage: &'a PointerUsage, generator_name: &'a str) -> Self {
        Self {
            dialect,
            pointer_usage,
            directions: DirectionClassifier::new(dialect),
            generator_name,
            array_instance_owners: HashMap::new(),
        }
    }

    /// Record the headers of the run. Array instances declared by several
    /// headers are then bound by the first one only, since Emscripten
    /// rejects registering one type name twice in a module.
    pub fn with_headers(mut self, headers: &'a [ParsedHeader]) -> Self {
        for header in headers {
            for entity in &header.entities {
                if entity.category == EntityCategory::ArrayInstance {
                    self.array_instance_owners
                        .entry(entity.qualified_name())
                        .or_insert(header.path.as_path());
                }
            }
        }
        self
    }

    /// Whether the header at `header_path` binds an array instance
    pub fn binds_array_instance(&self, entity: &Entity, header_path: &Path) -> bool {
        self.array_instance_owners
            .get(&entity.qualified_name())
            .map_or(true, |owner| *owner == header_path)
    }

    /// Name the entity is exposed under, e.g. `LayerList_Entry`
    pub fn exposed_name(&self, entity: &Entity) -> String {
        naming::js_type_name(self.dialect, &entity.qualified_name())
    }

    /// A struct that is copied by value: not used behind pointers in the
    /// API and made of plain, non-pointer fields only
    pub fn is_value_object(&self, entity: &Entity) -> bool {
        entity.category == EntityCategory::Struct
            && !entity.members.is_empty()
            && !self.pointer_usage.contains(&entity.qualified_name())
            && entity
                .members
                .iter()
                .all(|m| m.category == MemberCategory::MemberVariable && !m.type_str().contains('*'))
    }

    pub fn enum_prefix_len(&self, entity: &Entity) -> usize {
        common_enum_prefix_len(entity, &self.dialect.enum_value_prefix)
    }

    /// First line(s) of every generated file
    pub fn preamble(&self) -> String {
        format!("\n// FILE GENERATED BY {}\n", self.generator_name)
    }
}

/// A binding back end
pub trait Generator: Send + Sync {
    /// Back end name used in logs
    fn name(&self) -> &str;

    /// Render the artifacts of one header
    fn render_header(&self, ctx: &BindingContext<'_>, header: &ParsedHeader) -> Result<Vec<Artifact>>;

    /// Render artifacts covering all headers of the run
    fn render_aggregate(&self, _ctx: &BindingContext<'_>, _headers: &[ParsedHeader]) -> Result<Vec<Artifact>> {
        Ok(Vec::new())
    }
}

/// Back ends enabled by the output configuration. Emscripten bindings are
/// always generated; N-API and TypeScript output need their directory.
pub fn generators(output: &OutputConfig) -> Vec<Box<dyn Generator>> {
    let mut generators: Vec<Box<dyn Generator>> = vec![Box::new(EmbindGenerator::new(output.embind_dir.clone()))];
    if let Some(dir) = &output.napi_dir {
        generators.push(Box::new(NapiGenerator::new(dir.clone())));
    }
    if let Some(dir) = &output.typescript_dir {
        generators.push(Box::new(TypeScriptGenerator::new(dir.clone())));
    }
    generators
}

/// Render every artifact of a run in memory.
///
/// Every function is validated before any back end runs, so a binding
/// error fails the run whichever back ends are enabled. Nothing has been
/// written at that point.
pub fn render_all(
    generators: &[Box<dyn Generator>],
    ctx: &BindingContext<'_>,
    headers: &[ParsedHeader],
) -> Result<Vec<Artifact>> {
    check_functions(ctx, headers)?;

    let mut artifacts = Vec::new();
    for generator in generators {
        for header in headers {
            let rendered = generator.render_header(ctx, header)?;
            debug!("{}: {} artifacts for {}", generator.name(), rendered.len(), header.path.display());
            artifacts.extend(rendered);
        }
        artifacts.extend(generator.render_aggregate(ctx, headers)?);
    }

    let mut paths = HashSet::new();
    for artifact in &artifacts {
        if !paths.insert(artifact.path.as_path()) {
            return Err(Error::Config(format!(
                "more than one artifact targets {}",
                artifact.path.display()
            )));
        }
    }

    info!("Rendered {} artifacts", artifacts.len());
    Ok(artifacts)
}

/// Reject functions whose arguments cannot be bound
pub fn check_functions(ctx: &BindingContext<'_>, headers: &[ParsedHeader]) -> Result<()> {
    for header in headers {
        for function in header.entities.iter().filter(|e| e.category == EntityCategory::Function) {
            ctx.directions.check_function(function)?;
        }
    }
    Ok(())
}
