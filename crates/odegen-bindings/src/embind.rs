//! Emscripten bindings
//!
//! Renders one `EMSCRIPTEN_BINDINGS` source per header, together with the
//! small accessor helpers that pointer and array getters need.

use std::path::{Path, PathBuf};

use odegen_core::{find_member_type, namespaced_name, Entity, EntityCategory, MemberCategory, Result};
use odegen_parser::{stripped_value_name, ParsedHeader};
use tracing::debug;

use crate::artifact::Artifact;
use crate::naming::{array_getter_fields, bound_array, data_ptr_type, helper_function_name, pointee_type};
use crate::{BindingContext, Generator};

/// File name used when the bindings are placed next to their header
pub const FILE_NAME: &str = "emscripten-bindings.cpp";

const PADDING: &str = "    ";

/// Emscripten back end
pub struct EmbindGenerator {
    output_dir: Option<PathBuf>,
}

impl EmbindGenerator {
    /// Without an output directory the bindings are written next to each
    /// header as `emscripten-bindings.cpp`; with one, as
    /// `emscripten-bindings-<stem>.cpp` inside it.
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self { output_dir }
    }

    fn output_path(&self, header: &ParsedHeader) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.join(format!("emscripten-bindings-{}.cpp", header.stem())),
            None => header.path.with_file_name(FILE_NAME),
        }
    }
}

impl Generator for EmbindGenerator {
    fn name(&self) -> &str {
        "embind"
    }

    fn render_header(&self, ctx: &BindingContext<'_>, header: &ParsedHeader) -> Result<Vec<Artifact>> {
        let contents = format!("{}{}", ctx.preamble(), render(ctx, header));
        Ok(vec![Artifact::new(self.output_path(header), contents)])
    }
}

/// Render the bindings source of one header
pub fn render(ctx: &BindingContext<'_>, header: &ParsedHeader) -> String {
    let mut helpers = String::new();
    let mut bindings = String::from("EMSCRIPTEN_BINDINGS(ode) {\n");

    // Constants, handles and functions are grouped into runs; every other
    // entity is set apart by a blank line
    let mut run: Option<EntityCategory> = None;
    for entity in &header.entities {
        if entity.category == EntityCategory::ArrayInstance && !ctx.binds_array_instance(entity, &header.path) {
            debug!("{} is bound with another header", entity.name);
            continue;
        }
        let Some(binding) = entity_binding(ctx, entity, &mut helpers) else {
            continue;
        };
        if run != Some(entity.category) {
            bindings.push('\n');
        }
        bindings.push_str(&binding);
        if matches!(
            entity.category,
            EntityCategory::Define | EntityCategory::Const | EntityCategory::Handle | EntityCategory::Function
        ) {
            run = Some(entity.category);
        }
    }
    bindings.push_str("\n}\n\n");

    let header_name = header.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let mut src = String::from("\n#ifdef __EMSCRIPTEN__\n#ifndef NAPI_BINDINGS\n\n");
    src.push_str("#include <array>\n");
    src.push_str("#include <emscripten/bind.h>\n");
    src.push_str(&format!("#include {}\n", utils_include(&header.path)));
    src.push_str(&format!("#include \"{}\"\n\n", header_name));
    src.push_str("using namespace emscripten;\n\n");
    src.push_str(&helpers);
    src.push_str(&bindings);
    src.push_str("#endif // NAPI_BINDINGS\n");
    src.push_str("#endif // __EMSCRIPTEN__\n");
    src
}

/// Headers next to the utilities header include it locally
fn utils_include(header_path: &Path) -> &'static str {
    if header_path.with_file_name("utils.h").is_file() {
        "\"utils.h\""
    } else {
        "<ode/utils.h>"
    }
}

fn entity_binding(ctx: &BindingContext<'_>, entity: &Entity, helpers: &mut String) -> Option<String> {
    let full = entity.qualified_name();
    let name = ctx.exposed_name(entity);

    if let Some((element, len)) = bound_array(entity) {
        let mut out = format!("{}value_array<std::array<{}, {}> >(\"{}\")", PADDING, element, len, name);
        for i in 0..len {
            out.push_str(&format!("\n{0}{0}.element(emscripten::index<{1}>())", PADDING, i));
        }
        out.push_str(";\n");
        return Some(out);
    }

    let out = match entity.category {
        EntityCategory::Define | EntityCategory::Const => {
            format!("{}constant(\"{}\", {});\n", PADDING, name, full)
        }
        EntityCategory::Enum => {
            let prefix_len = ctx.enum_prefix_len(entity);
            let mut out = format!("{}enum_<{}>(\"{}\")", PADDING, full, name);
            for value in entity.members_of(MemberCategory::EnumValue) {
                out.push_str(&format!(
                    "\n{0}{0}.value(\"{1}\", {2})",
                    PADDING,
                    stripped_value_name(&value.name, prefix_len),
                    namespaced_name(&entity.namespace, &value.name)
                ));
            }
            out.push_str(";\n");
            out
        }
        EntityCategory::Handle => {
            format!("{}class_<{}>(\"{}\").constructor<>();\n", PADDING, full, name)
        }
        EntityCategory::Struct if ctx.is_value_object(entity) => {
            let mut out = format!("{}value_object<{}>(\"{}\")", PADDING, full, name);
            for member in entity.members_of(MemberCategory::MemberVariable) {
                out.push_str(&format!(
                    "\n{0}{0}.field(\"{1}\", &{2}::{1})",
                    PADDING, member.name, full
                ));
            }
            out.push_str(";\n");
            out
        }
        EntityCategory::Struct => class_binding(ctx, entity, &full, &name, helpers),
        EntityCategory::Tuple => {
            let mut out = format!("{}value_array<{}>(\"{}\")", PADDING, full, name);
            for member in entity.members_of(MemberCategory::MemberVariable) {
                out.push_str(&format!("\n{0}{0}.element(&{1}::{2})", PADDING, full, member.name));
            }
            out.push_str(";\n");
            out
        }
        EntityCategory::Function => {
            format!("{}function(\"{}\", &{}, allow_raw_pointers());\n", PADDING, name, full)
        }
        EntityCategory::Typedef | EntityCategory::ArrayInstance => return None,
    };
    Some(out)
}

fn class_binding(
    ctx: &BindingContext<'_>,
    entity: &Entity,
    full: &str,
    name: &str,
    helpers: &mut String,
) -> String {
    let constructor = entity
        .members_of(MemberCategory::ConstructorBind)
        .next()
        .map_or("", |c| c.name.as_str());
    let mut out = format!("{}class_<{}>(\"{}\").constructor<>({})", PADDING, full, name, constructor);

    for member in &entity.members {
        match member.category {
            MemberCategory::MemberVariable if !member.type_str().contains('*') => {
                out.push_str(&format!(
                    "\n{0}{0}.property(\"{1}\", &{2}::{1})",
                    PADDING, member.name, full
                ));
            }
            MemberCategory::MethodBind => {
                out.push_str(&format!(
                    "\n{0}{0}.function(\"{1}\", {2})",
                    PADDING,
                    member.name,
                    member.value.as_deref().unwrap_or_default()
                ));
            }
            MemberCategory::PtrGetterBind => {
                let field = member.value.as_deref().unwrap_or_default();
                let ptr_type = data_ptr_type(ctx.dialect, entity, field);
                let function = helper_function_name(ctx.dialect, name, &member.name);
                out.push_str(&format!("\n{0}{0}.function(\"{1}\", &{2})", PADDING, member.name, function));
                helpers.push_str(&format!(
                    "{0} {1}(const {2} &x) {{\n{3}return reinterpret_cast<{0}>(x.{4});\n}}\n\n",
                    ptr_type, function, full, PADDING, field
                ));
            }
            MemberCategory::ArrayGetterBind => {
                let function = helper_function_name(ctx.dialect, name, &member.name);
                let Some(helper) = array_getter(ctx, entity, member.value.as_deref(), &function, full) else {
                    debug!("Skipping array getter {}::{} without a pointer field", full, member.name);
                    continue;
                };
                out.push_str(&format!("\n{0}{0}.function(\"{1}\", &{2})", PADDING, member.name, function));
                helpers.push_str(&helper);
            }
            _ => {}
        }
    }
    out.push_str(";\n");
    out
}

/// Bounds-checked element accessor; requires the array field to be a
/// pointer of known type
fn array_getter(
    ctx: &BindingContext<'_>,
    entity: &Entity,
    value: Option<&str>,
    function: &str,
    class: &str,
) -> Option<String> {
    let (array_field, length_field) = array_getter_fields(value?)?;
    let element = pointee_type(find_member_type(&entity.members, array_field)?)?;
    let element_ref = if element.contains('*') {
        format!("{} const &", element)
    } else {
        format!("const {} &", element)
    };
    Some(format!(
        "{0}{1}(const {2} &x, int i) {{\n{3}{4}(i >= 0 && i < x.{5});\n{3}return x.{6}[i];\n}}\n\n",
        element_ref, function, class, PADDING, ctx.dialect.assert_macro, length_field, array_field
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use odegen_core::{Dialect, Member};
    use odegen_parser::PointerUsage;
    use pretty_assertions::assert_eq;

    fn header(entities: Vec<Entity>) -> ParsedHeader {
        ParsedHeader {
            path: PathBuf::from("/nonexistent/ode/logic-api.h"),
            entities,
            pointer_usage: PointerUsage::default(),
        }
    }

    fn bindings_block(src: &str) -> &str {
        let start = src.find("EMSCRIPTEN_BINDINGS").unwrap();
        let end = src.find("#endif // NAPI_BINDINGS").unwrap();
        &src[start..end]
    }

    #[test]
    fn test_runs_and_separators() {
        let dialect = Dialect::default();
        let usage = PointerUsage::default();
        let ctx = BindingContext::new(&dialect, &usage, "odegen");
        let entities = vec![
            Entity::new(EntityCategory::Define, Some("int".into()), "ODE_LAYER_FLAG_VISIBLE"),
            Entity::new(EntityCategory::Define, Some("int".into()), "ODE_LAYER_FLAG_LOCKED"),
            Entity::new(EntityCategory::Typedef, Some("double".into()), "ODE_Scalar"),
            Entity::new(EntityCategory::Handle, Some("ODE_internal_Engine".into()), "ODE_EngineHandle"),
            Entity::new(EntityCategory::Handle, Some("ODE_internal_Design".into()), "ODE_DesignHandle"),
            Entity::new(EntityCategory::Function, Some("ODE_Result".into()), "ode_destroyEngine"),
        ];
        let src = render(&ctx, &header(entities));
        assert_eq!(
            bindings_block(&src),
            "EMSCRIPTEN_BINDINGS(ode) {\n\
             \n    constant(\"LAYER_FLAG_VISIBLE\", ODE_LAYER_FLAG_VISIBLE);\
             \n    constant(\"LAYER_FLAG_LOCKED\", ODE_LAYER_FLAG_LOCKED);\n\
             \n    class_<ODE_EngineHandle>(\"EngineHandle\").constructor<>();\
             \n    class_<ODE_DesignHandle>(\"DesignHandle\").constructor<>();\n\
             \n    function(\"destroyEngine\", &ode_destroyEngine, allow_raw_pointers());\n\
             \n}\n\n"
        );
        assert!(src.starts_with("\n#ifdef __EMSCRIPTEN__\n#ifndef NAPI_BINDINGS\n"));
        assert!(src.contains("#include <ode/utils.h>\n#include \"logic-api.h\"\n"));
    }

    #[test]
    fn test_enum_and_arrays() {
        let dialect = Dialect::default();
        let usage = PointerUsage::default();
        let ctx = BindingContext::new(&dialect, &usage, "odegen");
        let values = ["ODE_COLOR_SPACE_RGB", "ODE_COLOR_SPACE_CMYK"]
            .iter()
            .map(|v| Member::new(MemberCategory::EnumValue, None, *v, None, None))
            .collect();
        let entities = vec![
            Entity::new(EntityCategory::Enum, None, "ODE_ColorSpace").with_members(values),
            Entity::new(EntityCategory::ArrayInstance, Some("float[2]".into()), "float_array_2"),
            Entity::new(EntityCategory::Typedef, Some("float[3][3]".into()), "ODE_Matrix3"),
        ];
        let src = render(&ctx, &header(entities));
        assert_eq!(
            bindings_block(&src),
            "EMSCRIPTEN_BINDINGS(ode) {\n\
             \n    enum_<ODE_ColorSpace>(\"ColorSpace\")\
             \n        .value(\"RGB\", ODE_COLOR_SPACE_RGB)\
             \n        .value(\"CMYK\", ODE_COLOR_SPACE_CMYK);\n\
             \n    value_array<std::array<float, 2> >(\"float_array_2\")\
             \n        .element(emscripten::index<0>())\
             \n        .element(emscripten::index<1>());\n\
             \n}\n\n"
        );
    }

    #[test]
    fn test_array_instance_bound_once_per_run() {
        let dialect = Dialect::default();
        let usage = PointerUsage::default();
        let array = || Entity::new(EntityCategory::ArrayInstance, Some("float[16]".into()), "float_array_16");
        let first = ParsedHeader {
            path: PathBuf::from("/nonexistent/ode/api-base.h"),
            entities: vec![array()],
            pointer_usage: PointerUsage::default(),
        };
        let headers = vec![first, header(vec![array()])];
        let ctx = BindingContext::new(&dialect, &usage, "odegen").with_headers(&headers);

        assert!(render(&ctx, &headers[0]).contains("value_array<std::array<float, 16> >(\"float_array_16\")"));
        assert!(!render(&ctx, &headers[1]).contains("float_array_16"));
    }

    #[test]
    fn test_struct_getters() {
        let dialect = Dialect::default();
        let mut usage = PointerUsage::default();
        usage.add_type("ODE_LayerList *");
        let ctx = BindingContext::new(&dialect, &usage, "odegen");
        let list = Entity::new(EntityCategory::Struct, None, "ODE_LayerList").with_members(vec![
            Member::new(MemberCategory::MemberVariable, Some("ODE_LayerList::Entry *".into()), "entries", None, None),
            Member::new(MemberCategory::MemberVariable, Some("int".into()), "n", None, None),
            Member::new(MemberCategory::ArrayGetterBind, None, "getEntry", Some("entries,n".into()), None),
            Member::new(MemberCategory::ArrayGetterBind, None, "getMissing", Some("missing,n".into()), None),
            Member::new(MemberCategory::PtrGetterBind, None, "getData", Some("entries".into()), None),
        ]);
        let src = render(&ctx, &header(vec![list]));

        assert!(src.contains(
            "const ODE_LayerList::Entry &ode_layerList_getEntry(const ODE_LayerList &x, int i) {\n    \
             ODE_ASSERT(i >= 0 && i < x.n);\n    return x.entries[i];\n}\n"
        ));
        assert!(src.contains(
            "ODE_VarDataPtr ode_layerList_getData(const ODE_LayerList &x) {\n    \
             return reinterpret_cast<ODE_VarDataPtr>(x.entries);\n}\n"
        ));
        assert!(src.contains(
            "    class_<ODE_LayerList>(\"LayerList\").constructor<>()\
             \n        .property(\"n\", &ODE_LayerList::n)\
             \n        .function(\"getEntry\", &ode_layerList_getEntry)\
             \n        .function(\"getData\", &ode_layerList_getData);\n"
        ));
        assert!(!src.contains("getMissing"));
    }

    #[test]
    fn test_value_object_and_tuple() {
        let dialect = Dialect::default();
        let usage = PointerUsage::default();
        let ctx = BindingContext::new(&dialect, &usage, "odegen");
        let field = |name: &str| Member::new(MemberCategory::MemberVariable, Some("ODE_Scalar".into()), name, None, None);
        let entities = vec![
            Entity::new(EntityCategory::Struct, None, "ODE_Rectangle").with_members(vec![field("a"), field("b")]),
            Entity::new(EntityCategory::Tuple, None, "ODE_Vector2").with_members(vec![field("x"), field("y")]),
        ];
        let src = render(&ctx, &header(entities));
        assert!(src.contains(
            "    value_object<ODE_Rectangle>(\"Rectangle\")\
             \n        .field(\"a\", &ODE_Rectangle::a)\
             \n        .field(\"b\", &ODE_Rectangle::b);\n"
        ));
        assert!(src.contains(
            "    value_array<ODE_Vector2>(\"Vector2\")\
             \n        .element(&ODE_Vector2::x)\
             \n        .element(&ODE_Vector2::y);\n"
        ));
    }
}
