//! Node-API addon glue
//!
//! Per header, renders `gen-<stem>.cpp` with an `init_gen_<stem>` export
//! function plus serializers and argument readers, and `gen-<stem>.h` with
//! the serializer declarations. `gen.h` includes the headers of all
//! inputs.

use std::collections::HashSet;
use std::path::PathBuf;

use odegen_core::{namespaced_name, Entity, EntityCategory, MemberCategory, Result};
use odegen_parser::{stripped_value_name, ParsedHeader};

use crate::artifact::Artifact;
use crate::naming::array_getter_fields;
use crate::{BindingContext, Generator};

/// N-API back end
pub struct NapiGenerator {
    output_dir: PathBuf,
}

impl NapiGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

impl Generator for NapiGenerator {
    fn name(&self) -> &str {
        "napi"
    }

    fn render_header(&self, ctx: &BindingContext<'_>, header: &ParsedHeader) -> Result<Vec<Artifact>> {
        let module = render(ctx, header)?;
        let stem = header.stem();
        Ok(vec![
            Artifact::new(
                self.output_dir.join(format!("gen-{}.cpp", stem)),
                format!("{}{}", ctx.preamble(), module.source),
            ),
            Artifact::new(
                self.output_dir.join(format!("gen-{}.h", stem)),
                format!("{}{}", ctx.preamble(), module.header),
            ),
        ])
    }

    fn render_aggregate(&self, ctx: &BindingContext<'_>, headers: &[ParsedHeader]) -> Result<Vec<Artifact>> {
        let mut contents = format!("#pragma once\n{}", ctx.preamble());
        for header in headers {
            contents.push_str(&format!("#include \"gen-{}.h\"\n", header.stem()));
        }
        Ok(vec![Artifact::new(self.output_dir.join("gen.h"), contents)])
    }
}

/// Rendered glue of one header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NapiModule {
    pub source: String,
    pub header: String,
}

/// Source pieces collected while walking the entities
struct ModuleBuilder {
    /// Includes and forward declarations of the wrappers
    declarations: String,
    /// Body of the init function
    exports: String,
    /// Definitions following the init function
    definitions: String,
    header: String,
}

/// Render the glue of one header. Fails when a function cannot be wrapped.
pub fn render(ctx: &BindingContext<'_>, header: &ParsedHeader) -> Result<NapiModule> {
    let header_name = header.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let mut module = ModuleBuilder {
        declarations: String::from("#include <string>\n#include \"addon.h\"\n#include \"napi-wrap.h\"\n#include \"gen.h\"\n\n"),
        exports: format!(
            "Napi::Object init_gen_{}(Napi::Env env, Napi::Object exports) {{\n",
            header.stem().replace('-', "_")
        ),
        definitions: String::new(),
        header: format!("#pragma once\n#include <napi.h>\n#include <ode/{}>\n\n", header_name),
    };

    let mut seen = HashSet::new();
    for entity in &header.entities {
        let full = entity.qualified_name();
        if !seen.insert(full.clone()) {
            continue;
        }
        let name = ctx.exposed_name(entity);
        module.exports.push('\n');

        match entity.category {
            EntityCategory::Define | EntityCategory::Const => {
                module.exports.push_str(&format!(
                    "    exports.Set(\"{}\", Napi::Number::New(env, {}));\n",
                    name, full
                ));
            }
            EntityCategory::Enum => enum_glue(ctx, &mut module, entity, &full, &name),
            EntityCategory::Handle => handle_glue(&mut module, &full, &name),
            EntityCategory::Function => {
                let (declaration, definition) = function_wrapper(ctx, entity, &full, &name)?;
                module.declarations.push_str(&declaration);
                module.definitions.push_str(&definition);
                module.exports.push_str(&format!(
                    "    exports.Set(\"{0}\", Napi::Function::New<node_napi_{0}>(env, \"{0}\"));\n",
                    name
                ));
            }
            EntityCategory::Struct => struct_glue(&mut module, entity, &full, &name),
            _ => {
                module
                    .exports
                    .push_str(&format!("    // {} {} is not exported\n", entity.category, name));
            }
        }
    }
    module.exports.push_str("    return exports;\n}\n\n");

    Ok(NapiModule {
        source: format!("{}\n{}{}", module.declarations, module.exports, module.definitions),
        header: module.header,
    })
}

fn serialize_signature(full: &str) -> String {
    format!("Napi::Value ode_napi_serialize(Napi::Env env, const {}& source)", full)
}

fn enum_glue(ctx: &BindingContext<'_>, module: &mut ModuleBuilder, entity: &Entity, full: &str, name: &str) {
    let prefix_len = ctx.enum_prefix_len(entity);
    let values: Vec<_> = entity.members_of(MemberCategory::EnumValue).collect();

    module.exports.push_str("    {\n");
    module
        .exports
        .push_str(&format!("        auto {} = Napi::Object::New(env);\n", name));
    for value in &values {
        module.exports.push_str(&format!(
            "        {}.Set(\"{}\", uint32_t({}));\n",
            name,
            stripped_value_name(&value.name, prefix_len),
            namespaced_name(&entity.namespace, &value.name)
        ));
    }
    module
        .exports
        .push_str(&format!("        exports.Set(\"{0}\", {0});\n    }}\n", name));

    let signature = serialize_signature(full);
    module
        .header
        .push_str(&format!("std::string ode_napi_enum_to_string({} value);\n", full));
    module.header.push_str(&format!("{};\n", signature));

    // Aliases share a value with an earlier enumerator and would repeat a case label
    let mut labels = HashSet::new();
    let mut cases = String::new();
    for value in &values {
        let alias = value
            .value
            .as_deref()
            .is_some_and(|v| !labels.insert(v.to_string()) || values.iter().any(|other| other.name == v));
        if alias {
            continue;
        }
        cases.push_str(&format!(
            "        case {}: return \"{}\";\n",
            namespaced_name(&entity.namespace, &value.name),
            stripped_value_name(&value.name, prefix_len)
        ));
    }
    module.definitions.push_str(&format!(
        "std::string ode_napi_enum_to_string({full} value) {{\n    switch(value) {{\n{cases}        \
         default: return \"UNKNOWN_{name}_\"+std::to_string(uint32_t(value));\n    }}\n}}\n\
         {signature} {{\n    return Napi::String::New(env, ode_napi_enum_to_string(source));\n}}\n\n"
    ));
}

fn handle_glue(module: &mut ModuleBuilder, full: &str, name: &str) {
    let signature = serialize_signature(full);
    module.header.push_str(&format!("{};\n", signature));
    module.definitions.push_str(&format!(
        "template<>\n\
         const char* Handle<{full}>::name = \"{name}\";\n\
         template<>\n\
         bool Autobind<{full}>::read_into(const Napi::Value& value, {full}& target) {{\n    \
         auto optional = Handle<{full}>::Read(value);\n    \
         if(optional) {{ target = *optional; return true; }}\n    \
         return false;\n\
         }}\n\
         {signature} {{\n    \
         return Handle<{full}>::serialize(env, source);\n\
         }}\n\n"
    ));
    module
        .exports
        .push_str(&format!("    Handle<{}>::Export(exports);\n", full));
}

/// Field readers and serializer of a struct. Pointer fields travel as
/// `uintptr_t`.
fn struct_glue(module: &mut ModuleBuilder, entity: &Entity, full: &str, name: &str) {
    let signature = serialize_signature(full);
    module.header.push_str(&format!("{};\n", signature));

    let mut read_into = format!(
        "template<>\n\
         bool Autobind<{full}>::read_into(const Napi::Value& value, {full}& parsed){{\n    \
         Napi::Env env = value.Env();\n    \
         Napi::Object obj = value.As<Napi::Object>();\n"
    );
    let mut serialize = format!("{} {{\n    Napi::Object obj = Napi::Object::New(env);\n", signature);

    for member in &entity.members {
        match member.category {
            MemberCategory::MemberVariable => {
                let field = &member.name;
                let field_type = member.type_str();
                if field_type.ends_with('*') || field_type.ends_with("Ptr") {
                    read_into.push_str(&format!(
                        "    uintptr_t ptr_{field};\n    \
                         if(Autobind<uintptr_t>::read_into(obj.Get(\"{field}\"), ptr_{field})) {{\n        \
                         parsed.{field} = reinterpret_cast<{field_type}>(ptr_{field});\n    \
                         }} else {{\n        \
                         env.GetAndClearPendingException();\n        \
                         Napi::Error::New(env, \"Invalid value for field {field}\").ThrowAsJavaScriptException();\n        \
                         return false;\n    \
                         }}\n"
                    ));
                    serialize.push_str(&format!(
                        "    Napi::Value {0} = ode_napi_serialize(env, (uintptr_t)source.{0});\n",
                        field
                    ));
                } else {
                    read_into.push_str(&format!(
                        "    if(!Autobind<{field_type}>::read_into(obj.Get(\"{field}\"), parsed.{field})) {{\n        \
                         env.GetAndClearPendingException();\n        \
                         Napi::Error::New(env, \"Invalid value for field {field}\").ThrowAsJavaScriptException();\n        \
                         return false;\n    \
                         }}\n"
                    ));
                    serialize.push_str(&format!(
                        "    Napi::Value {0} = ode_napi_serialize(env, source.{0});\n",
                        field
                    ));
                }
                serialize.push_str(&format!(
                    "    if({0}.IsEmpty()) return Napi::Value();\n    obj.Set(\"{0}\", {0});\n",
                    field
                ));
            }
            MemberCategory::ArrayGetterBind => {
                let Some((entries, length)) = member.value.as_deref().and_then(array_getter_fields) else {
                    continue;
                };
                let function = format!("{}_{}", name, member.name);
                let wrapper = format!("Napi::Value node_napi_{}(const Napi::CallbackInfo& info)", function);
                module.declarations.push_str(&format!("{};\n", wrapper));
                module.definitions.push_str(&format!(
                    "{wrapper} {{\n    \
                     Napi::Env env = info.Env();\n    \
                     {full} self;\n    \
                     if(!Autobind<{full}>::read_into(info[0], self)) {{ return Napi::Value(); }}\n    \
                     int i = info[1].As<Napi::Number>().Int32Value();\n    \
                     if(i < 0 || i >= self.{length}) {{\n        \
                     Napi::RangeError::New(env, \"Index out of range\").ThrowAsJavaScriptException();\n        \
                     return Napi::Value();\n    \
                     }}\n    \
                     return ode_napi_serialize(env, self.{entries}[i]);\n\
                     }}\n\n"
                ));
                module.exports.push_str(&format!(
                    "    exports.Set(\"{0}\", Napi::Function::New<node_napi_{0}>(env, \"{0}\"));\n",
                    function
                ));
            }
            _ => {}
        }
    }

    read_into.push_str("    return true;\n}\n");
    serialize.push_str("    return obj;\n}\n\n");
    module.definitions.push_str(&read_into);
    module.definitions.push_str(&serialize);
}

/// Wrapper of an exported function: reads input arguments from the call,
/// invokes the function, writes output arguments back and converts the
/// result. Returns the forward declaration and the definition.
fn function_wrapper(ctx: &BindingContext<'_>, entity: &Entity, full: &str, name: &str) -> Result<(String, String)> {
    ctx.directions.check_function(entity)?;

    let is_result = entity.type_str() == ctx.dialect.result_type;
    let returned = entity
        .members_of(MemberCategory::Argument)
        .find(|arg| ctx.directions.classify(arg.type_str()).direction.is_return());
    let (return_type, empty_return) = if is_result && returned.is_none() {
        ("void", "return;")
    } else {
        ("Napi::Value", "return Napi::Value();")
    };
    let signature = format!("{} node_napi_{}(const Napi::CallbackInfo& info)", return_type, name);

    let mut body = String::from("    Napi::Env env = info.Env();\n");
    let mut call = Vec::new();
    let mut outputs = String::new();
    let mut index = 0;
    for arg in entity.members_of(MemberCategory::Argument) {
        let classified = ctx.directions.classify(arg.type_str());
        let arg_name = &arg.name;
        let value_type = match classified.bare_type.strip_suffix('*') {
            Some(pointee) => {
                call.push(format!("&{}", arg_name));
                let pointee = pointee.trim();
                pointee.strip_prefix("const ").unwrap_or(pointee).trim()
            }
            None => {
                call.push(arg_name.clone());
                classified.bare_type
            }
        };
        body.push_str(&format!("    {} {};\n", value_type, arg_name));

        let direction = classified.direction;
        if direction.is_return() {
            continue;
        }
        if direction.reads_input() {
            body.push_str(&format!(
                "    if(!Autobind<{value_type}>::read_into(info[{index}], {arg_name})) {{\n        \
                 auto ex = env.GetAndClearPendingException();\n        \
                 Napi::Error::New(env, \"Failed to parse argument {arg_name} (\"+ ex.Message() +\")\").ThrowAsJavaScriptException();\n        \
                 {empty_return}\n    \
                 }}\n"
            ));
        }
        if direction.writes_output() {
            outputs.push_str(&format!(
                "    Autobind<{}>::write_from(info[{}], {});\n",
                value_type, index, arg_name
            ));
        }
        index += 1;
    }

    let call = call.join(", ");
    if is_result {
        body.push_str(&format!(
            "    auto result = {full}({call});\n{outputs}    if(!check_result(env,result)) {empty_return}\n"
        ));
        if let Some(arg) = returned {
            body.push_str(&format!("    return ode_napi_serialize(env, {});\n", arg.name));
        }
    } else if entity.type_str() == "void" {
        body.push_str(&format!("    {full}({call});\n{outputs}    return env.Undefined();\n"));
    } else {
        body.push_str(&format!(
            "    auto result = {full}({call});\n{outputs}    return ode_napi_serialize(env, result);\n"
        ));
    }

    Ok((format!("{};\n", signature), format!("{} {{\n{}}}\n\n", signature, body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use odegen_core::{Dialect, Error, Member};
    use odegen_parser::PointerUsage;
    use pretty_assertions::assert_eq;

    fn argument(type_name: &str, name: &str) -> Member {
        Member::new(MemberCategory::Argument, Some(type_name.into()), name, None, None)
    }

    fn function(return_type: &str, name: &str, args: Vec<Member>) -> Entity {
        Entity::new(EntityCategory::Function, Some(return_type.into()), name).with_members(args)
    }

    fn wrapper(entity: &Entity) -> Result<(String, String)> {
        let dialect = Dialect::default();
        let usage = PointerUsage::default();
        let ctx = BindingContext::new(&dialect, &usage, "odegen");
        function_wrapper(&ctx, entity, &entity.qualified_name(), &ctx.exposed_name(entity))
    }

    #[test]
    fn test_out_return_wrapper() {
        let entity = function(
            "ODE_Result",
            "ode_createEngine",
            vec![
                argument("ODE_OUT_RETURN ODE_EngineHandle *", "engine"),
                argument("const ODE_EngineAttributes *", "engineAttributes"),
            ],
        );
        let (declaration, definition) = wrapper(&entity).unwrap();
        assert_eq!(
            declaration,
            "Napi::Value node_napi_createEngine(const Napi::CallbackInfo& info);\n"
        );
        assert_eq!(
            definition,
            "Napi::Value node_napi_createEngine(const Napi::CallbackInfo& info) {\n\
             \x20   Napi::Env env = info.Env();\n\
             \x20   ODE_EngineHandle engine;\n\
             \x20   ODE_EngineAttributes engineAttributes;\n\
             \x20   if(!Autobind<ODE_EngineAttributes>::read_into(info[0], engineAttributes)) {\n\
             \x20       auto ex = env.GetAndClearPendingException();\n\
             \x20       Napi::Error::New(env, \"Failed to parse argument engineAttributes (\"+ ex.Message() +\")\").ThrowAsJavaScriptException();\n\
             \x20       return Napi::Value();\n\
             \x20   }\n\
             \x20   auto result = ode_createEngine(&engine, &engineAttributes);\n\
             \x20   if(!check_result(env,result)) return Napi::Value();\n\
             \x20   return ode_napi_serialize(env, engine);\n\
             }\n\n"
        );
    }

    #[test]
    fn test_inout_wrapper() {
        let entity = function(
            "ODE_Result",
            "ode_reallocateMemoryBuffer",
            vec![argument("ODE_MemoryBuffer *", "buffer"), argument("size_t", "length")],
        );
        let (declaration, definition) = wrapper(&entity).unwrap();
        assert!(declaration.starts_with("void node_napi_reallocateMemoryBuffer("));
        assert!(definition.contains("read_into(info[0], buffer)"));
        assert!(definition.contains("read_into(info[1], length)"));
        assert!(definition.contains(
            "    auto result = ode_reallocateMemoryBuffer(&buffer, length);\n\
             \x20   Autobind<ODE_MemoryBuffer>::write_from(info[0], buffer);\n\
             \x20   if(!check_result(env,result)) return;\n}"
        ));
    }

    #[test]
    fn test_plain_return_wrapper() {
        let entity = function("ODE_StringRef", "ode_stringRef", vec![argument("const char *", "string")]);
        let (_, definition) = wrapper(&entity).unwrap();
        assert!(definition.contains("    char string;\n"));
        assert!(definition.contains("    return ode_napi_serialize(env, result);\n"));
    }

    #[test]
    fn test_out_return_requires_result_type() {
        let entity = function("int", "ode_bad", vec![argument("ODE_OUT_RETURN int *", "value")]);
        let err = wrapper(&entity).unwrap_err();
        assert!(matches!(err, Error::Binding { ref function, .. } if function == "ode_bad"));
    }

    #[test]
    fn test_module_layout() {
        let dialect = Dialect::default();
        let usage = PointerUsage::default();
        let ctx = BindingContext::new(&dialect, &usage, "odegen");
        let values = vec![
            Member::new(MemberCategory::EnumValue, None, "ODE_RESULT_OK", Some("0".into()), None),
            Member::new(MemberCategory::EnumValue, None, "ODE_RESULT_UNKNOWN_ERROR", Some("1".into()), None),
            Member::new(MemberCategory::EnumValue, None, "ODE_RESULT_DEFAULT", Some("ODE_RESULT_OK".into()), None),
        ];
        let header = ParsedHeader {
            path: PathBuf::from("ode/api-base.h"),
            entities: vec![
                Entity::new(EntityCategory::Enum, None, "ODE_Result").with_members(values),
                Entity::new(EntityCategory::Handle, Some("ODE_internal_Engine".into()), "ODE_EngineHandle"),
                Entity::new(EntityCategory::Handle, Some("ODE_internal_Engine".into()), "ODE_EngineHandle"),
                Entity::new(EntityCategory::Typedef, Some("double".into()), "ODE_Scalar"),
            ],
            pointer_usage: PointerUsage::default(),
        };
        let module = render(&ctx, &header).unwrap();

        assert_eq!(
            module.header,
            "#pragma once\n#include <napi.h>\n#include <ode/api-base.h>\n\n\
             std::string ode_napi_enum_to_string(ODE_Result value);\n\
             Napi::Value ode_napi_serialize(Napi::Env env, const ODE_Result& source);\n\
             Napi::Value ode_napi_serialize(Napi::Env env, const ODE_EngineHandle& source);\n"
        );
        assert!(module.source.contains("Napi::Object init_gen_api_base(Napi::Env env, Napi::Object exports) {\n"));
        assert!(module.source.contains("        Result.Set(\"DEFAULT\", uint32_t(ODE_RESULT_DEFAULT));\n"));
        assert!(module.source.contains("        case ODE_RESULT_UNKNOWN_ERROR: return \"UNKNOWN_ERROR\";\n"));
        assert!(!module.source.contains("case ODE_RESULT_DEFAULT"));
        assert_eq!(module.source.matches("Handle<ODE_EngineHandle>::Export(exports);").count(), 1);
        assert!(module.source.contains("    // typedef Scalar is not exported\n"));
        assert!(module.source.ends_with("}\n\n"));
    }
}
