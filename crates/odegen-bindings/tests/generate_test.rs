//! End-to-end generation tests
//!
//! Parses realistic API headers from disk, renders every back end and
//! writes the results into a temporary directory.

use std::path::{Path, PathBuf};

use odegen_bindings::{generators, render_all, stale_artifacts, write_artifacts, Artifact, BindingContext};
use odegen_core::{Dialect, Error, OutputConfig};
use odegen_parser::{combined_pointer_usage, HeaderParser, ParsedHeader};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const API_BASE: &str = r#"
#pragma once

#define ODE_API

/// Function call result type
typedef enum {
    ODE_RESULT_OK = 0,
    ODE_RESULT_UNKNOWN_ERROR = 1,
    ODE_RESULT_INVALID_ARGUMENT,
} ODE_Result;

/// A real floating-point value
typedef double ODE_Scalar;

/// Represents the engine
ODE_HANDLE_DECL(ODE_internal_Engine) ODE_EngineHandle;
/// Represents a design
ODE_HANDLE_DECL(ODE_internal_Design) ODE_DesignHandle;

/// Engine configuration
typedef struct {
    int flags;
} ODE_EngineAttributes;

/// List of layer ID's and metadata
typedef struct {
    /// A single entry in the layer list
    struct Entry {
        int flags;
    } *entries;
    /// The number of list entries
    int n;
    /// Get single entry
    ODE_BIND_ARRAY_GETTER(getEntry, entries, n);
} ODE_LayerList;

/// Creates a new engine
/// @param engine the new engine
/// @param engineAttributes engine configuration
ODE_Result ODE_API ode_createEngine(ODE_OUT_RETURN ODE_EngineHandle *engine, const ODE_EngineAttributes *engineAttributes);

/// Destroys the engine
ODE_Result ODE_API ode_destroyEngine(ODE_EngineHandle engine);
"#;

const LOGIC_API: &str = r#"
#pragma once

#define ODE_LAYER_FLAG_VISIBLE 0x0001
#define ODE_LAYER_FLAG_LOCKED 0x0002

/// Creates a design
ODE_Result ODE_API ode_createDesign(ODE_EngineHandle engine, ODE_OUT_RETURN ODE_DesignHandle *design);

/// Lists top-level layers
ODE_Result ODE_API ode_design_listLayers(ODE_DesignHandle design, ODE_OUT ODE_LayerList *layerList);
"#;

fn write_header(root: &Path, relative: &str, source: &str) -> PathBuf {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, source).unwrap();
    path
}

fn parse_headers(root: &Path, sources: &[(&str, &str)]) -> Vec<ParsedHeader> {
    let parser = HeaderParser::new(&Dialect::default()).unwrap();
    sources
        .iter()
        .map(|(relative, source)| parser.parse_file(&write_header(root, relative, source)).unwrap())
        .collect()
}

fn all_outputs(root: &Path) -> OutputConfig {
    OutputConfig {
        embind_dir: None,
        napi_dir: Some(root.join("napi")),
        typescript_dir: Some(root.join("ts")),
    }
}

fn render(root: &Path, headers: &[ParsedHeader]) -> odegen_core::Result<Vec<Artifact>> {
    render_with(&all_outputs(root), headers)
}

fn render_with(output: &OutputConfig, headers: &[ParsedHeader]) -> odegen_core::Result<Vec<Artifact>> {
    let dialect = Dialect::default();
    let usage = combined_pointer_usage(headers);
    let ctx = BindingContext::new(&dialect, &usage, "odegen").with_headers(headers);
    render_all(&generators(output), &ctx, headers)
}

fn contents_of<'a>(artifacts: &'a [Artifact], root: &Path, relative: &str) -> &'a str {
    let path = root.join(relative);
    artifacts
        .iter()
        .find(|a| a.path == path)
        .map(|a| a.contents.as_str())
        .unwrap_or_else(|| panic!("no artifact {}", relative))
}

/// Test the artifact set of a two header run and idempotent writing
#[test]
fn test_generate_all_back_ends() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let headers = parse_headers(
        root,
        &[
            ("ode-essentials/ode/api-base.h", API_BASE),
            ("ode-logic/ode/logic-api.h", LOGIC_API),
        ],
    );

    let artifacts = render(root, &headers).unwrap();
    let mut names: Vec<String> = artifacts
        .iter()
        .map(|a| a.path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "napi/gen-api-base.cpp",
            "napi/gen-api-base.h",
            "napi/gen-logic-api.cpp",
            "napi/gen-logic-api.h",
            "napi/gen.h",
            "ode-essentials/ode/emscripten-bindings.cpp",
            "ode-logic/ode/emscripten-bindings.cpp",
            "ts/api-base.d.ts",
            "ts/logic-api.d.ts",
            "ts/ode.d.ts",
        ]
    );

    let first = write_artifacts(&artifacts).unwrap();
    assert_eq!(first.written.len(), 10);
    let second = write_artifacts(&render(root, &headers).unwrap()).unwrap();
    assert!(second.written.is_empty());
    assert_eq!(second.unchanged.len(), 10);
    assert!(stale_artifacts(&artifacts).unwrap().is_empty());
}

/// Test content shared between back ends
#[test]
fn test_generated_contents() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let headers = parse_headers(
        root,
        &[
            ("ode-essentials/ode/api-base.h", API_BASE),
            ("ode-logic/ode/logic-api.h", LOGIC_API),
        ],
    );
    let artifacts = render(root, &headers).unwrap();

    let embind = contents_of(&artifacts, root, "ode-essentials/ode/emscripten-bindings.cpp");
    assert!(embind.starts_with("\n// FILE GENERATED BY odegen\n"));
    assert!(embind.contains("enum_<ODE_Result>(\"Result\")"));
    assert!(embind.contains(".value(\"INVALID_ARGUMENT\", ODE_RESULT_INVALID_ARGUMENT)"));
    assert!(embind.contains("class_<ODE_EngineHandle>(\"EngineHandle\")"));
    assert!(embind.contains("function(\"createEngine\", &ode_createEngine, allow_raw_pointers());"));

    let gen = contents_of(&artifacts, root, "napi/gen.h");
    assert!(gen.contains("#include \"gen-api-base.h\"\n#include \"gen-logic-api.h\"\n"));

    let napi = contents_of(&artifacts, root, "napi/gen-logic-api.cpp");
    assert!(napi.contains("Napi::Value node_napi_createDesign(const Napi::CallbackInfo& info)"));
    assert!(napi.contains("Napi::Number::New(env, ODE_LAYER_FLAG_VISIBLE)"));

    let ts = contents_of(&artifacts, root, "ts/api-base.d.ts");
    assert!(ts.contains("    INVALID_ARGUMENT: 2;\n"));
    assert!(ts.contains("    UNKNOWN_ERROR: 1;\n"));
    assert!(ts.contains("export function createEngine(\n    engineAttributes: ode.EngineAttributes,\n): ode.EngineHandle;\n"));
    assert!(ts.contains("    getEntry(i: ode.Int): ode.LayerList_Entry;\n"));

    let aggregate = contents_of(&artifacts, root, "ts/ode.d.ts");
    assert!(aggregate.contains("export default function loadODE(options?: LoadODEOptions): Promise<ODE>;"));
    assert!(aggregate.contains("    type Result,\n    type EngineHandle,\n    type DesignHandle,\n"));
    assert!(aggregate.ends_with("} from \"./exports.js\";\n"));
}

/// Test that an invalid return value argument aborts the whole run
#[test]
fn test_binding_error_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let broken = "int ODE_API ode_broken(ODE_OUT_RETURN ODE_DesignHandle *design);\n";
    let headers = parse_headers(
        root,
        &[
            ("ode-essentials/ode/api-base.h", API_BASE),
            ("ode-broken/ode/broken-api.h", broken),
        ],
    );

    match render(root, &headers) {
        Err(Error::Binding { function, .. }) => assert_eq!(function, "ode_broken"),
        other => panic!("expected binding error, got {:?}", other.map(|a| a.len())),
    }
    assert!(!root.join("napi").exists());
    assert!(!root.join("ts").exists());
    assert!(!root.join("ode-essentials/ode/emscripten-bindings.cpp").exists());
}

/// Test that headers sharing a directory cannot share a bindings file
#[test]
fn test_conflicting_output_paths() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let headers = parse_headers(root, &[("ode/api-base.h", API_BASE), ("ode/logic-api.h", LOGIC_API)]);

    assert!(matches!(render(root, &headers), Err(Error::Config(_))));
}

/// Test that invalid return value arguments are fatal without N-API output
#[test]
fn test_binding_error_without_napi() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let broken = "int ODE_API ode_broken(ODE_OUT_RETURN ODE_DesignHandle *design);\n";
    let headers = parse_headers(root, &[("ode-broken/ode/broken-api.h", broken)]);

    let embind_only = OutputConfig::default();
    let typescript_only = OutputConfig {
        typescript_dir: Some(root.join("ts")),
        ..OutputConfig::default()
    };
    for output in [embind_only, typescript_only] {
        match render_with(&output, &headers) {
            Err(Error::Binding { function, .. }) => assert_eq!(function, "ode_broken"),
            other => panic!("expected binding error, got {:?}", other.map(|a| a.len())),
        }
    }
    assert!(!root.join("ts").exists());
    assert!(!root.join("ode-broken/ode/emscripten-bindings.cpp").exists());
}

/// Test that an array instance repeated across headers is bound once
#[test]
fn test_shared_array_instance() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let matrix = "typedef struct { float m[16]; } ODE_Transform;\n";
    let layout = "typedef struct { float values[16]; } ODE_Layout;\n";
    let headers = parse_headers(
        root,
        &[("ode-essentials/ode/api-base.h", matrix), ("ode-logic/ode/logic-api.h", layout)],
    );

    let artifacts = render_with(&OutputConfig::default(), &headers).unwrap();
    let binding = "value_array<std::array<float, 16> >(\"float_array_16\")";
    assert!(contents_of(&artifacts, root, "ode-essentials/ode/emscripten-bindings.cpp").contains(binding));
    assert!(!contents_of(&artifacts, root, "ode-logic/ode/emscripten-bindings.cpp").contains(binding));
}
