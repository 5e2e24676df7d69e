//! Names and type helpers shared by the back ends

use odegen_core::{find_member_type, Dialect, Entity, EntityCategory};

/// Exposed name of a qualified C name: symbol prefix removed and `::`
/// replaced by `_`, e.g. `ODE_LayerList::Entry` -> `LayerList_Entry`
pub fn js_type_name(dialect: &Dialect, qualified_name: &str) -> String {
    dialect.remove_prefix(qualified_name).replace("::", "_")
}

/// Name of a generated accessor helper: the helper prefix, the exposed
/// type name with every character following `_` lower-cased, and the
/// accessor name, e.g. `LayerList` + `getEntry` -> `ode_layerList_getEntry`
pub fn helper_function_name(dialect: &Dialect, exposed_name: &str, accessor: &str) -> String {
    let mut name = dialect.helper_prefix.clone();
    let mut previous = '_';
    for c in exposed_name.chars() {
        if previous == '_' {
            name.extend(c.to_lowercase());
        } else {
            name.push(c);
        }
        previous = c;
    }
    name.push('_');
    name.push_str(accessor);
    name
}

/// Split the last dimension off an array type, e.g. `float[16]` ->
/// `("float", 16)`
pub fn split_array_type(type_str: &str) -> Option<(&str, usize)> {
    let head = type_str.trim_end().strip_suffix(']')?;
    let open = head.rfind('[')?;
    let len = head[open + 1..].trim().parse().ok()?;
    Some((type_str[..open].trim(), len))
}

/// Element type and length of entities bound as fixed-size arrays: array
/// instances and one-dimensional array typedefs
pub fn bound_array(entity: &Entity) -> Option<(&str, usize)> {
    match entity.category {
        EntityCategory::ArrayInstance => split_array_type(entity.type_str()),
        EntityCategory::Typedef if entity.type_str().matches('[').count() == 1 => {
            split_array_type(entity.type_str())
        }
        _ => None,
    }
}

/// Data pointer typedef returned by a pointer getter. A `const` backing
/// field yields the const pointer type; anything else, including an
/// unknown field, the mutable one.
pub fn data_ptr_type<'d>(dialect: &'d Dialect, entity: &Entity, field: &str) -> &'d str {
    match find_member_type(&entity.members, field) {
        Some(ty) if ty.starts_with("const ") => &dialect.const_data_ptr,
        _ => &dialect.var_data_ptr,
    }
}

/// Element type of a pointer used as an array, e.g. `ODE_LayerList::Entry *`
/// -> `ODE_LayerList::Entry`
pub fn pointee_type(type_str: &str) -> Option<&str> {
    type_str.trim().strip_suffix('*').map(str::trim)
}

/// Array getter value `entries,n` -> `("entries", "n")`
pub fn array_getter_fields(value: &str) -> Option<(&str, &str)> {
    let (array, length) = value.split_once(',')?;
    Some((array.trim(), length.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use odegen_core::{Member, MemberCategory};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_js_type_name() {
        let dialect = Dialect::default();
        assert_eq!(js_type_name(&dialect, "ODE_LayerList::Entry"), "LayerList_Entry");
        assert_eq!(js_type_name(&dialect, "ode_createEngine"), "createEngine");
        assert_eq!(js_type_name(&dialect, "float_array_16"), "float_array_16");
    }

    #[test]
    fn test_helper_function_name() {
        let dialect = Dialect::default();
        assert_eq!(helper_function_name(&dialect, "LayerList", "getEntry"), "ode_layerList_getEntry");
        assert_eq!(helper_function_name(&dialect, "String", "getData"), "ode_string_getData");
        assert_eq!(
            helper_function_name(&dialect, "ParseError_Info", "get"),
            "ode_parseError_info_get"
        );
    }

    #[test]
    fn test_split_array_type() {
        assert_eq!(split_array_type("float[16]"), Some(("float", 16)));
        assert_eq!(split_array_type("int[4][4]"), Some(("int[4]", 4)));
        assert_eq!(split_array_type("ODE_Scalar [ 3 ] "), Some(("ODE_Scalar", 3)));
        assert_eq!(split_array_type("float"), None);
        assert_eq!(split_array_type("float[N]"), None);
    }

    #[test]
    fn test_bound_array() {
        let instance = Entity::new(EntityCategory::ArrayInstance, Some("float[16]".into()), "float_array_16");
        assert_eq!(bound_array(&instance), Some(("float", 16)));

        let matrix = Entity::new(EntityCategory::Typedef, Some("float[3][3]".into()), "ODE_Matrix3");
        assert_eq!(bound_array(&matrix), None);

        let scalar = Entity::new(EntityCategory::Typedef, Some("double".into()), "ODE_Scalar");
        assert_eq!(bound_array(&scalar), None);
    }

    #[test]
    fn test_data_ptr_type() {
        let dialect = Dialect::default();
        let entity = Entity::new(EntityCategory::Struct, None, "ODE_StringRef").with_members(vec![
            Member::new(MemberCategory::MemberVariable, Some("const char *".into()), "data", None, None),
            Member::new(MemberCategory::MemberVariable, Some("char *".into()), "buffer", None, None),
        ]);
        assert_eq!(data_ptr_type(&dialect, &entity, "data"), "ODE_ConstDataPtr");
        assert_eq!(data_ptr_type(&dialect, &entity, "buffer"), "ODE_VarDataPtr");
        assert_eq!(data_ptr_type(&dialect, &entity, "missing"), "ODE_VarDataPtr");
    }
}
