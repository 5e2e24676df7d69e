//! Enum value prefix stripping
//!
//! C enumerators usually repeat the enum name, e.g. `ODE_LAYER_TYPE_SHAPE`
//! in `ODE_LayerType`. Bindings expose them under the shortened name.

use odegen_core::{Entity, MemberCategory};

/// Length of the prefix to strip from every value of `entity`.
///
/// The longest shared prefix of the value names is trimmed back (at
/// underscore boundaries) until it spells the enum name, ignoring case and
/// underscores. When no such prefix exists, `fallback_prefix` is stripped
/// if all values share it. Values are never stripped to an empty name.
pub fn common_enum_prefix_len(entity: &Entity, fallback_prefix: &str) -> usize {
    let names: Vec<&str> = entity
        .members_of(MemberCategory::EnumValue)
        .map(|m| m.name.as_str())
        .collect();
    strip_len(&entity.name, &names, fallback_prefix)
}

/// Exposed name of an enum value
pub fn stripped_value_name<'a>(value: &'a str, prefix_len: usize) -> &'a str {
    value.get(prefix_len..).unwrap_or(value)
}

fn strip_len(enum_name: &str, values: &[&str], fallback_prefix: &str) -> usize {
    let Some(first) = values.first() else {
        return 0;
    };
    let shortest = values.iter().map(|v| v.len()).min().unwrap_or(0);
    let shared = values[1..]
        .iter()
        .fold(first.len(), |len, value| shared_prefix_len(&first[..len], value));
    let prefix = &first[..shared];

    let candidates = std::iter::once(shared).chain(
        prefix
            .char_indices()
            .rev()
            .filter(|&(_, c)| c == '_')
            .map(|(i, _)| i + 1),
    );
    for len in candidates {
        if len < shortest && spells_name(enum_name, &prefix[..len]) {
            return len;
        }
    }

    if !fallback_prefix.is_empty() && prefix.starts_with(fallback_prefix) && fallback_prefix.len() < shortest {
        fallback_prefix.len()
    } else {
        0
    }
}

fn shared_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map_or(a.len().min(b.len()), |((i, _), _)| i)
}

/// Whether `prefix` spells `name` letter by letter, ignoring case and
/// underscores; one trailing underscore on either side is allowed.
fn spells_name(name: &str, prefix: &str) -> bool {
    let name = name.as_bytes();
    let prefix = prefix.as_bytes();
    let (mut n, mut p) = (0, 0);
    while n < name.len() && p < prefix.len() {
        if name[n] == b'_' {
            n += 1;
        } else if prefix[p] == b'_' {
            p += 1;
        } else if name[n].eq_ignore_ascii_case(&prefix[p]) {
            n += 1;
            p += 1;
        } else {
            return false;
        }
    }
    if n < name.len() && name[n] == b'_' {
        n += 1;
    }
    if p < prefix.len() && prefix[p] == b'_' {
        p += 1;
    }
    n == name.len() && p == prefix.len()
}
