//! Argument direction classification
//!
//! Determines whether a function argument is read, written back, or both,
//! from its direction marker or, without a marker, from its pointer shape.

use odegen_core::{Dialect, Entity, Error, MemberCategory, Result};
use serde::{Deserialize, Serialize};

/// Data flow of a function argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgDirection {
    In,
    Out,
    InOut,
    /// Output that becomes the logical return value of the call
    OutReturn,
}

impl ArgDirection {
    /// Value is read from the caller before the call
    pub fn reads_input(self) -> bool {
        matches!(self, ArgDirection::In | ArgDirection::InOut)
    }

    /// Value is written back to the caller after the call
    pub fn writes_output(self) -> bool {
        matches!(self, ArgDirection::Out | ArgDirection::InOut)
    }

    pub fn is_return(self) -> bool {
        self == ArgDirection::OutReturn
    }
}

/// A classified argument type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentType<'a> {
    pub direction: ArgDirection,
    /// Type with the direction marker removed
    pub bare_type: &'a str,
}

/// Classifies argument types using the dialect's direction markers
#[derive(Debug, Clone)]
pub struct DirectionClassifier {
    markers: Vec<(String, ArgDirection)>,
    result_type: String,
}

impl DirectionClassifier {
    /// Create a new classifier for a dialect
    pub fn new(dialect: &Dialect) -> Self {
        let mut markers = vec![
            (dialect.marker_in.clone(), ArgDirection::In),
            (dialect.marker_out.clone(), ArgDirection::Out),
            (dialect.marker_out_return.clone(), ArgDirection::OutReturn),
        ];
        markers.extend(
            dialect
                .marker_in_out
                .iter()
                .map(|m| (m.clone(), ArgDirection::InOut)),
        );
        markers.retain(|(m, _)| !m.is_empty());
        // Longer spellings first so that `ODE_OUT_RETURN` is not read as `ODE_OUT`
        markers.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            markers,
            result_type: dialect.result_type.clone(),
        }
    }

    /// Classify an argument type such as `ODE_OUT_RETURN ODE_DesignHandle *`
    pub fn classify<'a>(&self, type_str: &'a str) -> ArgumentType<'a> {
        let trimmed = type_str.trim_start();
        for (marker, direction) in &self.markers {
            let Some(rest) = trimmed.strip_prefix(marker.as_str()) else {
                continue;
            };
            if rest.starts_with(char::is_whitespace) {
                return ArgumentType {
                    direction: *direction,
                    bare_type: rest.trim(),
                };
            }
        }

        let bare_type = type_str.trim();
        ArgumentType {
            direction: implicit_direction(bare_type),
            bare_type,
        }
    }

    /// Strip a direction marker from a type, if present
    pub fn strip_marker<'a>(&self, type_str: &'a str) -> &'a str {
        self.classify(type_str).bare_type
    }

    /// Reject functions whose `OUT_RETURN` argument cannot become the
    /// return value: the function must return the result type and may
    /// have at most one such argument.
    pub fn check_function(&self, function: &Entity) -> Result<()> {
        let returns: Vec<&str> = function
            .members_of(MemberCategory::Argument)
            .filter(|arg| self.classify(arg.type_str()).direction.is_return())
            .map(|arg| arg.name.as_str())
            .collect();

        if returns.is_empty() {
            return Ok(());
        }
        if function.type_str() != self.result_type {
            return Err(Error::Binding {
                function: function.name.clone(),
                detail: format!(
                    "argument '{}' is marked as return value but the function returns '{}' instead of '{}'",
                    returns[0],
                    function.type_str(),
                    self.result_type
                ),
            });
        }
        if returns.len() > 1 {
            return Err(Error::Binding {
                function: function.name.clone(),
                detail: format!("multiple return value arguments: {}", returns.join(", ")),
            });
        }
        Ok(())
    }
}

/// Non-const pointers may be written through; everything else is input
fn implicit_direction(bare_type: &str) -> ArgDirection {
    let Some(pointee) = bare_type.strip_suffix('*') else {
        return ArgDirection::In;
    };
    let is_const = pointee
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word == "const");
    if is_const {
        ArgDirection::In
    } else {
        ArgDirection::InOut
    }
}
