//! Property pane schemas and value validation.

use crate::expr::Value;

/// Editor control used to author a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    InputText,
    Switch,
    ActionSelector,
    Code,
}

/// Validation rule applied to an evaluated persisted value.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Number { min: Option<f64>, max: Option<f64> },
    Text,
    Boolean,
    Array,
    Object,
}

impl Validation {
    /// Validate and coerce a value, e.g. `"400"` into `400` for numbers.
    ///
    /// `Null` and `Loading` are passed through untouched.
    pub fn apply(&self, value: Value) -> Result<Value, String> {
        if matches!(value, Value::Null | Value::Loading) {
            return Ok(value);
        }
        match self {
            Validation::Number { min, max } => {
                let n = match &value {
                    Value::Number(n) => *n,
                    Value::String(s) => s
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| format!("'{}' is not a number", s))?,
                    other => return Err(format!("expected a number, got {}", other.type_name())),
                };
                if let Some(min) = min {
                    if n < *min {
                        return Err(format!("value {} is below the minimum {}", n, min));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(format!("value {} is above the maximum {}", n, max));
                    }
                }
                Ok(Value::Number(n))
            }
            Validation::Text => match value {
                Value::List(_) | Value::Map(_) => Err(format!("expected text, got {}", value.type_name())),
                other => Ok(Value::String(other.to_display_string())),
            },
            Validation::Boolean => match value {
                Value::Bool(_) => Ok(value),
                Value::String(s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s == "false" => Ok(Value::Bool(false)),
                other => Err(format!("expected a boolean, got {}", other.type_name())),
            },
            Validation::Array => match value {
                Value::List(_) => Ok(value),
                Value::String(s) => match serde_json::from_str::<serde_json::Value>(&s) {
                    Ok(json @ serde_json::Value::Array(_)) => Ok(Value::from(json)),
                    _ => Err("expected an array".to_string()),
                },
                other => Err(format!("expected an array, got {}", other.type_name())),
            },
            Validation::Object => match value {
                Value::Map(_) => Ok(value),
                Value::String(s) => match serde_json::from_str::<serde_json::Value>(&s) {
                    Ok(json @ serde_json::Value::Object(_)) => Ok(Value::from(json)),
                    _ => Err("expected an object".to_string()),
                },
                other => Err(format!("expected an object, got {}", other.type_name())),
            },
        }
    }
}

/// One user-editable property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyConfig {
    pub name: &'static str,
    pub label: &'static str,
    pub control: ControlType,
    /// Whether the property accepts `{{ … }}` bindings.
    pub bindable: bool,
    /// Whether the binding is an action sequence rather than a value.
    pub trigger: bool,
    pub validation: Option<Validation>,
    /// Value used when the property is unset or fails validation.
    pub default: Value,
}

impl PropertyConfig {
    pub fn text(name: &'static str, label: &'static str, default: &str) -> Self {
        Self {
            name,
            label,
            control: ControlType::InputText,
            bindable: true,
            trigger: false,
            validation: Some(Validation::Text),
            default: Value::from(default),
        }
    }

    pub fn number(name: &'static str, label: &'static str, default: f64, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            name,
            label,
            control: ControlType::InputText,
            bindable: true,
            trigger: false,
            validation: Some(Validation::Number { min, max }),
            default: Value::Number(default),
        }
    }

    pub fn switch(name: &'static str, label: &'static str, default: bool) -> Self {
        Self {
            name,
            label,
            control: ControlType::Switch,
            bindable: false,
            trigger: false,
            validation: Some(Validation::Boolean),
            default: Value::Bool(default),
        }
    }

    pub fn array(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            control: ControlType::Code,
            bindable: true,
            trigger: false,
            validation: Some(Validation::Array),
            default: Value::List(Vec::new()),
        }
    }

    pub fn action(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            control: ControlType::ActionSelector,
            bindable: true,
            trigger: true,
            validation: None,
            default: Value::Null,
        }
    }

    /// Allow bindings on a property whose control is otherwise static.
    pub fn bindable(mut self) -> Self {
        self.bindable = true;
        self
    }
}

/// A titled group of properties in the property pane.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySection {
    pub name: &'static str,
    pub children: Vec<PropertyConfig>,
}

impl PropertySection {
    pub fn new(name: &'static str, children: Vec<PropertyConfig>) -> Self {
        Self { name, children }
    }
}

/// A property computed from other properties of the same widget.
///
/// The expression may use `this` for the owning widget; other widgets can
/// reference the result like any other property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedProperty {
    pub name: &'static str,
    pub expression: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_coerces_numeric_strings() {
        let rule = Validation::Number { min: Some(200.0), max: Some(800.0) };
        assert_eq!(rule.apply(Value::from("400")), Ok(Value::Number(400.0)));
    }

    #[test]
    fn number_enforces_bounds() {
        let rule = Validation::Number { min: Some(200.0), max: Some(800.0) };
        assert!(rule.apply(Value::Number(100.0)).is_err());
        assert!(rule.apply(Value::Number(900.0)).is_err());
    }

    #[test]
    fn boolean_accepts_string_forms() {
        assert_eq!(Validation::Boolean.apply(Value::from("true")), Ok(Value::Bool(true)));
        assert!(Validation::Boolean.apply(Value::from("yes")).is_err());
    }

    #[test]
    fn array_parses_json_text() {
        let parsed = Validation::Array.apply(Value::from("[1, 2]")).unwrap();
        assert_eq!(parsed, Value::List(vec![1i64.into(), 2i64.into()]));
    }
}
