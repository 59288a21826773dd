//! Pure evaluation of parsed expressions against a read-only data context.

use indexmap::IndexMap;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::error::ExprError;
use super::functions;
use super::parser::parse_expression;
use super::template::{self, Segment};
use super::value::Value;

/// Read-only view of entity values used while evaluating bindings.
pub trait DataContext {
    /// Whether `name` is a widget or data-source entity.
    fn has_entity(&self, name: &str) -> bool;

    /// Current value of `entity.property`, or `None` if no such property exists.
    fn property(&self, entity: &str, property: &str) -> Option<Value>;

    /// All properties of an entity as one map.
    fn entity(&self, entity: &str) -> Option<Value>;
}

/// Simple map-backed context, keyed by entity then property.
#[derive(Debug, Clone, Default)]
pub struct MapContext {
    entities: IndexMap<String, IndexMap<String, Value>>,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: &str, property: &str, value: impl Into<Value>) {
        self.entities
            .entry(entity.to_string())
            .or_default()
            .insert(property.to_string(), value.into());
    }

    pub fn with(mut self, entity: &str, property: &str, value: impl Into<Value>) -> Self {
        self.insert(entity, property, value);
        self
    }
}

impl DataContext for MapContext {
    fn has_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    fn property(&self, entity: &str, property: &str) -> Option<Value> {
        self.entities.get(entity)?.get(property).cloned()
    }

    fn entity(&self, entity: &str) -> Option<Value> {
        self.entities.get(entity).map(|props| Value::Map(props.clone()))
    }
}

/// Evaluate a property string against a context.
///
/// - no fragments: the string itself;
/// - one fragment spanning the whole string: the fragment's native value;
/// - anything else: fragments rendered as text and concatenated.
pub fn evaluate(source: &str, context: &dyn DataContext) -> Result<Value, ExprError> {
    Scope::new(context).evaluate_template(source)
}

/// Evaluation scope: the data context plus `this` and local names.
pub struct Scope<'a> {
    context: &'a dyn DataContext,
    this: Option<&'a str>,
    locals: IndexMap<String, Value>,
}

impl<'a> Scope<'a> {
    pub fn new(context: &'a dyn DataContext) -> Self {
        Self {
            context,
            this: None,
            locals: IndexMap::new(),
        }
    }

    /// Resolve `this` to the given widget id.
    pub fn with_this(mut self, widget_id: &'a str) -> Self {
        self.this = Some(widget_id);
        self
    }

    /// Bind a local name, e.g. `event` inside trigger bindings.
    pub fn with_local(mut self, name: &str, value: Value) -> Self {
        self.locals.insert(name.to_string(), value);
        self
    }

    pub fn evaluate_template(&self, source: &str) -> Result<Value, ExprError> {
        if let Some(body) = template::sole_fragment(source) {
            return self.evaluate_source(body);
        }

        let segments = template::split(source);
        if !segments.iter().any(|s| matches!(s, Segment::Fragment(_))) {
            return Ok(Value::String(source.to_string()));
        }

        let mut out = String::new();
        for segment in segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Fragment(body) => match self.evaluate_source(body)? {
                    Value::Loading => return Ok(Value::Loading),
                    value => out.push_str(&value.to_display_string()),
                },
            }
        }
        Ok(Value::String(out))
    }

    pub fn evaluate_source(&self, body: &str) -> Result<Value, ExprError> {
        let expr = parse_expression(body)?;
        self.eval(&expr)
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, ExprError> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::String(s.clone())),
            Expr::Array(items) => Ok(Value::List(
                items.iter().map(|item| self.eval(item)).collect::<Result<_, _>>()?,
            )),
            Expr::Object(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for (key, value) in fields {
                    values.push((key.clone(), self.eval(value)?));
                }
                Ok(functions::make_object(values))
            }
            Expr::Ident(name) => self.resolve_ident(name),
            Expr::This => {
                let id = self
                    .this
                    .ok_or_else(|| ExprError::reference("'this' is not available here"))?;
                self.entity_value(id)
            }
            Expr::Member { object, property } => self.eval_member(object, property),
            Expr::Index { object, index } => {
                let receiver = self.eval(object)?;
                let key = self.eval(index)?;
                functions::get_index(&receiver, &key)
            }
            Expr::Call { callee, args } => self.eval_call(callee, args),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                if value == Value::Loading {
                    return Ok(Value::Loading);
                }
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Neg => Value::Number(-value.as_number().unwrap_or(f64::NAN)),
                })
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test = self.eval(test)?;
                if test == Value::Loading {
                    return Ok(Value::Loading);
                }
                if test.is_truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn resolve_ident(&self, name: &str) -> Result<Value, ExprError> {
        if let Some(local) = self.locals.get(name) {
            return Ok(local.clone());
        }
        if self.context.has_entity(name) {
            return self.entity_value(name);
        }
        if functions::is_global_name(name) {
            return Err(ExprError::runtime(format!("'{}' cannot be used as a value", name)));
        }
        Err(ExprError::reference(format!("'{}' is not defined", name)))
    }

    fn entity_value(&self, entity: &str) -> Result<Value, ExprError> {
        self.context
            .entity(entity)
            .ok_or_else(|| ExprError::reference(format!("'{}' is not defined", entity)))
    }

    /// The entity an expression names directly, if any.
    fn entity_name<'e>(&'e self, expr: &'e Expr) -> Option<&'e str> {
        match expr {
            Expr::This => self.this,
            Expr::Ident(name) if !self.locals.contains_key(name) && self.context.has_entity(name) => {
                Some(name)
            }
            _ => None,
        }
    }

    fn eval_member(&self, object: &Expr, property: &str) -> Result<Value, ExprError> {
        if let Some(entity) = self.entity_name(object) {
            let value = self.context.property(entity, property).ok_or_else(|| {
                ExprError::reference(format!("'{}' has no property '{}'", entity, property))
            })?;
            if let Value::Error(message) = value {
                return Err(ExprError::runtime(format!(
                    "'{}.{}' failed to evaluate: {}",
                    entity, property, message
                )));
            }
            return Ok(value);
        }
        let receiver = self.eval(object)?;
        functions::get_property(&receiver, property)
    }

    fn eval_call(&self, callee: &Expr, args: &[Expr]) -> Result<Value, ExprError> {
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>, _>>()?;

        match callee {
            Expr::Ident(name) if !self.locals.contains_key(name) && !self.context.has_entity(name) => {
                if functions::GLOBALS.contains(&name.as_str()) {
                    return functions::call_global(name, &args);
                }
                Err(ExprError::reference(format!("'{}' is not defined", name)))
            }
            Expr::Member { object, property } => {
                if let Expr::Ident(namespace) = object.as_ref() {
                    if functions::NAMESPACES.contains(&namespace.as_str())
                        && !self.context.has_entity(namespace)
                    {
                        return functions::call_namespace(namespace, property, &args);
                    }
                }
                let receiver = self.eval(object)?;
                if receiver == Value::Loading {
                    return Ok(Value::Loading);
                }
                functions::call_method(&receiver, property, &args)
            }
            other => Err(ExprError::runtime(format!("{:?} is not a function", other))),
        }
    }

    fn eval_binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value, ExprError> {
        let lhs = self.eval(left)?;
        match op {
            BinaryOp::And => {
                if lhs.is_truthy() {
                    self.eval(right)
                } else {
                    Ok(lhs)
                }
            }
            BinaryOp::Or => {
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.eval(right)
                }
            }
            BinaryOp::Add => self.strict(lhs, right, |lhs, rhs| match (lhs, rhs) {
                (Value::String(_) | Value::List(_) | Value::Map(_), _)
                | (_, Value::String(_) | Value::List(_) | Value::Map(_)) => {
                    Value::String(format!("{}{}", lhs.to_display_string(), rhs.to_display_string()))
                }
                _ => numeric(lhs, rhs, |a, b| a + b),
            }),
            BinaryOp::Sub => self.strict(lhs, right, |lhs, rhs| numeric(lhs, rhs, |a, b| a - b)),
            BinaryOp::Mul => self.strict(lhs, right, |lhs, rhs| numeric(lhs, rhs, |a, b| a * b)),
            BinaryOp::Div => self.strict(lhs, right, |lhs, rhs| numeric(lhs, rhs, |a, b| a / b)),
            BinaryOp::Rem => self.strict(lhs, right, |lhs, rhs| numeric(lhs, rhs, |a, b| a % b)),
            BinaryOp::Eq => self.strict(lhs, right, |lhs, rhs| Value::Bool(lhs.loose_eq(rhs))),
            BinaryOp::NotEq => self.strict(lhs, right, |lhs, rhs| Value::Bool(!lhs.loose_eq(rhs))),
            BinaryOp::StrictEq => self.strict(lhs, right, |lhs, rhs| Value::Bool(lhs.strict_eq(rhs))),
            BinaryOp::StrictNotEq => self.strict(lhs, right, |lhs, rhs| Value::Bool(!lhs.strict_eq(rhs))),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                self.strict(lhs, right, |lhs, rhs| Value::Bool(compare(op, lhs, rhs)))
            }
        }
    }

    /// Evaluate `right` and apply a non-short-circuit operator. A loading
    /// operand makes the result loading.
    fn strict(
        &self,
        lhs: Value,
        right: &Expr,
        apply: impl FnOnce(&Value, &Value) -> Value,
    ) -> Result<Value, ExprError> {
        let rhs = self.eval(right)?;
        if lhs == Value::Loading || rhs == Value::Loading {
            return Ok(Value::Loading);
        }
        Ok(apply(&lhs, &rhs))
    }
}

fn numeric(lhs: &Value, rhs: &Value, f: fn(f64, f64) -> f64) -> Value {
    Value::Number(f(
        lhs.as_number().unwrap_or(f64::NAN),
        rhs.as_number().unwrap_or(f64::NAN),
    ))
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> bool {
    let ordering = match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    }
}
