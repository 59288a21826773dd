//! Typed action calls parsed from trigger bindings.

use crate::expr::{parse_statements, template, Expr, ReferenceRoot, Statement};

use super::error::TriggerError;

/// One step of a trigger sequence. Arguments stay unevaluated until the step
/// runs so they observe the effects of earlier steps.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionCall {
    ShowModal { target: Expr },
    CloseModal { target: Expr },
    SetMeta { target: Expr, property: Expr, value: Expr },
    ResetWidget { target: Expr },
    ShowAlert { message: Expr, kind: Option<Expr> },
    StoreValue { key: Expr, value: Expr },
    RunAction { action: Expr, params: Option<Expr> },
    /// `Widget.prop = value`, a meta write.
    Assign { target: AssignTarget, property: String, value: Expr },
}

/// Widget on the left side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignTarget {
    Named(String),
    This,
}

impl ActionCall {
    /// Name used in logs and error reports.
    pub fn name(&self) -> &'static str {
        match self {
            ActionCall::ShowModal { .. } => "showModal",
            ActionCall::CloseModal { .. } => "closeModal",
            ActionCall::SetMeta { .. } => "setMeta",
            ActionCall::ResetWidget { .. } => "resetWidget",
            ActionCall::ShowAlert { .. } => "showAlert",
            ActionCall::StoreValue { .. } => "storeValue",
            ActionCall::RunAction { .. } => "runAction",
            ActionCall::Assign { .. } => "assign",
        }
    }
}

/// Parse every fragment of a trigger binding into one ordered action list.
///
/// Text outside fragments is ignored.
pub fn parse_trigger(binding: &str) -> Result<Vec<ActionCall>, TriggerError> {
    let mut calls = Vec::new();
    for body in template::fragments(binding) {
        let statements = parse_statements(body).map_err(|e| TriggerError::parse(e.to_string()))?;
        for statement in statements {
            calls.push(to_call(statement)?);
        }
    }
    Ok(calls)
}

fn to_call(statement: Statement) -> Result<ActionCall, TriggerError> {
    match statement {
        Statement::Assign { target, value } => {
            let reference = target
                .as_reference()
                .ok_or_else(|| TriggerError::parse("left side of assignment must be a property path"))?;
            let [property] = reference.segments.as_slice() else {
                return Err(TriggerError::parse("assignment target must be Widget.property"));
            };
            let target = match reference.root {
                ReferenceRoot::Named(name) => AssignTarget::Named(name),
                ReferenceRoot::This => AssignTarget::This,
            };
            Ok(ActionCall::Assign {
                target,
                property: property.clone(),
                value,
            })
        }
        Statement::Expr(Expr::Call { callee, args }) => {
            let Expr::Ident(name) = *callee else {
                return Err(TriggerError::parse("only action calls are allowed in triggers"));
            };
            call_from_args(&name, args)
        }
        Statement::Expr(_) => Err(TriggerError::parse("only action calls are allowed in triggers")),
    }
}

fn call_from_args(name: &str, args: Vec<Expr>) -> Result<ActionCall, TriggerError> {
    let arity = |min: usize, max: usize| {
        if args.len() < min || args.len() > max {
            Err(TriggerError::parse(format!(
                "{} expects {} argument(s), got {}",
                name,
                if min == max { min.to_string() } else { format!("{}-{}", min, max) },
                args.len()
            )))
        } else {
            Ok(())
        }
    };
    match name {
        "showModal" | "closeModal" | "resetWidget" => arity(1, 1)?,
        "setMeta" => arity(3, 3)?,
        "showAlert" | "runAction" => arity(1, 2)?,
        "storeValue" => arity(2, 2)?,
        other => return Err(TriggerError::parse(format!("'{}' is not an action", other))),
    }

    let mut args = args.into_iter();
    let mut required = || args.next().unwrap_or(Expr::Null);
    Ok(match name {
        "showModal" => ActionCall::ShowModal { target: required() },
        "closeModal" => ActionCall::CloseModal { target: required() },
        "resetWidget" => ActionCall::ResetWidget { target: required() },
        "setMeta" => ActionCall::SetMeta {
            target: required(),
            property: required(),
            value: required(),
        },
        "showAlert" => ActionCall::ShowAlert {
            message: required(),
            kind: required_or_none(required()),
        },
        "runAction" => ActionCall::RunAction {
            action: required(),
            params: required_or_none(required()),
        },
        _ => ActionCall::StoreValue {
            key: required(),
            value: required(),
        },
    })
}

/// Missing optional arguments come back as `Expr::Null`, as does an explicit `null`.
fn required_or_none(expr: Expr) -> Option<Expr> {
    match expr {
        Expr::Null => None,
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sequence_in_order() {
        let calls = parse_trigger("{{ showModal('Popup1'); storeValue('k', 1); Text1.text = 'x' }}").unwrap();
        let names: Vec<_> = calls.iter().map(ActionCall::name).collect();
        assert_eq!(names, vec!["showModal", "storeValue", "assign"]);
    }

    #[test]
    fn rejects_unknown_actions() {
        assert!(matches!(
            parse_trigger("{{ deleteEverything() }}"),
            Err(TriggerError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(parse_trigger("{{ showModal() }}").is_err());
        assert!(parse_trigger("{{ setMeta('A', 'b') }}").is_err());
    }

    #[test]
    fn assignment_needs_single_property() {
        assert!(parse_trigger("{{ Table1.selectedRow.id = 1 }}").is_err());
        let calls = parse_trigger("{{ this.isVisible = false }}").unwrap();
        assert!(matches!(
            &calls[0],
            ActionCall::Assign { target: AssignTarget::This, property, .. } if property == "isVisible"
        ));
    }

    #[test]
    fn text_without_fragments_has_no_actions() {
        assert!(parse_trigger("Submit").unwrap().is_empty());
    }
}
