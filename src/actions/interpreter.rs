//! Sequential execution of trigger action lists.

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::call::{parse_trigger, ActionCall, AssignTarget};
use super::error::TriggerError;
use crate::collab::{Notice, NoticeKind, Notifier, RemoteActions};
use crate::config::ActionsConfig;
use crate::expr::{Expr, ExprError, PropertyMap, Scope, Value};
use crate::graph::STORE_ENTITY;
use crate::meta::MetaTransaction;
use crate::scheduler::EvaluatedDataTree;
use crate::tree::WidgetType;

/// The state a trigger reads and writes.
///
/// Every write is expected to be committed and re-evaluated before the call
/// returns, so later actions read fresh values.
pub trait ActionHost {
    /// Latest committed snapshot.
    fn snapshot(&self) -> &EvaluatedDataTree;

    fn commit_meta(&mut self, transaction: MetaTransaction);

    fn reset_widget(&mut self, widget: &str);

    fn store_value(&mut self, key: &str, value: Value);

    /// Merge `props` into a data source, creating it if needed.
    fn write_source(&mut self, source: &str, props: PropertyMap);
}

/// Result of a completed trigger run.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutcome {
    pub run_id: Uuid,
    pub executed: usize,
}

/// Runs trigger bindings against a host.
pub struct ActionRunner<'a> {
    remote: &'a dyn RemoteActions,
    notifier: &'a dyn Notifier,
    config: &'a ActionsConfig,
}

impl<'a> ActionRunner<'a> {
    pub fn new(remote: &'a dyn RemoteActions, notifier: &'a dyn Notifier, config: &'a ActionsConfig) -> Self {
        Self {
            remote,
            notifier,
            config,
        }
    }

    /// Parse and run `binding` on behalf of widget `owner`.
    ///
    /// Actions run strictly in order. The first failure stops the sequence,
    /// is sent to the notifier and returned.
    pub async fn run_binding<H: ActionHost>(
        &self,
        host: &mut H,
        owner: &str,
        binding: &str,
        event: Value,
    ) -> Result<TriggerOutcome, TriggerError> {
        let run_id = Uuid::new_v4();
        let result = self.run_sequence(host, run_id, owner, binding, &event).await;
        match &result {
            Ok(outcome) => {
                info!(%run_id, owner, executed = outcome.executed, "Trigger completed");
            }
            Err(err) => {
                warn!(%run_id, owner, error = %err, "Trigger aborted");
                self.notifier
                    .notify_error(Notice::new(NoticeKind::Error, err.to_string()).with_origin(owner))
                    .await;
            }
        }
        result
    }

    async fn run_sequence<H: ActionHost>(
        &self,
        host: &mut H,
        run_id: Uuid,
        owner: &str,
        binding: &str,
        event: &Value,
    ) -> Result<TriggerOutcome, TriggerError> {
        let calls = parse_trigger(binding)?;
        if calls.len() > self.config.max_actions {
            return Err(TriggerError::TooManyActions {
                count: calls.len(),
                max: self.config.max_actions,
            });
        }
        for (step, call) in calls.iter().enumerate() {
            debug!(%run_id, step, action = call.name(), "Running action");
            self.run_call(host, owner, event, call).await?;
        }
        Ok(TriggerOutcome {
            run_id,
            executed: calls.len(),
        })
    }

    async fn run_call<H: ActionHost>(
        &self,
        host: &mut H,
        owner: &str,
        event: &Value,
        call: &ActionCall,
    ) -> Result<(), TriggerError> {
        let name = call.name();
        let fail = |e: ExprError| TriggerError::action(name, e.to_string());

        match call {
            ActionCall::ShowModal { target } | ActionCall::CloseModal { target } => {
                let id = {
                    let scope = scope(host.snapshot(), owner, event);
                    widget_name(&scope, host.snapshot(), owner, target).map_err(fail)?
                };
                let widget = host
                    .snapshot()
                    .get(&id)
                    .ok_or_else(|| TriggerError::action(name, format!("widget '{}' not found", id)))?;
                if widget.widget_type != WidgetType::Popup {
                    return Err(TriggerError::action(name, format!("'{}' is not a popup", id)));
                }
                let visible = matches!(call, ActionCall::ShowModal { .. });
                host.commit_meta(MetaTransaction::new().set(&id, "isVisible", Value::Bool(visible)));
            }
            ActionCall::SetMeta {
                target,
                property,
                value,
            } => {
                let (id, property, value) = {
                    let scope = scope(host.snapshot(), owner, event);
                    let id = widget_name(&scope, host.snapshot(), owner, target).map_err(fail)?;
                    let property = scope.eval(property).map_err(fail)?.to_display_string();
                    let value = scope.eval(value).map_err(fail)?;
                    (id, property, value)
                };
                require_widget(host.snapshot(), name, &id)?;
                host.commit_meta(MetaTransaction::new().set(&id, &property, value));
            }
            ActionCall::Assign {
                target,
                property,
                value,
            } => {
                let id = match target {
                    AssignTarget::This => owner.to_string(),
                    AssignTarget::Named(id) => id.clone(),
                };
                require_widget(host.snapshot(), name, &id)?;
                let value = scope(host.snapshot(), owner, event).eval(value).map_err(fail)?;
                host.commit_meta(MetaTransaction::new().set(&id, property, value));
            }
            ActionCall::ResetWidget { target } => {
                let id = {
                    let scope = scope(host.snapshot(), owner, event);
                    widget_name(&scope, host.snapshot(), owner, target).map_err(fail)?
                };
                require_widget(host.snapshot(), name, &id)?;
                host.reset_widget(&id);
            }
            ActionCall::ShowAlert { message, kind } => {
                let notice = {
                    let scope = scope(host.snapshot(), owner, event);
                    let message = scope.eval(message).map_err(fail)?.to_display_string();
                    let kind = match kind {
                        Some(kind) => NoticeKind::from_name(&scope.eval(kind).map_err(fail)?.to_display_string()),
                        None => NoticeKind::Info,
                    };
                    Notice::new(kind, message).with_origin(owner)
                };
                self.notifier.notify(notice).await;
            }
            ActionCall::StoreValue { key, value } => {
                let (key, value) = {
                    let scope = scope(host.snapshot(), owner, event);
                    let key = scope.eval(key).map_err(fail)?.to_display_string();
                    (key, scope.eval(value).map_err(fail)?)
                };
                host.store_value(&key, value);
            }
            ActionCall::RunAction { action, params } => {
                let (action_id, params) = {
                    let scope = scope(host.snapshot(), owner, event);
                    let action_id = scope.eval(action).map_err(fail)?.to_display_string();
                    let params = match params {
                        Some(params) => scope.eval(params).map_err(fail)?,
                        None => Value::Null,
                    };
                    (action_id, params)
                };
                self.run_remote(host, &action_id, params).await?;
            }
        }
        Ok(())
    }

    /// Invoke a remote action with the configured timeout and publish its
    /// state as the data source `action_id`.
    ///
    /// `action_id` may not name a widget or the store.
    pub async fn run_remote<H: ActionHost>(
        &self,
        host: &mut H,
        action_id: &str,
        params: Value,
    ) -> Result<Value, TriggerError> {
        if action_id == STORE_ENTITY || host.snapshot().get(action_id).is_some() {
            return Err(TriggerError::action(
                "runAction",
                format!("'{}' names a widget or the store, not an action", action_id),
            ));
        }
        host.write_source(action_id, source_props(&[("isLoading", Value::Bool(true))]));

        let timeout = self.config.timeout();
        let result = tokio::time::timeout(timeout, self.remote.invoke(action_id, params)).await;
        match result {
            Ok(Ok(data)) => {
                host.write_source(
                    action_id,
                    source_props(&[
                        ("data", data.clone()),
                        ("isLoading", Value::Bool(false)),
                        ("error", Value::Null),
                    ]),
                );
                Ok(data)
            }
            Ok(Err(err)) => {
                host.write_source(
                    action_id,
                    source_props(&[
                        ("isLoading", Value::Bool(false)),
                        ("error", Value::from(err.to_string())),
                    ]),
                );
                Err(TriggerError::action("runAction", err.to_string()))
            }
            Err(_) => {
                let err = TriggerError::Timeout {
                    action_id: action_id.to_string(),
                    timeout_ms: self.config.timeout_ms,
                };
                host.write_source(
                    action_id,
                    source_props(&[
                        ("isLoading", Value::Bool(false)),
                        ("error", Value::from(err.to_string())),
                    ]),
                );
                Err(err)
            }
        }
    }
}

fn scope<'s>(snapshot: &'s EvaluatedDataTree, owner: &'s str, event: &Value) -> Scope<'s> {
    Scope::new(snapshot)
        .with_this(owner)
        .with_local("event", event.clone())
}

/// Resolve a widget argument: a bare widget name, `this`, or any expression
/// producing the id as a string.
fn widget_name(scope: &Scope<'_>, snapshot: &EvaluatedDataTree, owner: &str, expr: &Expr) -> Result<String, ExprError> {
    match expr {
        Expr::This => Ok(owner.to_string()),
        Expr::Ident(name) if snapshot.get(name).is_some() => Ok(name.clone()),
        other => match scope.eval(other)? {
            Value::String(id) => Ok(id),
            value => Err(ExprError::runtime(format!(
                "expected a widget name, got {}",
                value.type_name()
            ))),
        },
    }
}

fn require_widget(snapshot: &EvaluatedDataTree, action: &str, id: &str) -> Result<(), TriggerError> {
    match snapshot.get(id) {
        Some(_) => Ok(()),
        None => Err(TriggerError::action(action, format!("widget '{}' not found", id))),
    }
}

fn source_props(entries: &[(&str, Value)]) -> PropertyMap {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}
