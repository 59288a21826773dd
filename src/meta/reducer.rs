use tracing::debug;

use super::intent::MetaIntent;
use super::state::MetaState;

/// Reducer transforms state based on intents.
///
/// It is the only place meta transitions happen and must stay pure.
pub trait Reducer {
    type State;
    type Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}

pub struct MetaReducer;

impl Reducer for MetaReducer {
    type State = MetaState;
    type Intent = MetaIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            MetaIntent::Register { widget, defaults } => {
                state.values.insert(widget.clone(), defaults.clone());
                state.defaults.insert(widget, defaults);
                state
            }
            MetaIntent::Set {
                widget,
                property,
                value,
            } => {
                if !state.is_registered(&widget) {
                    debug!(%widget, %property, "Dropping meta write for unknown widget");
                    return state;
                }
                state.values.entry(widget).or_default().insert(property, value);
                state
            }
            MetaIntent::Reset { widget } => {
                if let Some(defaults) = state.defaults.get(&widget).cloned() {
                    state.values.insert(widget, defaults);
                }
                state
            }
            MetaIntent::Remove { widget } => {
                state.values.shift_remove(&widget);
                state.defaults.shift_remove(&widget);
                state
            }
            MetaIntent::Commit(transaction) => transaction.writes.into_iter().fold(state, |state, write| {
                Self::reduce(
                    state,
                    MetaIntent::Set {
                        widget: write.widget,
                        property: write.property,
                        value: write.value,
                    },
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{PropertyMap, Value};
    use crate::meta::MetaTransaction;

    fn registered() -> MetaState {
        let mut defaults = PropertyMap::new();
        defaults.insert("isVisible".into(), Value::Bool(false));
        MetaReducer::reduce(
            MetaState::default(),
            MetaIntent::Register {
                widget: "Popup1".into(),
                defaults,
            },
        )
    }

    #[test]
    fn reset_restores_defaults() {
        let state = MetaReducer::reduce(
            registered(),
            MetaIntent::Set {
                widget: "Popup1".into(),
                property: "height".into(),
                value: Value::Number(0.0),
            },
        );
        assert_eq!(state.value("Popup1", "height"), Some(&Value::Number(0.0)));
        let state = MetaReducer::reduce(state, MetaIntent::Reset { widget: "Popup1".into() });
        assert_eq!(state.value("Popup1", "height"), None);
        assert_eq!(state.value("Popup1", "isVisible"), Some(&Value::Bool(false)));
    }

    #[test]
    fn writes_to_unknown_widgets_are_dropped() {
        let before = registered();
        let after = MetaReducer::reduce(
            before.clone(),
            MetaIntent::Commit(MetaTransaction::new().set("Ghost", "isVisible", Value::Bool(true))),
        );
        assert_eq!(before, after);
    }
}
