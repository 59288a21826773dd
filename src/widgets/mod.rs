//! Widget capabilities: schemas, factory, events and render descriptions.
//!
//! Each widget type implements [`WidgetKind`]; the [`WidgetFactory`] maps a
//! [`WidgetType`](crate::tree::WidgetType) to its kind and instantiates
//! [`RenderableWidget`]s for a render mode.

mod factory;
mod kind;
pub mod kinds;
mod render;
mod schema;

pub use factory::{RenderableWidget, WidgetError, WidgetFactory};
pub use kind::{EventResponse, WidgetEvent, WidgetKind};
pub use render::{RenderContext, RenderNode};
pub use schema::{ControlType, DerivedProperty, PropertyConfig, PropertySection, Validation};
