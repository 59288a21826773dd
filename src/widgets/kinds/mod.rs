//! Built-in widget kinds.

mod button;
mod canvas;
mod container;
mod input;
mod popup;
mod table;
mod text;

pub use button::ButtonWidget;
pub use canvas::CanvasWidget;
pub use container::ContainerWidget;
pub use input::InputWidget;
pub use popup::PopupWidget;
pub use table::TableWidget;
pub use text::TextWidget;
