//! Binding expression language.
//!
//! ```text
//! "Hi {{Input1.text}}" → template::split → parser → Expr → Scope::eval → Value
//! ```
//!
//! The grammar is closed: literals, member/index access, allow-listed calls,
//! unary/binary/ternary operators. Evaluation is pure so any subset of
//! properties can be re-run at any time.

mod ast;
mod error;
mod eval;
mod functions;
mod lexer;
mod parser;
pub mod template;
mod value;

pub use ast::{BinaryOp, Expr, Reference, ReferenceRoot, Statement, UnaryOp};
pub use error::ExprError;
pub use eval::{evaluate, DataContext, MapContext, Scope};
pub use functions::is_global_name;
pub use parser::{parse_expression, parse_statements};
pub use value::{format_number, EntityMap, PropertyMap, Value};
