//! Abstract syntax tree for binding expressions and trigger statements.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Ident(String),
    This,
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

/// One statement of a trigger binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expr(Expr),
    Assign { target: Expr, value: Expr },
}

/// Root of a member chain plus the statically known property names after it.
///
/// `Table1.selectedRow.id` yields root `Table1` and segments
/// `["selectedRow", "id"]`. A computed index with a string literal key counts
/// as a segment; any other computed index ends the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub root: ReferenceRoot,
    pub segments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceRoot {
    Named(String),
    This,
}

impl Expr {
    /// Flatten a member/index chain into a [`Reference`], if this expression is one.
    pub fn as_reference(&self) -> Option<Reference> {
        self.reference_chain().map(|(reference, _)| reference)
    }

    /// The chain plus whether further segments may still be appended.
    fn reference_chain(&self) -> Option<(Reference, bool)> {
        match self {
            Expr::Ident(name) => Some((
                Reference {
                    root: ReferenceRoot::Named(name.clone()),
                    segments: Vec::new(),
                },
                true,
            )),
            Expr::This => Some((
                Reference {
                    root: ReferenceRoot::This,
                    segments: Vec::new(),
                },
                true,
            )),
            Expr::Member { object, property } => {
                let (mut reference, open) = object.reference_chain()?;
                if open {
                    reference.segments.push(property.clone());
                }
                Some((reference, open))
            }
            Expr::Index { object, index } => {
                let (mut reference, open) = object.reference_chain()?;
                match index.as_ref() {
                    Expr::Str(key) if open => {
                        reference.segments.push(key.clone());
                        Some((reference, true))
                    }
                    _ => Some((reference, false)),
                }
            }
            _ => None,
        }
    }

    /// Collect every reference chain in the expression, outermost first.
    ///
    /// A chain is reported once at its longest extent; its inner prefixes are
    /// not reported again. Sub-expressions inside computed indexes and call
    /// arguments are scanned too.
    pub fn references(&self) -> Vec<Reference> {
        let mut out = Vec::new();
        collect_references(self, &mut out);
        out
    }
}

fn collect_references(expr: &Expr, out: &mut Vec<Reference>) {
    match expr {
        Expr::Ident(_) | Expr::This | Expr::Member { .. } | Expr::Index { .. } => {
            if let Some(reference) = expr.as_reference() {
                out.push(reference);
            }
            // Computed indexes may themselves reference entities.
            collect_index_references(expr, out);
        }
        Expr::Null | Expr::Bool(_) | Expr::Number(_) | Expr::Str(_) => {}
        Expr::Array(items) => items.iter().for_each(|item| collect_references(item, out)),
        Expr::Object(fields) => fields.iter().for_each(|(_, v)| collect_references(v, out)),
        Expr::Call { callee, args } => {
            collect_references(callee, out);
            args.iter().for_each(|arg| collect_references(arg, out));
        }
        Expr::Unary { operand, .. } => collect_references(operand, out),
        Expr::Binary { left, right, .. } => {
            collect_references(left, out);
            collect_references(right, out);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            collect_references(test, out);
            collect_references(consequent, out);
            collect_references(alternate, out);
        }
    }
}

fn collect_index_references(expr: &Expr, out: &mut Vec<Reference>) {
    match expr {
        Expr::Member { object, .. } => collect_index_references(object, out),
        Expr::Index { object, index } => {
            collect_index_references(object, out);
            if !matches!(index.as_ref(), Expr::Str(_)) {
                collect_references(index, out);
            }
        }
        Expr::Ident(_) | Expr::This => {}
        // Chains rooted at a call or literal: scan the root normally.
        other => collect_references(other, out),
    }
}
