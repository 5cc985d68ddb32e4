/// Source span as a byte range.
pub type Span = std::ops::Range<usize>;

/// An AST node with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    /// The wrapped AST node.
    pub node: T,
    /// The byte range of this node in the formula.
    pub span: Span,
}

/// A formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// `{name}` reference, resolved through the stat normalizer.
    Var(String),
    /// `NdM` dice term.
    Dice {
        /// Number of dice.
        count: u32,
        /// Faces per die.
        sides: u32,
    },
    /// Prefix `+` or `-`.
    Unary(UnaryOp, Box<Spanned<Expr>>),
    /// Infix arithmetic or comparison.
    Binary(BinaryOp, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
    /// Function call such as `floor({Body} / 2)`.
    Call(String, Vec<Spanned<Expr>>),
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`
    Pos,
    /// `-x`
    Neg,
}

/// Infix operators, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl BinaryOp {
    /// True for the operators that yield 1 or 0.
    pub fn is_comparison(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Eq)
    }
}

impl Spanned<Expr> {
    /// Visit every node depth-first, left to right.
    pub fn walk(&self, f: &mut impl FnMut(&Spanned<Expr>)) {
        f(self);
        match &self.node {
            Expr::Number(_) | Expr::Var(_) | Expr::Dice { .. } => {}
            Expr::Unary(_, inner) => inner.walk(f),
            Expr::Binary(_, lhs, rhs) => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Expr::Call(_, args) => {
                for arg in args {
                    arg.walk(f);
                }
            }
        }
    }

    /// True if any dice term appears in the expression.
    pub fn has_dice(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| found |= matches!(e.node, Expr::Dice { .. }));
        found
    }

    /// Variable names in source order, duplicates included.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_vars(self, &mut names);
        names
    }
}

fn collect_vars<'a>(expr: &'a Spanned<Expr>, out: &mut Vec<&'a str>) {
    match &expr.node {
        Expr::Var(name) => out.push(name),
        Expr::Number(_) | Expr::Dice { .. } => {}
        Expr::Unary(_, inner) => collect_vars(inner, out),
        Expr::Binary(_, lhs, rhs) => {
            collect_vars(lhs, out);
            collect_vars(rhs, out);
        }
        Expr::Call(_, args) => {
            for arg in args {
                collect_vars(arg, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(node: Expr, span: Span) -> Box<Spanned<Expr>> {
        Box::new(Spanned { node, span })
    }

    #[test]
    fn comparison_ops() {
        assert!(BinaryOp::Le.is_comparison());
        assert!(BinaryOp::Eq.is_comparison());
        assert!(!BinaryOp::Add.is_comparison());
        assert!(!BinaryOp::Div.is_comparison());
    }

    #[test]
    fn walk_finds_dice_and_vars() {
        // {Body} + 2d6
        let expr = Spanned {
            node: Expr::Binary(
                BinaryOp::Add,
                leaf(Expr::Var("Body".into()), 0..6),
                leaf(Expr::Dice { count: 2, sides: 6 }, 9..12),
            ),
            span: 0..12,
        };
        assert!(expr.has_dice());
        assert_eq!(expr.variables(), vec!["Body"]);

        let mut count = 0;
        expr.walk(&mut |_| count += 1);
        assert_eq!(count, 3);
    }

    #[test]
    fn no_dice_in_plain_arithmetic() {
        let expr = Spanned {
            node: Expr::Unary(UnaryOp::Neg, leaf(Expr::Number(3.0), 1..2)),
            span: 0..2,
        };
        assert!(!expr.has_dice());
        assert!(expr.variables().is_empty());
    }
}
