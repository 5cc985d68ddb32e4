//! Deterministic formula evaluation against a stat context.

use tracing::debug;

use tb_core::{StatMap, StatNameNormalizer, TbError, TbResult};

use crate::ast::{BinaryOp, Expr, Span, Spanned, UnaryOp};
use crate::lexer::{Token, lex};
use crate::parser::parse;

/// A formula that has been lexed and parsed, ready to evaluate repeatedly.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
    /// Formula text as given.
    pub source: String,
    /// Tokens with byte spans, kept for rendering roll details.
    pub tokens: Vec<(Token, Span)>,
    /// The expression tree.
    pub expr: Spanned<Expr>,
}

/// Lex and parse a formula.
pub fn compile(formula: &str) -> TbResult<CompiledFormula> {
    let tokens = lex(formula)?;
    let expr = parse(&tokens, formula.len())?;
    Ok(CompiledFormula {
        source: formula.to_string(),
        tokens,
        expr,
    })
}

impl CompiledFormula {
    /// Evaluate without dice. Dice terms are a calculation error.
    pub fn evaluate(&self, context: &StatMap, normalizer: &StatNameNormalizer) -> TbResult<f64> {
        let scope = Scope {
            stats: context,
            normalizer,
        };
        eval_expr(&self.expr, &scope, &mut NoDice)
    }
}

/// Evaluate a dice-free formula with the standard stat normalizer.
///
/// ```
/// use tb_core::StatNameNormalizer;
/// let stats = StatNameNormalizer::standard().stat_map([("Body", 5.0)]);
/// assert_eq!(tb_formula::evaluate("{肉体} + 5", &stats).unwrap(), 10.0);
/// ```
pub fn evaluate(formula: &str, context: &StatMap) -> TbResult<f64> {
    evaluate_with(formula, context, StatNameNormalizer::standard())
}

/// Evaluate a dice-free formula, resolving variables through `normalizer`.
pub fn evaluate_with(
    formula: &str,
    context: &StatMap,
    normalizer: &StatNameNormalizer,
) -> TbResult<f64> {
    compile(formula)?.evaluate(context, normalizer)
}

/// Variable resolution for one evaluation.
pub(crate) struct Scope<'a> {
    pub stats: &'a StatMap,
    pub normalizer: &'a StatNameNormalizer,
}

impl Scope<'_> {
    /// Unresolved names evaluate to 0.
    pub fn lookup(&self, name: &str) -> f64 {
        let key = self.normalizer.normalize(name);
        match self.stats.get(&key) {
            Some(value) => *value,
            None => {
                debug!(variable = name, key = %key, "unresolved variable, using 0");
                0.0
            }
        }
    }
}

/// Supplies values for dice terms during evaluation.
pub(crate) trait DiceSource {
    fn roll(&mut self, count: u32, sides: u32, span: &Span) -> TbResult<f64>;
}

/// Rejects dice; used by [`evaluate`].
struct NoDice;

impl DiceSource for NoDice {
    fn roll(&mut self, count: u32, sides: u32, span: &Span) -> TbResult<f64> {
        Err(TbError::calculation_at(
            format!("dice term {count}d{sides} is not allowed in a stat formula"),
            span.clone(),
        ))
    }
}

pub(crate) fn eval_expr(
    expr: &Spanned<Expr>,
    scope: &Scope<'_>,
    dice: &mut dyn DiceSource,
) -> TbResult<f64> {
    let value = match &expr.node {
        Expr::Number(n) => *n,
        Expr::Var(name) => scope.lookup(name),
        Expr::Dice { count, sides } => dice.roll(*count, *sides, &expr.span)?,
        Expr::Unary(op, inner) => {
            let v = eval_expr(inner, scope, dice)?;
            match op {
                UnaryOp::Pos => v,
                UnaryOp::Neg => -v,
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = eval_expr(lhs, scope, dice)?;
            let r = eval_expr(rhs, scope, dice)?;
            apply_binary(*op, l, r, &expr.span)?
        }
        Expr::Call(name, args) => {
            check_call(name, args.len(), &expr.span)?;
            let values = args
                .iter()
                .map(|arg| eval_expr(arg, scope, dice))
                .collect::<TbResult<Vec<f64>>>()?;
            apply_call(name, &values, &expr.span)?
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(TbError::calculation_at(
            "result is not a finite number",
            expr.span.clone(),
        ))
    }
}

fn apply_binary(op: BinaryOp, l: f64, r: f64, span: &Span) -> TbResult<f64> {
    Ok(match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => {
            if r == 0.0 {
                return Err(TbError::calculation_at("division by zero", span.clone()));
            }
            l / r
        }
        BinaryOp::Lt => f64::from(l < r),
        BinaryOp::Le => f64::from(l <= r),
        BinaryOp::Gt => f64::from(l > r),
        BinaryOp::Ge => f64::from(l >= r),
        BinaryOp::Eq => f64::from(l == r),
    })
}

/// Functions taking exactly one argument.
const UNARY_FUNCTIONS: &[&str] = &["floor", "ceil", "round", "abs", "sqrt"];
/// Functions taking one or more arguments.
const VARIADIC_FUNCTIONS: &[&str] = &["min", "max"];

/// Check a call's name and arity.
pub(crate) fn check_call(name: &str, argc: usize, span: &Span) -> TbResult<()> {
    if UNARY_FUNCTIONS.contains(&name) {
        if argc != 1 {
            return Err(TbError::calculation_at(
                format!("{name} expects 1 argument, got {argc}"),
                span.clone(),
            ));
        }
        Ok(())
    } else if VARIADIC_FUNCTIONS.contains(&name) {
        if argc == 0 {
            return Err(TbError::calculation_at(
                format!("{name} expects at least 1 argument"),
                span.clone(),
            ));
        }
        Ok(())
    } else {
        Err(TbError::calculation_at(
            format!("unknown function: {name}"),
            span.clone(),
        ))
    }
}

fn apply_call(name: &str, args: &[f64], span: &Span) -> TbResult<f64> {
    match (name, args) {
        ("floor", [x]) => Ok(x.floor()),
        ("ceil", [x]) => Ok(x.ceil()),
        ("round", [x]) => Ok(x.round()),
        ("abs", [x]) => Ok(x.abs()),
        ("sqrt", [x]) => Ok(x.sqrt()),
        ("min", [first, rest @ ..]) => Ok(rest.iter().fold(*first, |a, b| a.min(*b))),
        ("max", [first, rest @ ..]) => Ok(rest.iter().fold(*first, |a, b| a.max(*b))),
        _ => Err(TbError::calculation_at(
            format!("cannot apply {name} to {} arguments", args.len()),
            span.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tb_core::ErrorCode;

    fn stats(entries: &[(&str, f64)]) -> StatMap {
        StatNameNormalizer::standard().stat_map(entries.iter().copied())
    }

    fn eval(formula: &str) -> f64 {
        evaluate(formula, &StatMap::new()).unwrap()
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("10 - 3 - 2"), 5.0);
        assert_eq!(eval("7 / 2"), 3.5);
        assert_eq!(eval("-3 + 5"), 2.0);
        assert_eq!(eval("2.5 * 2"), 5.0);
        assert_eq!(eval(".5 + 1"), 1.5);
    }

    #[test]
    fn comparisons_yield_one_or_zero() {
        assert_eq!(eval("3 <= 5"), 1.0);
        assert_eq!(eval("3 >= 5"), 0.0);
        assert_eq!(eval("5 == 5"), 1.0);
        assert_eq!(eval("1 + 1 > 1"), 1.0);
        assert_eq!(eval("2 < 1"), 0.0);
    }

    #[test]
    fn variable_lookup() {
        let ctx = stats(&[("Body", 5.0)]);
        assert_eq!(evaluate("{Body} + 5", &ctx).unwrap(), 10.0);
    }

    #[test]
    fn localized_variable_lookup() {
        let ctx = stats(&[("Body", 5.0), ("カルマ", 20.0)]);
        assert_eq!(evaluate("{肉体}", &ctx).unwrap(), 5.0);
        assert_eq!(evaluate("{肉体} + {カルマ}", &ctx).unwrap(), 25.0);
    }

    #[test]
    fn unresolved_variable_is_zero() {
        assert_eq!(eval("{Nothing} + 3"), 3.0);
    }

    #[test]
    fn custom_normalizer() {
        let normalizer = StatNameNormalizer::new().with_alias("筋力", "STR");
        let ctx = normalizer.stat_map([("STR", 4.0)]);
        assert_eq!(evaluate_with("{筋力} * 2", &ctx, &normalizer).unwrap(), 8.0);
    }

    #[test]
    fn functions() {
        assert_eq!(eval("floor(7 / 2)"), 3.0);
        assert_eq!(eval("ceil(7 / 2)"), 4.0);
        assert_eq!(eval("round(2.4)"), 2.0);
        assert_eq!(eval("abs(-4)"), 4.0);
        assert_eq!(eval("sqrt(16)"), 4.0);
        assert_eq!(eval("min(3, 1, 2)"), 1.0);
        assert_eq!(eval("max(3, 1, 2)"), 3.0);
        assert_eq!(eval("max(5)"), 5.0);
    }

    #[test]
    fn default_derived_formulas() {
        let ctx = stats(&[("Grade", 1.0), ("Body", 3.0), ("Spirit", 2.0), ("Science", 1.0)]);
        assert_eq!(evaluate("({Grade} + {Body}) * 5", &ctx).unwrap(), 20.0);
        assert_eq!(evaluate("({Grade} + {Spirit}) * 5", &ctx).unwrap(), 15.0);
        assert_eq!(evaluate("{Grade} + {Science} + 10", &ctx).unwrap(), 12.0);
    }

    #[test]
    fn dangling_operator_is_calculation_error() {
        let err = evaluate("1 +", &StatMap::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CalculationError);
    }

    #[test]
    fn empty_formula_is_error() {
        assert!(evaluate("", &StatMap::new()).is_err());
    }

    #[test]
    fn division_by_zero() {
        let err = evaluate("1 / 0", &StatMap::new()).unwrap_err();
        assert!(err.to_string().contains("division by zero"));
        assert_eq!(err.span(), Some(0..5));
    }

    #[test]
    fn division_by_unresolved_variable() {
        assert!(evaluate("10 / {Missing}", &StatMap::new()).is_err());
    }

    #[test]
    fn non_finite_result() {
        assert!(evaluate("sqrt(-1)", &StatMap::new()).is_err());
    }

    #[test]
    fn dice_rejected() {
        let err = evaluate("2d6 + 1", &StatMap::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CalculationError);
        assert_eq!(err.span(), Some(0..3));
    }

    #[test]
    fn unknown_function() {
        let err = evaluate("pow(2, 3)", &StatMap::new()).unwrap_err();
        insta::assert_snapshot!(err, @"calculation error: unknown function: pow");
    }

    #[test]
    fn wrong_arity() {
        let err = evaluate("floor(1, 2)", &StatMap::new()).unwrap_err();
        insta::assert_snapshot!(err, @"calculation error: floor expects 1 argument, got 2");
        assert!(evaluate("min()", &StatMap::new()).is_err());
    }

    #[test]
    fn compiled_formula_reuse() {
        let formula = compile("{Body} * 2").unwrap();
        let normalizer = StatNameNormalizer::standard();
        assert_eq!(formula.evaluate(&stats(&[("Body", 2.0)]), normalizer).unwrap(), 4.0);
        assert_eq!(formula.evaluate(&stats(&[("Body", 7.0)]), normalizer).unwrap(), 14.0);
        assert_eq!(formula.expr.variables(), vec!["Body"]);
    }

    proptest! {
        #[test]
        fn evaluation_is_deterministic(a in -1000i32..1000, b in 1i32..1000, body in -50i32..50) {
            let ctx = stats(&[("Body", f64::from(body))]);
            let formula = format!("({a} + {{Body}}) * 3 / {b}");
            let first = evaluate(&formula, &ctx).unwrap();
            let second = evaluate(&formula, &ctx).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn integer_addition_matches(a in -10_000i32..10_000, b in -10_000i32..10_000) {
            let result = evaluate(&format!("{a} + {b}"), &StatMap::new()).unwrap();
            prop_assert_eq!(result, f64::from(a) + f64::from(b));
        }
    }
}
