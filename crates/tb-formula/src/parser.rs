use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use tb_core::{TbError, TbResult};

use crate::ast::*;
use crate::lexer::Token;

type ChumskySpan = SimpleSpan;

fn spanned<T>(node: T, span: ChumskySpan) -> Spanned<T> {
    Spanned {
        node,
        span: span.into_range(),
    }
}

fn binary(op: BinaryOp, lhs: Spanned<Expr>, rhs: Spanned<Expr>) -> Spanned<Expr> {
    let span = lhs.span.start..rhs.span.end;
    Spanned {
        node: Expr::Binary(op, Box::new(lhs), Box::new(rhs)),
        span,
    }
}

/// Build the formula parser.
///
/// Precedence from loosest to tightest: comparison, additive,
/// multiplicative, unary, atom. Every binary level is left-associative.
fn formula_parser<'a, I>() -> impl Parser<'a, I, Spanned<Expr>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = ChumskySpan>,
{
    let expr = recursive(|expr| {
        let literal = select! {
            Token::Number(n) => Expr::Number(n),
            Token::Dice(count, sides) => Expr::Dice { count, sides },
            Token::Var(name) => Expr::Var(name),
        }
        .labelled("value");

        let call = select! { Token::Ident(name) => name }
            .labelled("function")
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .collect::<Vec<Spanned<Expr>>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map(|(name, args)| Expr::Call(name, args));

        let atom = choice((
            literal.map_with(|e, x| spanned(e, x.span())),
            call.map_with(|e, x| spanned(e, x.span())),
            expr.delimited_by(just(Token::LParen), just(Token::RParen)),
        ))
        .boxed();

        let unary_op = choice((
            just(Token::Minus).to(UnaryOp::Neg),
            just(Token::Plus).to(UnaryOp::Pos),
        ))
        .map_with(|op, x| (op, x.span()));

        let unary = unary_op
            .repeated()
            .foldr(atom, |(op, span): (UnaryOp, ChumskySpan), rhs: Spanned<Expr>| {
                let span = span.into_range().start..rhs.span.end;
                Spanned {
                    node: Expr::Unary(op, Box::new(rhs)),
                    span,
                }
            })
            .boxed();

        let product_op = choice((
            just(Token::Star).to(BinaryOp::Mul),
            just(Token::Slash).to(BinaryOp::Div),
        ));
        let product = unary
            .clone()
            .foldl(product_op.then(unary).repeated(), |lhs, (op, rhs)| {
                binary(op, lhs, rhs)
            })
            .boxed();

        let sum_op = choice((
            just(Token::Plus).to(BinaryOp::Add),
            just(Token::Minus).to(BinaryOp::Sub),
        ));
        let sum = product
            .clone()
            .foldl(sum_op.then(product).repeated(), |lhs, (op, rhs)| {
                binary(op, lhs, rhs)
            })
            .boxed();

        let comparison_op = choice((
            just(Token::Le).to(BinaryOp::Le),
            just(Token::Ge).to(BinaryOp::Ge),
            just(Token::Lt).to(BinaryOp::Lt),
            just(Token::Gt).to(BinaryOp::Gt),
            just(Token::EqEq).to(BinaryOp::Eq),
        ));
        sum.clone()
            .foldl(comparison_op.then(sum).repeated(), |lhs, (op, rhs)| {
                binary(op, lhs, rhs)
            })
            .labelled("expression")
    });

    expr.then_ignore(end())
}

/// Parse a token stream into an expression tree.
///
/// `source_len` positions the end-of-input span so "unexpected end of
/// formula" errors point just past the last character.
pub fn parse(tokens: &[(Token, std::ops::Range<usize>)], source_len: usize) -> TbResult<Spanned<Expr>> {
    if tokens.is_empty() {
        return Err(TbError::calculation_at("empty formula", 0..source_len));
    }

    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), ChumskySpan::from(span.clone())));

    let eoi: ChumskySpan = (source_len..source_len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = formula_parser().parse(stream).into_output_errors();

    if let Some(error) = errors.into_iter().next() {
        let span = error.span();
        let message = match error.found() {
            Some(token) => format!("unexpected `{token}`"),
            None => "unexpected end of formula".to_string(),
        };
        return Err(TbError::calculation_at(message, span.into_range()));
    }

    output.ok_or_else(|| TbError::calculation_at("unparseable formula", 0..source_len))
}
