use crate::frontend::ast::{
    BinaryOp, Expr, ExprKind, Position, Statement, StatementKind, Type, UnaryOp,
};
use chumsky::error::{Rich, RichReason};
use chumsky::pratt::{infix, left, prefix};
use chumsky::prelude::*;
use chumsky::Parser;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {pos}")]
pub struct ParseError {
    pub pos: Position,
    pub message: String,
}

type Extra<'src> = extra::Err<Rich<'src, char>>;

// Labels attached to parsers below, and the diagnostic each one turns into.
const VALUE: &str = "a value";
const CLOSING_BRACE: &str = "a '}'";
const STATEMENT: &str = "a statement";

pub fn parse(source: &str) -> Result<Vec<Statement>, Vec<ParseError>> {
    let locator = Locator::new(source);
    let (program, errors) = parser(&locator).parse(source).into_output_errors();
    let errors: Vec<ParseError> = errors.iter().map(|err| locator.error(err)).collect();

    match program {
        Some(program) if errors.is_empty() => Ok(program),
        _ => Err(errors),
    }
}

/// Turns byte spans reported by the parser into line/column positions.
struct Locator<'src> {
    source: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> Locator<'src> {
    fn new(source: &'src str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self { source, line_starts }
    }

    fn position(&self, index: usize) -> Position {
        let index = index.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= index);
        let line_start = self.line_starts[line - 1];
        let column = self.source[line_start..index].chars().count() + 1;
        Position::new(line, column, index)
    }

    fn locate(&self, span: SimpleSpan) -> (Position, usize) {
        (self.position(span.start), span.end.saturating_sub(span.start))
    }

    fn expr(&self, kind: ExprKind, span: SimpleSpan) -> Expr {
        let (pos, len) = self.locate(span);
        Expr { pos, len, kind }
    }

    fn error(&self, err: &Rich<'_, char>) -> ParseError {
        ParseError {
            pos: self.position(err.span().start),
            message: describe(err),
        }
    }
}

fn describe(err: &Rich<'_, char>) -> String {
    if let RichReason::Custom(message) = err.reason() {
        return message.to_string();
    }

    let expected: Vec<String> = err.expected().map(|pattern| format!("{pattern:?}")).collect();
    let known = [
        (VALUE, "expected a value"),
        (CLOSING_BRACE, "expected a '}'"),
        (STATEMENT, "was expecting a statement"),
    ];
    known
        .iter()
        .find(|(label, _)| expected.iter().any(|e| e.contains(label)))
        .map(|(_, message)| message.to_string())
        .unwrap_or_else(|| err.to_string())
}

fn parser<'src>(
    loc: &'src Locator<'src>,
) -> impl Parser<'src, &'src str, Vec<Statement>, Extra<'src>> {
    // Letters then letters/digits. No underscores: shadowed labels append '_'
    // so a user name can never collide with one.
    let ident = any()
        .filter(|c: &char| c.is_alphabetic())
        .then(any().filter(|c: &char| c.is_alphanumeric()).repeated())
        .to_slice()
        .map(|s: &str| s.to_string());

    let int_lit = any()
        .filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .to_slice()
        .validate(|s: &str, e, emitter| match s.parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                emitter.emit(Rich::custom(e.span(), "integer literal out of range"));
                0
            }
        })
        .map(|value| ExprKind::IntLit { value });

    let word = ident.clone().map(|name| match name.as_str() {
        "true" => ExprKind::BoolLit { value: true },
        "false" => ExprKind::BoolLit { value: false },
        "in" => ExprKind::Input,
        _ => ExprKind::Variable { name },
    });

    let atom = int_lit
        .or(word)
        .map_with(move |kind, e| loc.expr(kind, e.span()))
        .padded()
        .labelled(VALUE);

    /*
     * Expression Parser
     * Binding powers, loosest to tightest:
     *   and/or < not (prefix) < comparisons < +/- < - (prefix)
     * Every infix level is left-associative. There is no grouping with
     * parentheses; the grammar has none.
     */
    let sum_op = choice((
        just('+').to(BinaryOp::Add),
        just('-').to(BinaryOp::Sub),
    ))
    .padded();
    let comparison_op = choice((
        just("==").to(BinaryOp::Eq),
        just("!=").to(BinaryOp::Ne),
        just("<=").to(BinaryOp::Le),
        just(">=").to(BinaryOp::Ge),
        just("<").to(BinaryOp::Lt),
        just(">").to(BinaryOp::Gt),
    ))
    .padded();
    let logic_op = choice((
        text::keyword("and").to(BinaryOp::And),
        text::keyword("or").to(BinaryOp::Or),
    ))
    .padded();

    let expr = atom
        .pratt((
            prefix(50, just('-').padded(), move |_, operand: Expr, e| {
                loc.expr(
                    ExprKind::Unary { op: UnaryOp::Neg, operand: Box::new(operand) },
                    e.span(),
                )
            }),
            prefix(5, text::keyword("not").padded(), move |_, operand: Expr, e| {
                loc.expr(
                    ExprKind::Unary { op: UnaryOp::Not, operand: Box::new(operand) },
                    e.span(),
                )
            }),
            infix(left(20), sum_op, move |left: Expr, op, right: Expr, e| {
                loc.expr(
                    ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                    e.span(),
                )
            }),
            infix(left(10), comparison_op, move |left: Expr, op, right: Expr, e| {
                loc.expr(
                    ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                    e.span(),
                )
            }),
            infix(left(1), logic_op, move |left: Expr, op, right: Expr, e| {
                loc.expr(
                    ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                    e.span(),
                )
            }),
        ))
        .boxed();

    let type_name = ident
        .clone()
        .validate(|name, e, emitter| match name.as_str() {
            "int" => Type::Int,
            "bool" => Type::Bool,
            _ => {
                emitter.emit(Rich::custom(e.span(), "invalid type name"));
                Type::Undefined
            }
        })
        .padded();

    /*
     * Statement Parser
     * A statement is an If, While, Output, Block, Declare or Assign
     */
    let statement = recursive(|statement| {
        let if_stmt = text::keyword("if")
            .padded()
            .ignore_then(expr.clone())
            .then(statement.clone())
            .then(
                text::keyword("else")
                    .padded()
                    .ignore_then(statement.clone())
                    .or_not(),
            )
            .map(|((cond, then_branch), else_branch)| StatementKind::If {
                cond,
                then_branch: Box::new(then_branch),
                else_branch: else_branch.map(Box::new),
            });

        let while_stmt = text::keyword("while")
            .padded()
            .ignore_then(expr.clone())
            .then(statement.clone())
            .map(|(cond, body)| StatementKind::While {
                cond,
                body: Box::new(body),
            });

        let output_stmt = text::keyword("out")
            .padded()
            .ignore_then(expr.clone())
            .map(|value| StatementKind::Output { value });

        let block = just('{')
            .padded()
            .ignore_then(statement.clone().repeated().collect::<Vec<_>>())
            .then_ignore(just('}').padded().labelled(CLOSING_BRACE))
            .map(|body| StatementKind::Block { body })
            .recover_with(via_parser(nested_delimiters(
                '{',
                '}',
                [],
                |_| StatementKind::Block { body: Vec::new() },
            )));

        // `x : int = 5`, `x : = 5`, `x : bool`
        let declare = ident
            .clone()
            .padded()
            .then_ignore(just(':').padded())
            .then(type_name.clone().or_not())
            .then(just('=').padded().ignore_then(expr.clone()).or_not())
            .map(|((var_name, ty), value)| StatementKind::Declare {
                var_name,
                ty: ty.unwrap_or(Type::Undefined),
                value,
            });

        let assign = ident
            .clone()
            .padded()
            .then_ignore(just('=').padded())
            .then(expr.clone())
            .map(|(var_name, value)| StatementKind::Assign { var_name, value });

        choice((if_stmt, while_stmt, output_stmt, block, declare, assign))
            .map_with(move |kind, e| {
                let (pos, len) = loc.locate(e.span());
                Statement { pos, len, kind }
            })
            .labelled(STATEMENT)
    });

    /* Program Parser: a flat list of statements */
    text::whitespace()
        .ignore_then(statement.repeated().collect::<Vec<_>>())
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Vec<Statement> {
        match parse(source) {
            Ok(program) => program,
            Err(errors) => panic!("unexpected parse errors for {source:?}: {errors:?}"),
        }
    }

    fn output_expr(stmt: &Statement) -> &Expr {
        match &stmt.kind {
            StatementKind::Output { value } => value,
            other => panic!("expected an output statement, got {other:?}"),
        }
    }

    fn binary_op(expr: &Expr) -> (BinaryOp, &Expr, &Expr) {
        match &expr.kind {
            ExprKind::Binary { op, left, right } => (*op, left, right),
            other => panic!("expected a binary expression, got {other:?}"),
        }
    }

    #[test]
    fn parses_every_statement_form() {
        let program = parse_ok(
            "x : int = 5\n\
             y : bool\n\
             z : = in\n\
             x = x + 3\n\
             if y out x else out 0\n\
             while x > 0 { x = x - 1 }\n\
             out x",
        );
        assert_eq!(program.len(), 7);

        assert!(matches!(
            &program[0].kind,
            StatementKind::Declare { var_name, ty: Type::Int, value: Some(_) } if var_name == "x"
        ));
        assert!(matches!(
            &program[1].kind,
            StatementKind::Declare { ty: Type::Bool, value: None, .. }
        ));
        assert!(matches!(
            &program[2].kind,
            StatementKind::Declare { ty: Type::Undefined, value: Some(Expr { kind: ExprKind::Input, .. }), .. }
        ));
        assert!(matches!(&program[3].kind, StatementKind::Assign { var_name, .. } if var_name == "x"));
        assert!(matches!(
            &program[4].kind,
            StatementKind::If { else_branch: Some(_), .. }
        ));
        match &program[5].kind {
            StatementKind::While { body, .. } => {
                assert!(matches!(&body.kind, StatementKind::Block { body } if body.len() == 1))
            }
            other => panic!("expected while, got {other:?}"),
        }
        assert!(matches!(&program[6].kind, StatementKind::Output { .. }));
    }

    #[test]
    fn arithmetic_binds_tighter_than_comparison_and_logic() {
        let program = parse_ok("out a + 1 < b and c");
        let (op, left, _) = binary_op(output_expr(&program[0]));
        assert_eq!(op, BinaryOp::And);

        let (op, sum, _) = binary_op(left);
        assert_eq!(op, BinaryOp::Lt);

        let (op, _, _) = binary_op(sum);
        assert_eq!(op, BinaryOp::Add);
    }

    #[test]
    fn operators_are_left_associative() {
        let program = parse_ok("out a - b - c");
        let (op, left, right) = binary_op(output_expr(&program[0]));
        assert_eq!(op, BinaryOp::Sub);
        assert!(matches!(&right.kind, ExprKind::Variable { name } if name == "c"));
        assert!(matches!(binary_op(left).0, BinaryOp::Sub));

        let program = parse_ok("out a or b and c");
        let (op, left, _) = binary_op(output_expr(&program[0]));
        assert_eq!(op, BinaryOp::And);
        assert_eq!(binary_op(left).0, BinaryOp::Or);
    }

    #[test]
    fn negation_takes_a_single_operand() {
        let program = parse_ok("out -a + b");
        let (op, left, _) = binary_op(output_expr(&program[0]));
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(&left.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn not_covers_comparisons_but_not_logic() {
        let program = parse_ok("out not a < b and c");
        let (op, left, _) = binary_op(output_expr(&program[0]));
        assert_eq!(op, BinaryOp::And);
        match &left.kind {
            ExprKind::Unary { op: UnaryOp::Not, operand } => {
                assert_eq!(binary_op(operand).0, BinaryOp::Lt)
            }
            other => panic!("expected not, got {other:?}"),
        }
    }

    #[test]
    fn keywords_are_whole_words() {
        let program = parse_ok("output : int = 1 out output");
        assert!(matches!(
            &program[0].kind,
            StatementKind::Declare { var_name, .. } if var_name == "output"
        ));
        assert!(matches!(
            &output_expr(&program[1]).kind,
            ExprKind::Variable { name } if name == "output"
        ));
    }

    #[test]
    fn literals_and_input() {
        let program = parse_ok("out 42 b : = true c : = false out in");
        assert!(matches!(output_expr(&program[0]).kind, ExprKind::IntLit { value: 42 }));
        assert!(matches!(
            &program[1].kind,
            StatementKind::Declare { value: Some(Expr { kind: ExprKind::BoolLit { value: true }, .. }), .. }
        ));
        assert!(matches!(
            &program[2].kind,
            StatementKind::Declare { value: Some(Expr { kind: ExprKind::BoolLit { value: false }, .. }), .. }
        ));
        assert!(matches!(output_expr(&program[3]).kind, ExprKind::Input));
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let program = parse_ok("out 1\n  x : int = 2");
        assert_eq!(program[0].pos, Position::new(1, 1, 0));
        assert_eq!(program[1].pos, Position::new(2, 3, 8));
        match &program[1].kind {
            StatementKind::Declare { value: Some(value), .. } => {
                assert_eq!(value.pos, Position::new(2, 13, 18));
                assert_eq!(value.len, 1);
            }
            other => panic!("expected declaration, got {other:?}"),
        }
    }

    #[test]
    fn unicode_whitespace_separates_tokens() {
        let program = parse_ok("out\u{00a0}1\u{2003}out\t2");
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn empty_source_is_an_empty_program() {
        assert!(parse_ok("").is_empty());
        assert!(parse_ok("  \n ").is_empty());
    }

    #[test]
    fn invalid_type_name_is_reported() {
        let errors = parse("x : float = 1").unwrap_err();
        assert!(
            errors.iter().any(|e| e.message == "invalid type name"),
            "{errors:?}"
        );
        assert_eq!(errors[0].pos.line, 1);
    }

    #[test]
    fn missing_value_is_reported() {
        let errors = parse("out").unwrap_err();
        assert!(!errors.is_empty());
        assert!(
            errors.iter().any(|e| e.message == "expected a value"),
            "{errors:?}"
        );
    }

    #[test]
    fn oversized_literal_is_reported() {
        let errors = parse("out 99999999999999999999").unwrap_err();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert_eq!(errors[0].message, "integer literal out of range");
        assert_eq!(errors[0].pos, Position::new(1, 5, 4));
        assert_eq!(parse_ok("out 9223372036854775807").len(), 1);
    }

    #[test]
    fn stray_tokens_are_rejected() {
        assert!(parse("out 1 )").is_err());
        assert!(parse("1 + 2").is_err());
    }

    #[test]
    fn parse_error_display_includes_position() {
        let err = ParseError {
            pos: Position::new(3, 7, 20),
            message: "expected a value".to_string(),
        };
        assert_eq!(err.to_string(), "expected a value at (3, 7)");
    }
}
