use crate::frontend::ast::{Expr, ExprKind, Statement, StatementKind, Type};
use std::fmt::{self, Write};

// Fully parenthesised so precedence is visible in `--debug` output
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::IntLit { value } => write!(f, "{}", value),
            ExprKind::BoolLit { value } => write!(f, "{}", value),
            ExprKind::Input => write!(f, "in"),
            ExprKind::Variable { name } => write!(f, "{}", name),
            ExprKind::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            ExprKind::Unary { op, operand } => write!(f, "({} {})", op.symbol(), operand),
        }
    }
}

/// Render a parsed program, one statement per line.
pub fn print(program: &[Statement]) -> Result<String, fmt::Error> {
    let mut output = String::new();
    for stmt in program {
        print_statement(&mut output, stmt, "")?;
    }
    Ok(output)
}

fn print_statement(output: &mut String, stmt: &Statement, indent: &str) -> fmt::Result {
    write!(output, "{}", indent)?;

    match &stmt.kind {
        StatementKind::Declare { var_name, ty, value } => {
            write!(output, "{} :", var_name)?;
            if *ty != Type::Undefined {
                write!(output, " {} ", ty)?;
            }
            if let Some(value) = value {
                write!(output, "= {}", value)?;
            }
        }

        StatementKind::Assign { var_name, value } => {
            write!(output, "{} = {}", var_name, value)?;
        }

        StatementKind::Block { body } => {
            writeln!(output, "{{")?;
            let inner = format!("{}    ", indent);
            for s in body {
                print_statement(output, s, &inner)?;
            }
            write!(output, "}}")?;
        }

        StatementKind::If { cond, then_branch, else_branch } => {
            writeln!(output, "if {}", cond)?;
            print_statement(output, then_branch, indent)?;
            if let Some(else_branch) = else_branch {
                writeln!(output, "else")?;
                print_statement(output, else_branch, indent)?;
            }
        }

        StatementKind::While { cond, body } => {
            writeln!(output, "while {}", cond)?;
            print_statement(output, body, indent)?;
        }

        StatementKind::Output { value } => {
            write!(output, "out {}", value)?;
        }
    }

    writeln!(output)
}
