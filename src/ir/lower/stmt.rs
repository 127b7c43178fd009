use super::expr::{load, lower_condition, lower_expect, lower_value};
use super::Context;
use crate::analysis::semantic::CompileError;
use crate::frontend::ast::{Expr, Position, Statement, StatementKind, Type};
use crate::ir::Opcode;

pub(super) fn lower_statement(ctx: &mut Context, stmt: &Statement, errors: &mut Vec<CompileError>) {
    let result = match &stmt.kind {
        StatementKind::Declare {
            var_name,
            ty,
            value,
        } => lower_declare(ctx, stmt.pos, var_name, *ty, value.as_ref()),

        StatementKind::Assign { var_name, value } => lower_assign(ctx, stmt.pos, var_name, value),

        StatementKind::Block { body } => {
            ctx.scope.push_scope();
            for stmt in body {
                lower_statement(ctx, stmt, errors);
            }
            ctx.scope.pop_scope();
            Ok(())
        }

        StatementKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            lower_if(ctx, cond, then_branch, else_branch.as_deref(), errors);
            Ok(())
        }

        StatementKind::While { cond, body } => {
            lower_while(ctx, cond, body, errors);
            Ok(())
        }

        StatementKind::Output { value } => {
            lower_expect(ctx, value, Type::Int).map(|value| {
                load(ctx, &value);
                ctx.emit(Opcode::Out, "");
            })
        }
    };

    if let Err(err) = result {
        errors.push(err);
    }
}

/*
 * The initialiser is lowered before the name is bound, so `x : int = x + 1`
 * reads the outer `x`. A declaration whose initialiser fails binds nothing.
 */
fn lower_declare(
    ctx: &mut Context,
    pos: Position,
    name: &str,
    declared: Type,
    init: Option<&Expr>,
) -> Result<(), CompileError> {
    let value = match init {
        Some(expr) => {
            let value = lower_value(ctx, expr)?;
            if declared != Type::Undefined && declared != value.ty {
                return Err(CompileError::DeclarationMismatch {
                    declared,
                    found: value.ty,
                    pos,
                    value_pos: expr.pos,
                });
            }
            Some(value)
        }
        None => None,
    };

    let ty = value.as_ref().map_or(declared, |value| value.ty);
    let label = ctx.scope.declare(name, ty);
    ctx.asm.declare_variable(&label);

    if let Some(value) = value {
        load(ctx, &value);
        ctx.emit(Opcode::Sta, label);
    }
    Ok(())
}

fn lower_assign(
    ctx: &mut Context,
    pos: Position,
    name: &str,
    expr: &Expr,
) -> Result<(), CompileError> {
    let Some((label, ty)) = ctx.scope.get(name) else {
        return Err(CompileError::AssignToUndefined {
            name: name.to_string(),
            pos,
        });
    };

    let value = lower_expect(ctx, expr, ty)?;
    load(ctx, &value);
    ctx.emit(Opcode::Sta, label);
    Ok(())
}

/*
 * cond -> T / F
 * T: then ... BRA E (or BRA F without an else)
 * F: else ... BRA E
 * continue in E (or F)
 *
 * A failing branch abandons the rest of the statement; its errors are kept.
 */
fn lower_if(
    ctx: &mut Context,
    cond: &Expr,
    then_branch: &Statement,
    else_branch: Option<&Statement>,
    errors: &mut Vec<CompileError>,
) {
    let if_true = ctx.asm.new_unique_block();
    let if_false = ctx.asm.new_unique_block();

    if let Err(err) = lower_condition(ctx, cond, if_true, if_false) {
        errors.push(err);
        return;
    }

    let reported = errors.len();
    ctx.switch_to(if_true);
    lower_statement(ctx, then_branch, errors);
    if errors.len() > reported {
        return;
    }
    let then_tail = ctx.current_block;

    let Some(else_branch) = else_branch else {
        ctx.jump(then_tail, Opcode::Bra, if_false);
        ctx.switch_to(if_false);
        return;
    };

    let exit = ctx.asm.new_unique_block();
    ctx.switch_to(if_false);
    lower_statement(ctx, else_branch, errors);
    if errors.len() > reported {
        return;
    }
    let else_tail = ctx.current_block;

    ctx.jump(then_tail, Opcode::Bra, exit);
    ctx.jump(else_tail, Opcode::Bra, exit);
    ctx.switch_to(exit);
}

/*
 * BRA C
 * C: cond -> L / E
 * L: body ... BRA C
 * continue in E
 *
 * The back edge goes at the end of whatever block the body finished in.
 */
fn lower_while(ctx: &mut Context, cond: &Expr, body: &Statement, errors: &mut Vec<CompileError>) {
    let cond_block = ctx.asm.new_unique_block();
    let loop_block = ctx.asm.new_unique_block();
    let exit = ctx.asm.new_unique_block();

    let entry = ctx.current_block;
    ctx.jump(entry, Opcode::Bra, cond_block);
    ctx.switch_to(cond_block);

    if let Err(err) = lower_condition(ctx, cond, loop_block, exit) {
        errors.push(err);
        return;
    }

    ctx.switch_to(loop_block);
    lower_statement(ctx, body, errors);
    let body_tail = ctx.current_block;
    ctx.jump(body_tail, Opcode::Bra, cond_block);
    ctx.switch_to(exit);
}
