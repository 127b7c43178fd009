use super::Context;
use crate::analysis::semantic::CompileError;
use crate::frontend::ast::{BinaryOp, Expr, ExprKind, Type, UnaryOp};
use crate::ir::cfg::BlockId;
use crate::ir::Opcode;

/// Where an evaluated expression currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Accumulator,
    Cell(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub ty: Type,
    pub location: Location,
}

impl Value {
    fn accumulator(ty: Type) -> Self {
        Self {
            ty,
            location: Location::Accumulator,
        }
    }

    fn cell(ty: Type, label: String) -> Self {
        Self {
            ty,
            location: Location::Cell(label),
        }
    }
}

/*
 * Value mode: evaluate `expr` and say where the result ended up.
 *
 * Only one accumulator-resident value is ever live. Binary operands are
 * lowered right first so the right one can sit in a cell while the left is
 * loaded; that order also fixes the order `in` reads happen in.
 */
pub(super) fn lower_value(ctx: &mut Context, expr: &Expr) -> Result<Value, CompileError> {
    match &expr.kind {
        ExprKind::IntLit { value } => Ok(Value::cell(Type::Int, ctx.asm.get_constant(*value))),

        ExprKind::BoolLit { value } => {
            let label = ctx.asm.get_constant(i64::from(*value));
            Ok(Value::cell(Type::Bool, label))
        }

        ExprKind::Input => {
            ctx.emit(Opcode::Inp, "");
            Ok(Value::accumulator(Type::Int))
        }

        ExprKind::Variable { name } => match ctx.scope.get(name) {
            Some((label, ty)) => Ok(Value::cell(ty, label)),
            None => Err(CompileError::UndefinedVariable {
                name: name.clone(),
                pos: expr.pos,
            }),
        },

        ExprKind::Binary { op, left, right } if op.is_arithmetic() => {
            let right = lower_expect(ctx, right, Type::Int)?;
            with_spilled(ctx, &right, |ctx, right_label| {
                let left = lower_expect(ctx, left, Type::Int)?;
                load(ctx, &left);
                let opcode = match op {
                    BinaryOp::Add => Opcode::Add,
                    _ => Opcode::Sub,
                };
                ctx.emit(opcode, right_label);
                Ok(Value::accumulator(Type::Int))
            })
        }

        ExprKind::Binary { .. } | ExprKind::Unary { op: UnaryOp::Not, .. } => {
            materialize(ctx, expr)
        }

        ExprKind::Unary { op: UnaryOp::Neg, operand } => {
            let operand = lower_expect(ctx, operand, Type::Int)?;
            with_spilled(ctx, &operand, |ctx, operand_label| {
                let zero = ctx.asm.get_constant(0);
                ctx.emit(Opcode::Lda, zero);
                ctx.emit(Opcode::Sub, operand_label);
                Ok(Value::accumulator(Type::Int))
            })
        }
    }
}

/// Value mode, failing unless the result has type `ty`.
pub(super) fn lower_expect(
    ctx: &mut Context,
    expr: &Expr,
    ty: Type,
) -> Result<Value, CompileError> {
    let value = lower_value(ctx, expr)?;
    if value.ty != ty {
        return Err(CompileError::TypeMismatch {
            expected: ty,
            found: value.ty,
            pos: expr.pos,
        });
    }
    Ok(value)
}

/*
 * Condition mode: branch to `if_true` or `if_false` depending on `expr`.
 * Nothing is left in the accumulator that anyone reads afterwards.
 */
pub(super) fn lower_condition(
    ctx: &mut Context,
    expr: &Expr,
    if_true: BlockId,
    if_false: BlockId,
) -> Result<(), CompileError> {
    match &expr.kind {
        ExprKind::IntLit { .. } => Err(CompileError::IntCondition { pos: expr.pos }),

        ExprKind::BoolLit { value } => {
            let target = if *value { if_true } else { if_false };
            let current = ctx.current_block;
            ctx.jump(current, Opcode::Bra, target);
            Ok(())
        }

        ExprKind::Input => Err(CompileError::InputCondition { pos: expr.pos }),

        ExprKind::Variable { name } => {
            let Some((label, ty)) = ctx.scope.get(name) else {
                return Err(CompileError::UndefinedVariable {
                    name: name.clone(),
                    pos: expr.pos,
                });
            };
            if ty == Type::Int {
                return Err(CompileError::NonBoolCondition {
                    name: name.clone(),
                    ty,
                    pos: expr.pos,
                });
            }
            ctx.emit(Opcode::Lda, label);
            let current = ctx.current_block;
            ctx.jump(current, Opcode::Brz, if_false);
            ctx.jump(current, Opcode::Bra, if_true);
            Ok(())
        }

        ExprKind::Unary { op: UnaryOp::Not, operand } => {
            lower_condition(ctx, operand, if_false, if_true)
        }

        ExprKind::Unary { op: UnaryOp::Neg, .. } => {
            Err(CompileError::NegationCondition { pos: expr.pos })
        }

        ExprKind::Binary { op, left, right } => {
            lower_binary_condition(ctx, expr, *op, left, right, if_true, if_false)
        }
    }
}

/*
 * LMC can only test "acc >= 0" (BRP) and "acc == 0" (BRZ), so every relation
 * becomes a subtraction plus BRP with the operands and/or targets swapped:
 *
 *   a >= b   a - b   true -> if_true
 *   a <  b   a - b   true -> if_false
 *   a <= b   b - a   true -> if_true
 *   a >  b   b - a   true -> if_false
 *   a == b   a - b   true -> if_true
 *   a != b   a - b   true -> if_false
 *
 * Equality shares the BRP encoding; existing listings depend on it.
 */
fn lower_binary_condition(
    ctx: &mut Context,
    expr: &Expr,
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    if_true: BlockId,
    if_false: BlockId,
) -> Result<(), CompileError> {
    match op {
        BinaryOp::Ge | BinaryOp::Eq => lower_sign_branch(ctx, left, right, if_true, if_false),
        BinaryOp::Lt | BinaryOp::Ne => lower_sign_branch(ctx, left, right, if_false, if_true),
        BinaryOp::Le => lower_sign_branch(ctx, right, left, if_true, if_false),
        BinaryOp::Gt => lower_sign_branch(ctx, right, left, if_false, if_true),

        // Short circuit: the right side gets its own block, reached only
        // when the left side did not already decide the outcome.
        BinaryOp::And => {
            let next = ctx.asm.new_unique_block();
            lower_condition(ctx, left, next, if_false)?;
            ctx.switch_to(next);
            lower_condition(ctx, right, if_true, if_false)
        }
        BinaryOp::Or => {
            let next = ctx.asm.new_unique_block();
            lower_condition(ctx, left, if_true, next)?;
            ctx.switch_to(next);
            lower_condition(ctx, right, if_true, if_false)
        }

        BinaryOp::Add | BinaryOp::Sub => Err(CompileError::TypeMismatch {
            expected: Type::Bool,
            found: Type::Int,
            pos: expr.pos,
        }),
    }
}

// acc = left - right, then BRP if_nonnegative / BRA if_negative
fn lower_sign_branch(
    ctx: &mut Context,
    left: &Expr,
    right: &Expr,
    if_nonnegative: BlockId,
    if_negative: BlockId,
) -> Result<(), CompileError> {
    let right = lower_expect(ctx, right, Type::Int)?;
    with_spilled(ctx, &right, |ctx, right_label| {
        let left = lower_expect(ctx, left, Type::Int)?;
        load(ctx, &left);
        ctx.emit(Opcode::Sub, right_label);
        Ok(())
    })?;

    let current = ctx.current_block;
    ctx.jump(current, Opcode::Brp, if_nonnegative);
    ctx.jump(current, Opcode::Bra, if_negative);
    Ok(())
}

/*
 * Turn a boolean expression into 0/1 in the accumulator:
 *
 *   T: LDA c1; BRA E      F: LDA c0; BRA E
 *
 * then lower `expr` in condition mode towards T/F and continue in E.
 */
fn materialize(ctx: &mut Context, expr: &Expr) -> Result<Value, CompileError> {
    let if_true = ctx.asm.new_unique_block();
    let if_false = ctx.asm.new_unique_block();
    let exit = ctx.asm.new_unique_block();

    let zero = ctx.asm.get_constant(0);
    ctx.asm.emit(if_false, Opcode::Lda, zero);
    let one = ctx.asm.get_constant(1);
    ctx.asm.emit(if_true, Opcode::Lda, one);
    ctx.jump(if_true, Opcode::Bra, exit);
    ctx.jump(if_false, Opcode::Bra, exit);

    lower_condition(ctx, expr, if_true, if_false)?;
    ctx.switch_to(exit);
    Ok(Value::accumulator(Type::Bool))
}

/// Make sure `value` is in the accumulator.
pub(super) fn load(ctx: &mut Context, value: &Value) {
    if let Location::Cell(label) = &value.location {
        ctx.emit(Opcode::Lda, label.clone());
    }
}

/*
 * Run `f` with `value` parked in a named cell.
 * A value already in a cell is used in place; one in the accumulator is
 * stored to a fresh spill temp, which is released once `f` returns (on the
 * error path too).
 */
fn with_spilled<T>(
    ctx: &mut Context,
    value: &Value,
    f: impl FnOnce(&mut Context, &str) -> Result<T, CompileError>,
) -> Result<T, CompileError> {
    match &value.location {
        Location::Cell(label) => f(ctx, label),
        Location::Accumulator => {
            let temp = ctx.asm.push_temp();
            ctx.emit(Opcode::Sta, temp.clone());
            let result = f(ctx, &temp);
            ctx.asm.pop_temp();
            result
        }
    }
}
