mod expr;
mod stmt;

pub use expr::{Location, Value};

use crate::analysis::scope::Scope;
use crate::analysis::semantic::CompileError;
use crate::frontend::ast::Statement;
use crate::ir::cfg::{Assembly, BlockId};
use crate::ir::Opcode;

/// State of one compilation: the block list being built, the symbol table,
/// and the block new instructions are appended to.
struct Context {
    asm: Assembly,
    scope: Scope,
    current_block: BlockId,
}

impl Context {
    fn new() -> Self {
        let mut asm = Assembly::new();
        let entry = asm.new_block("start");

        Self {
            asm,
            scope: Scope::new(),
            current_block: entry,
        }
    }

    fn switch_to(&mut self, block: BlockId) {
        self.current_block = block;
    }

    fn emit(&mut self, opcode: Opcode, operand: impl Into<String>) {
        self.asm.emit(self.current_block, opcode, operand);
    }

    // Branch from `from` to the block `to`
    fn jump(&mut self, from: BlockId, opcode: Opcode, to: BlockId) {
        let target = self.asm.label(to).to_string();
        self.asm.emit(from, opcode, target);
    }
}

/*
 * Lower a whole program into LMC blocks.
 *
 * Statement-level errors are collected and lowering carries on with the next
 * sibling, so one run reports as many problems as it can. Any error means no
 * assembly is returned.
 */
pub fn lower(program: &[Statement]) -> Result<Assembly, Vec<CompileError>> {
    let mut ctx = Context::new();
    let mut errors = Vec::new();

    for stmt in program {
        stmt::lower_statement(&mut ctx, stmt, &mut errors);
    }
    ctx.emit(Opcode::Hlt, "");

    if errors.is_empty() {
        debug_assert_eq!(ctx.asm.current_temp(), 0, "unbalanced spill temps");
        Ok(ctx.asm)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse;

    fn lower_source(source: &str) -> Result<Assembly, Vec<CompileError>> {
        let program = parse(source).expect("test source should parse");
        lower(&program)
    }

    fn code(asm: &Assembly, label: &str) -> Vec<String> {
        asm.find(label)
            .unwrap_or_else(|| panic!("no block labelled {label}"))
            .instructions
            .iter()
            .map(|instr| format!("{} {}", instr.opcode, instr.operand).trim_end().to_string())
            .collect()
    }

    #[test]
    fn program_ends_in_halt() {
        let asm = lower_source("").unwrap();
        assert_eq!(asm.blocks.len(), 1);
        assert_eq!(code(&asm, "start"), ["HLT"]);
    }

    #[test]
    fn nested_arithmetic_stacks_temps() {
        let asm = lower_source("out in + in + in").unwrap();
        assert_eq!(
            code(&asm, "start"),
            [
                "INP", "STA temp0", "INP", "STA temp1", "INP", "ADD temp1", "ADD temp0", "OUT",
                "HLT",
            ]
        );
        assert_eq!(asm.max_temp(), 2);
        assert_eq!(asm.current_temp(), 0);
    }

    #[test]
    fn temps_are_reused_between_statements() {
        let asm = lower_source("out in - in\nout in - in").unwrap();
        let temps: Vec<&str> = asm
            .blocks
            .iter()
            .map(|block| block.label.as_str())
            .filter(|label| label.starts_with("temp"))
            .collect();
        assert_eq!(temps, ["temp0"]);
    }

    #[test]
    fn negation_subtracts_from_zero() {
        let asm = lower_source("x : int = 3\nout -x").unwrap();
        assert_eq!(
            code(&asm, "start"),
            ["LDA c3", "STA x", "LDA c0", "SUB x", "OUT", "HLT"]
        );
    }

    #[test]
    fn blocks_end_in_a_transfer() {
        let source = "
            n : int = in
            flag := n > 3 or not n == 0
            while n > 0 {
                if flag and n <= 10 out n else out 0
                n = n - 1
            }
        ";
        let asm = lower_source(source).unwrap();
        for block in &asm.blocks {
            let last = block.instructions.last().map(|instr| instr.opcode);
            assert!(
                matches!(last, Some(op) if op.is_transfer() || op == Opcode::Dat),
                "block {} ends in {:?}",
                block.label,
                last
            );
        }
    }

    #[test]
    fn sibling_shadows_share_a_cell() {
        let asm = lower_source("x : int = 1 { x : int = 2 } { x : int = 3 }").unwrap();
        let cells = asm.blocks.iter().filter(|block| block.label == "x_").count();
        assert_eq!(cells, 1);
        assert_eq!(
            code(&asm, "start"),
            ["LDA c1", "STA x", "LDA c2", "STA x_", "LDA c3", "STA x_", "HLT"]
        );
    }

    #[test]
    fn errors_do_not_stop_lowering() {
        let errors = lower_source("x = 1\ny = 2\nout true").unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], CompileError::AssignToUndefined { ref name, .. } if name == "x"));
        assert!(matches!(errors[1], CompileError::AssignToUndefined { ref name, .. } if name == "y"));
        assert!(matches!(
            errors[2],
            CompileError::TypeMismatch {
                expected: crate::frontend::ast::Type::Int,
                found: crate::frontend::ast::Type::Bool,
                ..
            }
        ));
    }

    #[test]
    fn failed_declaration_binds_nothing() {
        let errors = lower_source("x : bool = 1\nout x").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], CompileError::DeclarationMismatch { .. }));
        assert!(matches!(errors[1], CompileError::UndefinedVariable { .. }));
    }

    #[test]
    fn else_branch_errors_are_kept() {
        let errors = lower_source("if true out 1 else y = 2").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], CompileError::AssignToUndefined { .. }));
    }

    #[test]
    fn then_branch_error_skips_else() {
        let errors = lower_source("if true x = 1 else y = 2").unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn condition_diagnostics() {
        let cases = [
            ("if 1 out 1", "int used as a condition at (1, 4)"),
            ("if in out 1", "cannot use input as condition at (1, 4)"),
            ("a : int = 1 if -a out 1", "cannot use '-' operator in condition at (1, 16)"),
            (
                "n : int = 1 if n out 1",
                "variable 'n' at (1, 16) has type int but is being used in condition so should be bool",
            ),
            ("if 1 + 1 out 1", "expected a bool instead got int at (1, 4)"),
            ("while q out 1", "undefined variable 'q' at (1, 7)"),
        ];
        for (source, message) in cases {
            let errors = lower_source(source).unwrap_err();
            assert_eq!(errors.len(), 1, "{source}");
            assert_eq!(errors[0].to_string(), message, "{source}");
        }
    }

    #[test]
    fn assignment_must_match_the_variable_type() {
        let errors = lower_source("x : int = 1  x = true").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "expected a int instead got bool at (1, 17)");

        let errors = lower_source("b : bool = true  b = 1").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "expected a bool instead got int at (1, 22)");
    }

    // Names are their own labels, so a variable called like a constant cell
    // defines that label a second time.
    #[test]
    fn variables_named_like_constants_collide() {
        let asm = lower_source("c1 : int = 2 out c1 + 1").unwrap();
        let cells: Vec<&str> = asm
            .blocks
            .iter()
            .filter(|block| block.label == "c1")
            .map(|block| block.instructions[0].operand.as_str())
            .collect();
        assert_eq!(cells, ["0", "1"]);
    }

    #[test]
    fn untyped_declaration_is_undefined() {
        let errors = lower_source("x :\n{ out x }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "expected a int instead got undefined at (2, 7)");
    }
}
