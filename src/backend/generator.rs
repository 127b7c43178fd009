use crate::ir::cfg::Assembly;
use std::fmt::{self, Write};

/*
 * LMC listing, one block after another in creation order:
 *
 * label<TAB>OPC operand
 *      <TAB>OPC operand
 *
 * The label is written with no newline of its own, so it prefixes the
 * block's first instruction. Operand-less opcodes keep their trailing space.
 */
pub fn generate(asm: &Assembly) -> Result<String, fmt::Error> {
    let mut output = String::new();
    write_listing(&mut output, asm)?;
    Ok(output)
}

pub fn write_listing<W: Write>(output: &mut W, asm: &Assembly) -> fmt::Result {
    for block in &asm.blocks {
        write!(output, "{}", block.label)?;
        for instr in &block.instructions {
            writeln!(output, "\t{} {}", instr.opcode, instr.operand)?;
        }
    }
    Ok(())
}
