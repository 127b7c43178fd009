use crate::ir::{Instruction, Opcode};
use std::collections::HashSet;

pub type BlockId = usize;

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(id: BlockId, label: String) -> Self {
        Self {
            id,
            label,
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, instr: Instruction) {
        self.instructions.push(instr);
    }

    #[cfg(test)]
    pub(crate) fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|instr| instr.opcode.is_transfer())
    }
}

/*
 * Blocks in emission order plus the data pools.
 *
 * Blocks are never reordered: every branch names its target by label and
 * nothing relies on fall-through, so the serialised order is creation order.
 * Data cells (variables, constants, spill temps) are blocks too, holding a
 * single DAT.
 */
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub blocks: Vec<BasicBlock>,
    constants: HashSet<i64>,
    variables: HashSet<String>,
    max_temp: usize,
    current_temp: usize,
    next_unique: usize,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caller guarantees `label` is unique.
    pub fn new_block(&mut self, label: impl Into<String>) -> BlockId {
        let id = self.blocks.len();
        self.blocks.push(BasicBlock::new(id, label.into()));
        id
    }

    /// A block labelled `b<k>`, `k` counting up from zero.
    pub fn new_unique_block(&mut self) -> BlockId {
        let label = format!("b{}", self.next_unique);
        self.next_unique += 1;
        self.new_block(label)
    }

    pub fn create_variable(&mut self, label: impl Into<String>, value: i64) -> BlockId {
        let id = self.new_block(label);
        self.emit(id, Opcode::Dat, value.to_string());
        id
    }

    /*
     * Zero-initialised cell for a user variable.
     * Sibling scopes may hand out the same shadow label (`x_` twice); they
     * share one cell so the listing never defines a label twice.
     */
    pub fn declare_variable(&mut self, label: &str) {
        if self.variables.insert(label.to_string()) {
            self.create_variable(label, 0);
        }
    }

    /// Label of the `DAT value` cell, interned on first use.
    pub fn get_constant(&mut self, value: i64) -> String {
        let label = format!("c{}", value);
        if self.constants.insert(value) {
            self.create_variable(label.clone(), value);
        }
        label
    }

    pub fn push_temp(&mut self) -> String {
        let label = format!("temp{}", self.current_temp);
        if self.current_temp == self.max_temp {
            self.max_temp += 1;
            self.create_variable(label.clone(), 0);
        }
        self.current_temp += 1;
        label
    }

    pub fn pop_temp(&mut self) {
        debug_assert!(self.current_temp > 0, "pop_temp without matching push_temp");
        self.current_temp = self.current_temp.saturating_sub(1);
    }

    pub fn current_temp(&self) -> usize {
        self.current_temp
    }

    #[cfg(test)]
    pub(crate) fn max_temp(&self) -> usize {
        self.max_temp
    }

    pub fn emit(&mut self, block: BlockId, opcode: Opcode, operand: impl Into<String>) {
        self.blocks[block].push(Instruction::new(opcode, operand));
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id]
    }

    pub fn label(&self, id: BlockId) -> &str {
        &self.blocks[id].label
    }

    #[cfg(test)]
    pub(crate) fn find(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|block| block.label == label)
    }
}
