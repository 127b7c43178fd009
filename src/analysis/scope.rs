use crate::frontend::ast::Type;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Variable {
    name: String,
    label: String,
    ty: Type,
    // Binding of the same name this one hides, if any
    shadowed: Option<usize>,
    depth: usize,
}

/// Lexical symbol table mapping source names to memory labels.
///
/// `variables` doubles as the declaration chain: live bindings are stored in
/// declaration order, so unwinding a scope pops from the back.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: HashMap<String, usize>,
    variables: Vec<Variable>,
    depth: usize,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /*
     * Bind `name` at the current depth and return its label.
     * A fresh name is its own label; redeclaring a live name appends '_'
     * to the hidden binding's label (x, x_, x__, ...).
     */
    pub fn declare(&mut self, name: &str, ty: Type) -> String {
        let shadowed = self.bindings.get(name).copied();
        let label = match shadowed {
            Some(prev) => format!("{}_", self.variables[prev].label),
            None => name.to_string(),
        };

        let index = self.variables.len();
        self.variables.push(Variable {
            name: name.to_string(),
            label: label.clone(),
            ty,
            shadowed,
            depth: self.depth,
        });
        self.bindings.insert(name.to_string(), index);

        label
    }

    /// Label and type of the innermost live binding of `name`.
    pub fn get(&self, name: &str) -> Option<(String, Type)> {
        self.bindings.get(name).map(|&index| {
            let var = &self.variables[index];
            (var.label.clone(), var.ty)
        })
    }

    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.depth > 0, "pop_scope without matching push_scope");
        self.depth = self.depth.saturating_sub(1);

        while self.variables.last().is_some_and(|var| var.depth > self.depth) {
            let Some(var) = self.variables.pop() else {
                break;
            };
            match var.shadowed {
                Some(prev) => {
                    self.bindings.insert(var.name, prev);
                }
                None => {
                    self.bindings.remove(&var.name);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}
