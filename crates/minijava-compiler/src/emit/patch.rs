//! Deferred call targets.
//!
//! A call to a routine whose address is not known yet is emitted with a
//! placeholder and recorded here. Once every routine has been emitted the
//! list is resolved against the recorded entry addresses.

use log::trace;
use minijava_parser::ast::DeclId;
use rustc_hash::FxHashMap;

use crate::bytecode::Instruction;

/// A call instruction waiting for its target's address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    /// Address of the call instruction.
    pub address: usize,
    /// The method or constructor being called.
    pub target: DeclId,
}

#[derive(Debug, Default)]
pub struct PatchList {
    patches: Vec<Patch>,
}

impl PatchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, address: usize, target: DeclId) {
        self.patches.push(Patch { address, target });
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Patch> {
        self.patches.iter()
    }

    /// Write every known entry address into its call instruction.
    ///
    /// Returns the patches whose target was never emitted.
    pub fn resolve(
        self,
        code: &mut [Instruction],
        entries: &FxHashMap<DeclId, usize>,
    ) -> Vec<Patch> {
        let mut unresolved = Vec::new();
        for patch in self.patches {
            match (entries.get(&patch.target), code.get_mut(patch.address)) {
                (Some(&entry), Some(instr)) => {
                    trace!(
                        "patch: {} at {} -> {}",
                        instr.op.name(),
                        patch.address,
                        entry
                    );
                    instr.d = entry as i32;
                }
                _ => unresolved.push(patch),
            }
        }
        unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{OpCode, PLACEHOLDER};

    #[test]
    fn resolves_known_targets() {
        let target = DeclId::from_raw(12);
        let mut code = vec![
            Instruction::with_d(OpCode::Call, PLACEHOLDER),
            Instruction::with_d(OpCode::Halt, 0),
        ];
        let mut patches = PatchList::new();
        patches.push(0, target);

        let mut entries = FxHashMap::default();
        entries.insert(target, 7);

        assert!(patches.resolve(&mut code, &entries).is_empty());
        assert_eq!(code[0].d, 7);
    }

    #[test]
    fn reports_missing_targets() {
        let mut code = vec![Instruction::with_d(OpCode::CallI, PLACEHOLDER)];
        let mut patches = PatchList::new();
        patches.push(0, DeclId::from_raw(3));
        assert_eq!(patches.len(), 1);

        let unresolved = patches.resolve(&mut code, &FxHashMap::default());
        assert_eq!(
            unresolved,
            vec![Patch {
                address: 0,
                target: DeclId::from_raw(3)
            }]
        );
        assert_eq!(code[0].d, PLACEHOLDER);
    }
}
