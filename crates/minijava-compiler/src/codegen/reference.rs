//! Reference evaluation.
//!
//! Evaluating a reference leaves the storage it denotes on the stack, in one
//! of the forms described by [`RefKind`]. Callers branch on the kind to pick
//! the matching load, store or dereference. Qualified chains thread the kind
//! from each segment to the next.

use minijava_parser::ast::{DeclId, DeclKind, Reference};

use super::CodeGenerator;
use crate::bytecode::{Primitive, Register};

/// What a reference left on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RefKind {
    /// The current object's address.
    This,
    /// Nothing: a class name that only qualifies a static member.
    Class,
    /// An object address and a field index, for `fieldref`/`fieldupd`.
    InstanceField,
    /// An address usable by `LOADI`/`STOREI` (local, parameter or static).
    Stack,
}

impl RefKind {
    /// Words this kind occupies on the stack.
    fn words(self) -> i32 {
        match self {
            RefKind::Class => 0,
            RefKind::This | RefKind::Stack => 1,
            RefKind::InstanceField => 2,
        }
    }
}

impl CodeGenerator<'_> {
    pub(super) fn emit_reference(&mut self, reference: &Reference) -> RefKind {
        match reference {
            Reference::This(_) => {
                self.emitter.emit_load_address(Register::Ob, 0);
                RefKind::This
            }
            Reference::Id(id) => match id.id.decl {
                Some(decl) => self.emit_member(decl, None),
                None => RefKind::Class,
            },
            Reference::Qualified(qual) => {
                let base = self.emit_reference(&qual.base);
                match qual.id.decl {
                    Some(decl) => self.emit_member(decl, Some(base)),
                    None => base,
                }
            }
        }
    }

    /// Push the storage of `decl`, reached through `base` when qualified.
    fn emit_member(&mut self, decl: DeclId, base: Option<RefKind>) -> RefKind {
        let target = &self.decls[decl];
        let offset = target.offset();
        debug_assert!(
            offset.is_some() || target.is_class(),
            "'{}' has no storage offset",
            target.name
        );
        let offset = offset.unwrap_or_default();

        // The register the storage is relative to.
        let base_register = match &target.kind {
            DeclKind::Class(_) => return RefKind::Class,
            DeclKind::Parameter | DeclKind::Local => Register::Lb,
            DeclKind::Field(_) if target.is_static() => Register::Sb,
            DeclKind::Field(_) => Register::Ob,
            DeclKind::Method(_) | DeclKind::Constructor(_) | DeclKind::ArrayLength => {
                return base.unwrap_or(RefKind::Class);
            }
        };

        match base_register {
            Register::Lb => {
                self.emitter.emit_load_address(Register::Lb, offset);
                RefKind::Stack
            }
            Register::Sb => {
                // The object on the left is not needed for a static field.
                if let Some(base) = base {
                    self.discard(base);
                }
                self.emitter.emit_load_address(Register::Sb, offset);
                RefKind::Stack
            }
            _ => {
                match base {
                    Some(base) => self.materialize(base),
                    None => self.emitter.emit_load_address(Register::Ob, 0),
                }
                self.emitter.emit_literal(offset);
                RefKind::InstanceField
            }
        }
    }

    /// Replace what `kind` left on the stack with the value it denotes.
    pub(super) fn materialize(&mut self, kind: RefKind) {
        match kind {
            RefKind::This | RefKind::Class => {}
            RefKind::InstanceField => self.emitter.emit_prim(Primitive::FieldRef),
            RefKind::Stack => self.emitter.emit_load_indirect(),
        }
    }

    /// Push the value of a reference read as an expression.
    pub(super) fn emit_load_reference(&mut self, reference: &Reference) {
        if let Reference::Qualified(qual) = reference {
            let is_length = qual
                .id
                .decl
                .is_some_and(|decl| matches!(self.decls[decl].kind, DeclKind::ArrayLength));
            if is_length {
                let base = self.emit_reference(&qual.base);
                self.materialize(base);
                self.emitter.emit_prim(Primitive::ArrayLen);
                return;
            }
        }
        let kind = self.emit_reference(reference);
        self.materialize(kind);
    }

    /// Drop what `kind` left on the stack.
    pub(super) fn discard(&mut self, kind: RefKind) {
        self.emitter.emit_pop(kind.words());
    }

    /// Store the value on top of the stack into storage left by `kind`.
    pub(super) fn store_into(&mut self, kind: RefKind) {
        match kind {
            RefKind::InstanceField => self.emitter.emit_prim(Primitive::FieldUpd),
            RefKind::Stack => self.emitter.emit_store_indirect(),
            RefKind::This | RefKind::Class => {}
        }
    }
}
