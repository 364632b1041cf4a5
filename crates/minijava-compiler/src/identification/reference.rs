//! Reference chain resolution.
//!
//! A chain such as `a.b.c` is resolved left to right. The head is looked up
//! in the local scopes; every later segment is looked up in the class the
//! segment before it produced, recorded in [`ChainState`].
//!
//! Head lookup order: variable, then field of the current class, then (only
//! when the head qualifies something) class name.

use minijava_core::{CompilationError, Span};
use minijava_parser::ast::{
    DeclId, DeclKind, Declaration, Identifier, QualRef, Reference, ThisRef, TypeDenoter,
};

use super::{ChainState, Identification, RefUse};

impl Identification<'_> {
    /// Bind `reference` for the given use and return the declaration the
    /// final segment resolved to.
    pub(super) fn resolve(&mut self, reference: &mut Reference, usage: RefUse) -> Option<DeclId> {
        match reference {
            Reference::This(this) => self.resolve_this(this, usage),
            Reference::Id(id) => self.resolve_head(&mut id.id, usage),
            Reference::Qualified(qual) => self.resolve_qualified(qual, usage),
        }
    }

    fn resolve_this(&mut self, this: &mut ThisRef, usage: RefUse) -> Option<DeclId> {
        let class = self.ctx.class?;
        this.decl = Some(class);

        if self.ctx.is_static() {
            self.report(CompilationError::ThisInStaticContext { span: this.span });
        }
        match usage {
            RefUse::Assign => self.report(CompilationError::IllegalThis {
                usage: "assigned to",
                span: this.span,
            }),
            RefUse::Call => self.report(CompilationError::IllegalThis {
                usage: "called",
                span: this.span,
            }),
            RefUse::Index | RefUse::IndexAssign => self.report(CompilationError::NotAnArray {
                name: "this".to_string(),
                span: this.span,
            }),
            RefUse::Value | RefUse::Qualifier => {}
        }

        self.ctx.chain = ChainState {
            external: Some(class),
            instance_ensured: true,
            last_was_array: false,
            poisoned: false,
        };
        Some(class)
    }

    fn resolve_head(&mut self, id: &mut Identifier, usage: RefUse) -> Option<DeclId> {
        self.ctx.chain = ChainState::default();

        if usage != RefUse::Call && self.ctx.declaring.as_deref() == Some(id.name.as_str()) {
            self.report(CompilationError::SelfReference {
                name: id.name.clone(),
                span: id.span,
            });
        }

        if usage == RefUse::Call {
            return self.resolve_local_call(id);
        }

        let decl = if let Some(var) = self.table.lookup_variable(&id.name) {
            var
        } else if let Some(field) = self.table.lookup_field(&id.name) {
            if self.ctx.is_static() && !self.decls[field].is_static() {
                self.report(CompilationError::InstanceInStaticContext {
                    what: "field",
                    name: id.name.clone(),
                    span: id.span,
                });
            }
            field
        } else if let Some(class) = self
            .table
            .lookup_class(&id.name)
            .filter(|_| usage == RefUse::Qualifier)
        {
            id.bind(class);
            self.ctx.chain.external = Some(class);
            return Some(class);
        } else {
            self.report(CompilationError::UndefinedName {
                name: id.name.clone(),
                span: id.span,
            });
            return None;
        };

        id.bind(decl);
        self.enter_value(decl, &id.name, id.span, usage);
        Some(decl)
    }

    /// An unqualified call: a method of the current class.
    fn resolve_local_call(&mut self, id: &mut Identifier) -> Option<DeclId> {
        let Some(method) = self.table.lookup_method(&id.name) else {
            let class = self.current_class_name();
            self.report(CompilationError::UndefinedMethod {
                name: id.name.clone(),
                class,
                span: id.span,
            });
            return None;
        };

        if self.ctx.is_static() && !self.decls[method].is_static() {
            self.report(CompilationError::InstanceInStaticContext {
                what: "method",
                name: id.name.clone(),
                span: id.span,
            });
        }
        id.bind(method);
        Some(method)
    }

    fn resolve_qualified(&mut self, qual: &mut QualRef, usage: RefUse) -> Option<DeclId> {
        let base = self.resolve(&mut qual.base, RefUse::Qualifier);
        let chain = std::mem::take(&mut self.ctx.chain);
        base?;

        let name = qual.id.name.clone();
        let span = qual.id.span;

        if chain.last_was_array {
            return self.resolve_array_length(&mut qual.id, usage);
        }

        let Some(class) = chain.external else {
            if !chain.poisoned {
                self.report(CompilationError::NotAnObject { name, span });
            }
            return None;
        };
        let class_name = self.decls[class].name.clone();

        let member = if usage == RefUse::Call {
            self.find_member(class, &name, true)
        } else {
            self.find_member(class, &name, false)
        };
        let Some(member) = member else {
            let error = if usage == RefUse::Call {
                CompilationError::UndefinedMethod {
                    name,
                    class: class_name,
                    span,
                }
            } else {
                CompilationError::UndefinedField {
                    name,
                    class: class_name,
                    span,
                }
            };
            self.report(error);
            return None;
        };

        let decl = &self.decls[member];
        let (is_private, is_static, owner) = (decl.is_private(), decl.is_static(), decl.owner());
        if is_private && owner != self.ctx.class {
            self.report(CompilationError::PrivateAccess {
                name: name.clone(),
                class: class_name.clone(),
                span,
            });
        }
        if !is_static && !chain.instance_ensured {
            self.report(CompilationError::InstanceThroughClass {
                what: if usage == RefUse::Call { "method" } else { "field" },
                name: name.clone(),
                class: class_name,
                span,
            });
        }

        qual.id.bind(member);
        if usage != RefUse::Call {
            self.enter_value(member, &name, span, usage);
        }
        Some(member)
    }

    /// `.length` after an array-typed segment. Each occurrence gets its own
    /// synthesized declaration.
    fn resolve_array_length(&mut self, id: &mut Identifier, usage: RefUse) -> Option<DeclId> {
        if id.name != "length" {
            self.report(CompilationError::NotAnObject {
                name: id.name.clone(),
                span: id.span,
            });
            return None;
        }

        match usage {
            RefUse::Assign | RefUse::IndexAssign => {
                self.report(CompilationError::ArrayLengthMisuse {
                    usage: "assigned to",
                    span: id.span,
                })
            }
            RefUse::Call => self.report(CompilationError::ArrayLengthMisuse {
                usage: "called",
                span: id.span,
            }),
            RefUse::Index => self.report(CompilationError::NotAnArray {
                name: id.name.clone(),
                span: id.span,
            }),
            RefUse::Value | RefUse::Qualifier => {}
        }

        let length = self.decls.alloc(Declaration::new(
            "length",
            TypeDenoter::Int,
            id.span,
            DeclKind::ArrayLength,
        ));
        id.bind(length);
        self.ctx.chain = ChainState {
            external: None,
            instance_ensured: true,
            last_was_array: false,
            poisoned: false,
        };
        Some(length)
    }

    /// Record what a value-producing segment hands to the next one, and
    /// check indexed uses.
    fn enter_value(&mut self, decl: DeclId, name: &str, span: Span, usage: RefUse) {
        let ty = &self.decls[decl].ty;
        let is_array = ty.is_array();
        // An undefined class was reported where the type was written.
        let poisoned =
            ty.is_error() || matches!(ty, TypeDenoter::Class(class) if class.decl().is_none());
        let indexable = is_array || poisoned;

        self.ctx.chain = ChainState {
            external: ty.class_decl(),
            instance_ensured: true,
            last_was_array: is_array,
            poisoned,
        };

        if matches!(usage, RefUse::Index | RefUse::IndexAssign) && !indexable {
            self.report(CompilationError::NotAnArray {
                name: name.to_string(),
                span,
            });
        }
    }

    fn find_member(&self, class: DeclId, name: &str, method: bool) -> Option<DeclId> {
        let info = self.decls[class].class_info()?;
        let members = if method { &info.methods } else { &info.fields };
        members
            .iter()
            .copied()
            .find(|&member| self.decls[member].name == name)
    }

    fn current_class_name(&self) -> String {
        self.ctx
            .class
            .map(|class| self.decls[class].name.clone())
            .unwrap_or_default()
    }
}
