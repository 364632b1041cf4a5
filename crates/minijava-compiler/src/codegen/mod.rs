//! Code generation.
//!
//! A third traversal that lowers the checked tree to machine instructions in
//! one pass. Field offsets are assigned up front (`storage.rs`); frame
//! offsets for parameters and locals are assigned as routines are emitted.
//! Calls to routines not emitted yet go through the emitter's patch list and
//! are resolved when the program is finished.
//!
//! ## Program layout
//!
//! ```text
//! 0      LOADL 0            one word per static field
//!        ...                static initializers, in demand order
//!        LOADL 0
//!        CALLPRIM newarr    empty argument array for main
//!        CALL  main
//!        HALT
//!        ...                methods and explicit constructors, in source order
//! ```
//!
//! ## Frame layout
//!
//! ```text
//! LB-2   second argument
//! LB-1   first argument
//! LB+0   saved OB
//! LB+1   dynamic link (caller LB)
//! LB+2   return address
//! LB+3   first local
//! ```

mod expr;
mod reference;
mod stmt;
pub mod storage;

use log::debug;
use minijava_core::{CompilationError, Diagnostics};
use minijava_parser::ast::{
    ClassDecl, DeclArena, DeclId, Package, ParameterDecl, Stmt,
};

use crate::bytecode::{FRAME_SIZE, Primitive, Program, Register};
use crate::emit::BytecodeEmitter;
use crate::identification::is_main_method;
use storage::{StorageLayout, static_init_order};

/// The code generation pass.
pub struct CodeGenerator<'a> {
    decls: &'a mut DeclArena,
    layout: StorageLayout,
    emitter: BytecodeEmitter,
    /// Frame offset the next local will take.
    next_local: i32,
    /// Argument words of the routine being emitted.
    arg_count: i32,
}

impl<'a> CodeGenerator<'a> {
    /// Generate the program for a bound and checked package.
    ///
    /// Returns `None` after reporting if a call target was never emitted.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(package: &mut Package, diagnostics: &mut Diagnostics) -> Option<Program> {
        let Package { classes, decls, .. } = package;
        let layout = StorageLayout::assign(classes, decls);

        let mut generator = CodeGenerator {
            decls,
            layout,
            emitter: BytecodeEmitter::new(),
            next_local: FRAME_SIZE,
            arg_count: 0,
        };

        generator.emit_prologue(classes, diagnostics);
        for class in classes.iter() {
            generator.emit_class(class);
        }

        let CodeGenerator { decls, emitter, .. } = generator;
        match emitter.finish() {
            Ok(program) => {
                debug!("codegen: {} instructions", program.len());
                Some(program)
            }
            Err(unresolved) => {
                for patch in unresolved {
                    diagnostics.report(CompilationError::UnresolvedPatch {
                        name: decls[patch.target].name.clone(),
                        address: patch.address,
                    });
                }
                None
            }
        }
    }

    /// Static segment, static initializers and the entry sequence.
    fn emit_prologue(&mut self, classes: &[ClassDecl], diagnostics: &mut Diagnostics) {
        self.emitter.set_line(0);
        for _ in 0..self.layout.static_slots() {
            self.emitter.emit_literal(0);
        }

        for index in static_init_order(classes, self.decls) {
            for field in &classes[index].fields {
                let Some(init) = &field.initializer else {
                    continue;
                };
                self.emitter.set_line(field.span.line);
                self.emit_expr(init);
                let slot = self.decls[field.decl].offset().unwrap_or_default();
                self.emitter.emit_store(Register::Sb, slot);
            }
        }

        let main = classes
            .iter()
            .flat_map(|class| &class.methods)
            .map(|method| method.decl)
            .find(|&method| is_main_method(self.decls, method));

        self.emitter.set_line(0);
        self.emitter.emit_literal(0);
        self.emitter.emit_prim(Primitive::NewArr);
        match main {
            Some(main) => self.emitter.emit_call(main),
            None => diagnostics.report(CompilationError::MissingMain),
        }
        self.emitter.emit_halt();
    }

    fn emit_class(&mut self, class: &ClassDecl) {
        debug!("codegen: class '{}'", self.decls[class.decl].name);
        for method in &class.methods {
            self.emit_routine(method.decl, &method.params, &method.body);
        }
        if let Some(ctor) = &class.constructor {
            self.emit_routine(ctor.decl, &ctor.params, &ctor.body);
        }
    }

    /// Emit one method or constructor body, ending in an implicit return.
    fn emit_routine(&mut self, decl: DeclId, params: &[ParameterDecl], body: &[Stmt]) {
        self.emitter.set_line(self.decls[decl].span.line);
        let entry = self.emitter.begin_routine(decl);
        self.decls[decl].set_offset(entry as i32);

        for (i, param) in params.iter().enumerate() {
            self.decls[param.decl].set_offset(-(i as i32 + 1));
        }
        self.next_local = FRAME_SIZE;
        self.arg_count = params.len() as i32;

        for stmt in body {
            self.emit_stmt(stmt);
        }
        self.emitter.emit_return(0, self.arg_count);
    }
}
