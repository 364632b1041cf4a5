//! Built-in declarations.
//!
//! Every package arena starts with these entries, at fixed ids, before any
//! user class:
//!
//! ```text
//! class String { }
//! class _PrintStream { public void println(int n) { } }
//! class System { public static _PrintStream out; }
//! ```

use minijava_core::Span;

use super::{
    ClassInfo, ConstructorInfo, DeclArena, DeclId, DeclKind, Declaration, MemberInfo, MethodInfo,
    Modifiers, TypeDenoter,
};

pub const STRING: DeclId = DeclId::from_raw(0);
pub const STRING_CTOR: DeclId = DeclId::from_raw(1);
pub const PRINT_STREAM: DeclId = DeclId::from_raw(2);
pub const PRINT_STREAM_CTOR: DeclId = DeclId::from_raw(3);
pub const PRINTLN: DeclId = DeclId::from_raw(4);
pub const PRINTLN_ARG: DeclId = DeclId::from_raw(5);
pub const SYSTEM: DeclId = DeclId::from_raw(6);
pub const SYSTEM_CTOR: DeclId = DeclId::from_raw(7);
pub const SYSTEM_OUT: DeclId = DeclId::from_raw(8);

/// Built-in classes in registration order.
pub const CLASSES: [DeclId; 3] = [STRING, PRINT_STREAM, SYSTEM];

/// Number of arena entries taken by the built-ins.
pub const COUNT: usize = 9;

impl DeclArena {
    /// An arena pre-seeded with the built-in declarations.
    pub fn with_builtins() -> Self {
        let mut arena = DeclArena::empty();

        let string = class(&mut arena, "String", STRING_CTOR, Vec::new(), Vec::new());
        constructor(&mut arena, "String", string);

        let print_stream = class(
            &mut arena,
            "_PrintStream",
            PRINT_STREAM_CTOR,
            Vec::new(),
            vec![PRINTLN],
        );
        constructor(&mut arena, "_PrintStream", print_stream);
        arena.alloc(Declaration::new(
            "println",
            TypeDenoter::Void,
            Span::BUILTIN,
            DeclKind::Method(MethodInfo {
                modifiers: Modifiers::empty(),
                class: print_stream,
                params: vec![PRINTLN_ARG],
            }),
        ));
        arena.alloc(Declaration::new(
            "n",
            TypeDenoter::Int,
            Span::BUILTIN,
            DeclKind::Parameter,
        ));

        let system = class(&mut arena, "System", SYSTEM_CTOR, vec![SYSTEM_OUT], Vec::new());
        constructor(&mut arena, "System", system);
        arena.alloc(Declaration::new(
            "out",
            TypeDenoter::class("_PrintStream", PRINT_STREAM),
            Span::BUILTIN,
            DeclKind::Field(MemberInfo {
                modifiers: Modifiers::STATIC,
                class: system,
            }),
        ));

        debug_assert_eq!(arena.len(), COUNT);
        arena
    }
}

/// Whether `id` refers to a built-in declaration.
pub fn is_builtin(id: DeclId) -> bool {
    id.index() < COUNT
}

fn class(
    arena: &mut DeclArena,
    name: &str,
    ctor: DeclId,
    fields: Vec<DeclId>,
    methods: Vec<DeclId>,
) -> DeclId {
    let id = DeclId::from_raw(arena.len() as u32);
    arena.alloc(Declaration::new(
        name,
        TypeDenoter::class(name, id),
        Span::BUILTIN,
        DeclKind::Class(ClassInfo {
            fields,
            methods,
            constructor: Some(ctor),
        }),
    ))
}

fn constructor(arena: &mut DeclArena, name: &str, class: DeclId) -> DeclId {
    arena.alloc(Declaration::new(
        name,
        TypeDenoter::class(name, class),
        Span::BUILTIN,
        DeclKind::Constructor(ConstructorInfo {
            class,
            params: Vec::new(),
            synthesized: true,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_sit_at_fixed_ids() {
        let arena = DeclArena::with_builtins();
        assert_eq!(arena.len(), COUNT);
        assert_eq!(arena[STRING].name, "String");
        assert_eq!(arena[PRINT_STREAM].name, "_PrintStream");
        assert_eq!(arena[PRINTLN].name, "println");
        assert_eq!(arena[SYSTEM].name, "System");
        assert_eq!(arena[SYSTEM_OUT].name, "out");
    }

    #[test]
    fn system_out_is_static_print_stream() {
        let arena = DeclArena::with_builtins();
        let out = &arena[SYSTEM_OUT];
        assert!(out.is_static());
        assert_eq!(out.owner(), Some(SYSTEM));
        assert_eq!(out.ty.class_decl(), Some(PRINT_STREAM));
    }

    #[test]
    fn println_takes_one_int() {
        let arena = DeclArena::with_builtins();
        let println = &arena[PRINTLN];
        assert!(println.ty.is_void());
        assert_eq!(println.params(), &[PRINTLN_ARG]);
        assert!(matches!(arena[PRINTLN_ARG].ty, TypeDenoter::Int));
    }
}
