//! Field storage and static initialization order.
//!
//! Offsets are assigned once, before any code is emitted:
//!
//! - instance fields: 0-based index within their class
//! - static fields: 0-based slot in the single static segment, shared by
//!   every class (the built-in `System.out` takes slot 0)
//!
//! Static initializers run in demand order. The class owning `main` starts;
//! before a class's initializers run, every class its initializers reach
//! through a static member or `new` is initialized first, unless that class
//! is already in progress. A class caught in progress is observed with its
//! static fields still zero.

use minijava_parser::ast::{
    builtins, ClassDecl, DeclArena, DeclId, Expr, Reference,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::identification::is_main_method;

/// Sizes computed while assigning field offsets.
#[derive(Debug, Clone, Default)]
pub struct StorageLayout {
    instance_sizes: FxHashMap<DeclId, i32>,
    static_slots: i32,
}

impl StorageLayout {
    /// Assign every field its offset and record class sizes.
    pub fn assign(classes: &[ClassDecl], decls: &mut DeclArena) -> Self {
        let mut layout = StorageLayout::default();

        decls[builtins::SYSTEM_OUT].set_offset(layout.static_slots);
        layout.static_slots += 1;

        for class in classes {
            let mut instance = 0;
            for field in &class.fields {
                let decl = &mut decls[field.decl];
                if decl.is_static() {
                    decl.set_offset(layout.static_slots);
                    layout.static_slots += 1;
                } else {
                    decl.set_offset(instance);
                    instance += 1;
                }
            }
            layout.instance_sizes.insert(class.decl, instance);
        }
        layout
    }

    /// Number of instance fields of `class`.
    pub fn instance_size(&self, class: DeclId) -> i32 {
        self.instance_sizes.get(&class).copied().unwrap_or(0)
    }

    /// Total words in the static segment.
    pub fn static_slots(&self) -> i32 {
        self.static_slots
    }
}

// ============================================================================
// Static initialization order
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitState {
    Pending,
    InProgress,
    Done,
}

/// Indices into `classes` in the order their static initializers run.
pub fn static_init_order(classes: &[ClassDecl], decls: &DeclArena) -> Vec<usize> {
    let index_of: FxHashMap<DeclId, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, class)| (class.decl, i))
        .collect();

    let dependencies: Vec<Vec<usize>> = classes
        .iter()
        .map(|class| {
            let mut reached = FxHashSet::default();
            let mut deps = Vec::new();
            for init in class.fields.iter().filter_map(|f| f.initializer.as_ref()) {
                collect_classes(init, decls, &mut |class| {
                    if let Some(&i) = index_of.get(&class) {
                        if reached.insert(i) {
                            deps.push(i);
                        }
                    }
                });
            }
            deps
        })
        .collect();

    let main_class = classes.iter().position(|class| {
        class
            .methods
            .iter()
            .any(|method| is_main_method(decls, method.decl))
    });

    let mut state = vec![InitState::Pending; classes.len()];
    let mut order = Vec::with_capacity(classes.len());
    for start in main_class.into_iter().chain(0..classes.len()) {
        visit(start, &dependencies, &mut state, &mut order);
    }
    order
}

fn visit(class: usize, deps: &[Vec<usize>], state: &mut [InitState], order: &mut Vec<usize>) {
    if state[class] != InitState::Pending {
        return;
    }
    state[class] = InitState::InProgress;
    for &dep in &deps[class] {
        visit(dep, deps, state, order);
    }
    state[class] = InitState::Done;
    order.push(class);
}

/// Call `found` for every class whose initialization `expr` triggers.
fn collect_classes(expr: &Expr, decls: &DeclArena, found: &mut impl FnMut(DeclId)) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Ref(reference) => collect_reference(reference, decls, found),
        Expr::Index(index) => {
            collect_reference(&index.base, decls, found);
            collect_classes(&index.index, decls, found);
        }
        Expr::Call(call) => {
            collect_reference(&call.callee, decls, found);
            for arg in &call.args {
                collect_classes(arg, decls, found);
            }
        }
        Expr::Unary(unary) => collect_classes(&unary.operand, decls, found),
        Expr::Binary(binary) => {
            collect_classes(&binary.left, decls, found);
            collect_classes(&binary.right, decls, found);
        }
        Expr::NewObject(new) => {
            if let Some(class) = new.class.decl() {
                found(class);
            }
            for arg in &new.args {
                collect_classes(arg, decls, found);
            }
        }
        Expr::NewArray(new) => collect_classes(&new.size, decls, found),
    }
}

fn collect_reference(reference: &Reference, decls: &DeclArena, found: &mut impl FnMut(DeclId)) {
    if let Reference::Qualified(qual) = reference {
        collect_reference(&qual.base, decls, found);
    }
    if let Some(decl) = reference.decl() {
        let decl = &decls[decl];
        if decl.is_static() {
            if let Some(owner) = decl.owner() {
                found(owner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identification::Identification;
    use minijava_core::Diagnostics;
    use minijava_parser::ast::{Package, Parser};

    fn bound(source: &str) -> Package {
        let mut package =
            Parser::parse(source).unwrap_or_else(|errors| panic!("parse failed: {errors}"));
        let mut diagnostics = Diagnostics::new();
        Identification::run(&mut package, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{diagnostics}");
        package
    }

    fn names(package: &Package, order: &[usize]) -> Vec<String> {
        order
            .iter()
            .map(|&i| package.decls[package.classes[i].decl].name.clone())
            .collect()
    }

    #[test]
    fn field_offsets_per_kind() {
        let mut package = bound(
            "class Main { public static void main(String[] args) { } }
             class A { int x; static int s; boolean y; static int t; }
             class B { static boolean u; A a; }",
        );
        let Package { classes, decls, .. } = &mut package;
        let layout = StorageLayout::assign(classes, decls);

        let offset = |class: &str, field: &str| {
            let id = package.member(class, field).unwrap();
            package.decls[id].offset()
        };
        assert_eq!(offset("A", "x"), Some(0));
        assert_eq!(offset("A", "y"), Some(1));
        assert_eq!(offset("A", "s"), Some(1));
        assert_eq!(offset("A", "t"), Some(2));
        assert_eq!(offset("B", "u"), Some(3));
        assert_eq!(offset("B", "a"), Some(0));
        assert_eq!(layout.static_slots(), 4);

        let a = package.class("A").unwrap().decl;
        assert_eq!(layout.instance_size(a), 2);
    }

    #[test]
    fn main_class_initializes_first() {
        let package = bound(
            "class Other { static int i = 4 + Main.i; }
             class Main {
                public static void main(String[] args) { }
                static int i = 1 + Other.i;
             }",
        );
        let order = static_init_order(&package.classes, &package.decls);
        assert_eq!(names(&package, &order), ["Other", "Main"]);
    }

    #[test]
    fn dependencies_initialize_before_dependents() {
        let package = bound(
            "class Main { public static void main(String[] args) { } }
             class A { static int a = B.b + 1; }
             class B { static int b = C.get(); }
             class C { static int get() { return 3; } }",
        );
        let order = static_init_order(&package.classes, &package.decls);
        assert_eq!(names(&package, &order), ["Main", "C", "B", "A"]);
    }

    #[test]
    fn independent_classes_keep_source_order() {
        let package = bound(
            "class A { static int a = 1; }
             class B { static int b = 2; }
             class Main { public static void main(String[] args) { } }",
        );
        let order = static_init_order(&package.classes, &package.decls);
        assert_eq!(names(&package, &order), ["Main", "A", "B"]);
    }
}
