//! Declaration parsing: classes, members, parameters and types.

use minijava_core::{ParseError, ParseErrorKind};

use super::parser::Parser;
use super::{
    ClassDecl, ClassInfo, ClassType, ConstructorDecl, ConstructorInfo, DeclId, DeclKind,
    Declaration, FieldDecl, MemberInfo, MethodDecl, MethodInfo, Modifiers, Package,
    ParameterDecl, Stmt, TypeDenoter,
};
use crate::lexer::TokenKind;

type Result<T> = std::result::Result<T, ParseError>;

impl<'src> Parser<'src> {
    /// Parse `ClassDecl* EOF`.
    pub fn parse_package(&mut self) -> Package {
        let start = self.peek().span;
        let mut classes = Vec::new();

        while !self.is_eof() {
            match self.parse_class() {
                Ok(class) => classes.push(class),
                Err(err) => {
                    self.error(err);
                    self.advance();
                    self.synchronize_class();
                }
            }
        }

        Package {
            classes,
            decls: std::mem::take(&mut self.decls),
            span: self.span_from(start),
        }
    }

    /// Parse `'class' id '{' Member* '}'`.
    fn parse_class(&mut self) -> Result<ClassDecl> {
        let start = self.expect(TokenKind::Class)?.span;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LeftBrace)?;

        let id = DeclId::from_raw(self.decls.len() as u32);
        self.decls.alloc(Declaration::new(
            name.name.clone(),
            TypeDenoter::class(name.name.clone(), id),
            name.span,
            DeclKind::Class(ClassInfo::default()),
        ));

        let mut class = ClassDecl {
            decl: id,
            fields: Vec::new(),
            methods: Vec::new(),
            constructor: None,
            span: start,
        };

        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            if let Err(err) = self.parse_member(&mut class, &name.name) {
                self.error(err);
                self.synchronize_member();
            }
        }
        self.expect(TokenKind::RightBrace)?;
        class.span = self.span_from(start);

        let ctor = match &class.constructor {
            Some(ctor) => ctor.decl,
            None => self.decls.alloc(Declaration::new(
                name.name.clone(),
                TypeDenoter::class(name.name.clone(), id),
                name.span,
                DeclKind::Constructor(ConstructorInfo {
                    class: id,
                    params: Vec::new(),
                    synthesized: true,
                }),
            )),
        };

        if let Some(info) = self.decls.class_info_mut(id) {
            info.fields = class.fields.iter().map(|f| f.decl).collect();
            info.methods = class.methods.iter().map(|m| m.decl).collect();
            info.constructor = Some(ctor);
        }

        Ok(class)
    }

    /// Parse one field, method or constructor into `class`.
    fn parse_member(&mut self, class: &mut ClassDecl, class_name: &str) -> Result<()> {
        let start = self.peek().span;
        let mut modifiers = Modifiers::empty();

        if self.eat(TokenKind::Private).is_some() {
            modifiers |= Modifiers::PRIVATE;
        } else {
            self.eat(TokenKind::Public);
        }
        if let Some(token) = self.eat(TokenKind::Static) {
            if self.check(TokenKind::Identifier)
                && self.peek().lexeme == class_name
                && self.peek_nth(1).kind == TokenKind::LeftParen
            {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidModifier,
                    token.span,
                    "a constructor cannot be static",
                ));
            }
            modifiers |= Modifiers::STATIC;
        }

        // Constructor: the class name directly followed by '('.
        if self.check(TokenKind::Identifier)
            && self.peek().lexeme == class_name
            && self.peek_nth(1).kind == TokenKind::LeftParen
        {
            let name = self.expect_identifier()?;
            if class.constructor.is_some() {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidDeclaration,
                    name.span,
                    format!("class '{class_name}' already has a constructor"),
                ));
            }
            let ctor_id = self.decls.alloc(Declaration::new(
                name.name.clone(),
                TypeDenoter::class(name.name.clone(), class.decl),
                name.span,
                DeclKind::Constructor(ConstructorInfo {
                    class: class.decl,
                    params: Vec::new(),
                    synthesized: false,
                }),
            ));
            let params = self.parse_parameters()?;
            let body = self.parse_body()?;
            if let DeclKind::Constructor(info) = &mut self.decls[ctor_id].kind {
                info.params = params.iter().map(|p| p.decl).collect();
            }
            class.constructor = Some(ConstructorDecl {
                decl: ctor_id,
                params,
                body,
                span: self.span_from(start),
            });
            return Ok(());
        }

        let ty = if self.eat(TokenKind::Void).is_some() {
            TypeDenoter::Void
        } else {
            self.parse_type()?
        };
        let name = self.expect_identifier()?;

        if self.check(TokenKind::LeftParen) {
            let method_id = self.decls.alloc(Declaration::new(
                name.name.clone(),
                ty,
                name.span,
                DeclKind::Method(MethodInfo {
                    modifiers,
                    class: class.decl,
                    params: Vec::new(),
                }),
            ));
            let params = self.parse_parameters()?;
            let body = self.parse_body()?;
            if let DeclKind::Method(info) = &mut self.decls[method_id].kind {
                info.params = params.iter().map(|p| p.decl).collect();
            }
            class.methods.push(MethodDecl {
                decl: method_id,
                params,
                body,
                span: self.span_from(start),
            });
            return Ok(());
        }

        if ty.is_void() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidDeclaration,
                name.span,
                format!("field '{}' cannot have type void", name.name),
            ));
        }

        let initializer = if self.eat(TokenKind::Equal).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;

        let field_id = self.decls.alloc(Declaration::new(
            name.name,
            ty,
            name.span,
            DeclKind::Field(MemberInfo {
                modifiers,
                class: class.decl,
            }),
        ));
        class.fields.push(FieldDecl {
            decl: field_id,
            initializer,
            span: self.span_from(start),
        });
        Ok(())
    }

    /// Parse `'(' (Type id (',' Type id)*)? ')'`.
    fn parse_parameters(&mut self) -> Result<Vec<ParameterDecl>> {
        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                let start = self.peek().span;
                let ty = self.parse_type()?;
                let name = self.expect_identifier()?;
                let decl = self.decls.alloc(Declaration::new(
                    name.name,
                    ty,
                    name.span,
                    DeclKind::Parameter,
                ));
                params.push(ParameterDecl {
                    decl,
                    span: self.span_from(start),
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect(TokenKind::RightParen)?;
        Ok(params)
    }

    /// Parse a method or constructor body `'{' Stmt* '}'`.
    fn parse_body(&mut self) -> Result<Vec<Stmt>> {
        self.expect(TokenKind::LeftBrace)?;
        let stmts = self.parse_statements();
        self.expect(TokenKind::RightBrace)?;
        Ok(stmts)
    }

    /// Parse `'int' | 'boolean' | id | ('int' | id) '[' ']'`.
    pub(super) fn parse_type(&mut self) -> Result<TypeDenoter> {
        let token = *self.peek();
        let base = match token.kind {
            TokenKind::Int => {
                self.advance();
                TypeDenoter::Int
            }
            TokenKind::Boolean => {
                self.advance();
                return Ok(TypeDenoter::Boolean);
            }
            TokenKind::Identifier => {
                let name = self.expect_identifier()?;
                TypeDenoter::Class(ClassType::new(name))
            }
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedType,
                    token.span,
                    format!("expected type, found {}", token.kind),
                ));
            }
        };

        if self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket
        {
            self.advance();
            self.advance();
            return Ok(TypeDenoter::array(base));
        }
        Ok(base)
    }

    /// Whether the upcoming tokens start a local variable declaration.
    pub(super) fn at_var_decl(&self) -> bool {
        match self.peek().kind {
            TokenKind::Int | TokenKind::Boolean => true,
            TokenKind::Identifier => {
                let next = self.peek_nth(1).kind;
                next == TokenKind::Identifier
                    || (next == TokenKind::LeftBracket
                        && self.peek_nth(2).kind == TokenKind::RightBracket)
            }
            _ => false,
        }
    }

    /// Allocate the declaration for a local variable.
    pub(super) fn declare_local(&mut self, name: super::Identifier, ty: TypeDenoter) -> DeclId {
        self.decls
            .alloc(Declaration::new(name.name, ty, name.span, DeclKind::Local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builtins;

    fn parse(source: &str) -> Package {
        Parser::parse(source).unwrap_or_else(|errors| panic!("parse failed: {errors}"))
    }

    #[test]
    fn class_with_members() {
        let package = parse(
            "class A {
                private static int count;
                public boolean flag;
                int[] items;
                static B other = null;
                public int get(int i, A a) { return i; }
                void reset() { }
            }",
        );
        assert_eq!(package.classes.len(), 1);
        let class = &package.classes[0];
        assert_eq!(class.fields.len(), 4);
        assert_eq!(class.methods.len(), 2);

        let count = &package.decls[class.fields[0].decl];
        assert!(count.is_static() && count.is_private());
        assert!(package.decls[class.fields[2].decl].ty.is_array());
        assert!(class.fields[3].initializer.is_some());

        let get = &package.decls[class.methods[0].decl];
        assert_eq!(get.params().len(), 2);
        assert!(matches!(get.ty, TypeDenoter::Int));
    }

    #[test]
    fn class_info_lists_members_and_constructor() {
        let package = parse("class A { int x; void f() { } }");
        let class = &package.classes[0];
        let info = package.decls[class.decl].class_info().unwrap();
        assert_eq!(info.fields, vec![class.fields[0].decl]);
        assert_eq!(info.methods, vec![class.methods[0].decl]);

        let ctor = info.constructor.unwrap();
        assert!(package.decls[ctor].is_synthesized_constructor());
    }

    #[test]
    fn explicit_constructor() {
        let package = parse("class Point { int x; Point(int x0) { x = x0; } }");
        let class = &package.classes[0];
        let ctor = class.constructor.as_ref().unwrap();
        assert_eq!(ctor.params.len(), 1);
        let info = package.decls[class.decl].class_info().unwrap();
        assert_eq!(info.constructor, Some(ctor.decl));
        assert!(!package.decls[ctor.decl].is_synthesized_constructor());
    }

    #[test]
    fn second_constructor_is_error() {
        let errors = Parser::parse("class P { P() { } P(int a) { } }").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].kind, ParseErrorKind::InvalidDeclaration);
    }

    #[test]
    fn static_constructor_is_error() {
        let errors = Parser::parse("class P { static P() { } }").unwrap_err();
        assert_eq!(errors.errors()[0].kind, ParseErrorKind::InvalidModifier);
    }

    #[test]
    fn void_field_is_error() {
        assert!(Parser::parse("class P { void x; }").is_err());
    }

    #[test]
    fn user_decls_follow_builtins() {
        let package = parse("class A { }");
        assert_eq!(package.classes[0].decl.index(), builtins::COUNT);
    }

    #[test]
    fn recovers_after_bad_member() {
        let (package, errors) = Parser::parse_lenient(
            "class A { int = 3; int ok; }
             class B { }",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(package.classes.len(), 2);
        assert_eq!(package.classes[0].fields.len(), 1);
    }
}
