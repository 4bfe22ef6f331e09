#[cfg(test)]
mod parser_tests {
    use nox::ast::AstPrinter;
    use nox::error::NoxError;
    use nox::expr::Expr;
    use nox::parser::Parser;
    use nox::scanner::Scanner;
    use nox::stmt::Stmt;

    fn parse(source: &str) -> Vec<Stmt> {
        let scanner = Scanner::new(source.as_bytes().to_vec());
        let mut parser = Parser::new(scanner);
        parser.parse().expect("source should parse")
    }

    fn parse_err(source: &str) -> NoxError {
        let scanner = Scanner::new(source.as_bytes().to_vec());
        let mut parser = Parser::new(scanner);
        parser.parse().expect_err("source should not parse")
    }

    /// Print the expression of a single expression statement.
    fn expr_form(source: &str) -> String {
        match &parse(source)[0] {
            Stmt::Expression(expr) => AstPrinter::print(expr),
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_term_vs_factor() {
        assert_eq!(expr_form("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
    }

    #[test]
    fn test_precedence_power_in_factor() {
        // '**' shares the factor level and associates left.
        assert_eq!(expr_form("2 ** 10 * 3"), "(* (** 2.0 10.0) 3.0)");
        assert_eq!(expr_form("10 % 3 / 2"), "(/ (% 10.0 3.0) 2.0)");
    }

    #[test]
    fn test_comparison_and_logic() {
        assert_eq!(
            expr_form("a < 1 and b >= 2 or c"),
            "(or (and (< a 1.0) (>= b 2.0)) c)"
        );
    }

    #[test]
    fn test_unary_forms() {
        assert_eq!(expr_form("!-x"), "(! (- x))");
        assert_eq!(expr_form("not x"), "(not x)");
        assert_eq!(expr_form("?d[\"k\"]"), "(? ([] d k))");
    }

    #[test]
    fn test_assignment_chains() {
        assert_eq!(expr_form("a = b = 1"), "(= a (= b 1.0))");
        assert_eq!(expr_form("a.b = 1"), "(= (. a b) 1.0)");
        assert_eq!(expr_form("a[0] = 1"), "(= ([] a 0.0) 1.0)");
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_err("1 = 2");
        assert!(err.to_string().contains("Invalid assignment target."));
    }

    #[test]
    fn test_call_get_index_postfix() {
        assert_eq!(expr_form("a.b(1)[2]"), "([] (call (. a b) 1.0) 2.0)");
    }

    #[test]
    fn test_list_and_dict_literals() {
        assert_eq!(expr_form("[1, 2, 3]"), "(list 1.0 2.0 3.0)");
        assert_eq!(expr_form("[]"), "(list)");

        // A brace at statement position opens a block, so the dict literal
        // only appears in expression position.
        match &parse("let d = {\"a\": 1}")[0] {
            Stmt::Var {
                initializer: Some(dict),
                ..
            } => assert_eq!(AstPrinter::print(dict), "(dict (a 1.0))"),
            other => panic!("expected let with dict initializer, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_semicolons() {
        let stmts = parse("let x = 1\nprint x\nx = 2;");
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn test_for_in_forms() {
        match &parse("for v in xs { print v }")[0] {
            Stmt::ForIn {
                index_var,
                value_var,
                ..
            } => {
                assert!(index_var.is_none());
                assert_eq!(value_var.as_ref().unwrap().lexeme, "v");
            }
            other => panic!("expected for-in, got {:?}", other),
        }

        match &parse("for i, v in xs { }")[0] {
            Stmt::ForIn {
                index_var,
                value_var,
                ..
            } => {
                assert_eq!(index_var.as_ref().unwrap().lexeme, "i");
                assert_eq!(value_var.as_ref().unwrap().lexeme, "v");
            }
            other => panic!("expected for-in, got {:?}", other),
        }

        // Bare form: no variables, literal `true` iterable.
        match &parse("for { break }")[0] {
            Stmt::ForIn {
                index_var,
                value_var,
                iterable,
                ..
            } => {
                assert!(index_var.is_none());
                assert!(value_var.is_none());
                assert!(matches!(iterable, Expr::Literal(_)));
            }
            other => panic!("expected for-in, got {:?}", other),
        }
    }

    #[test]
    fn test_class_declaration() {
        match &parse("class B < A { init(x) { } greet() { } }")[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "B");
                assert!(superclass.is_some());
                assert_eq!(methods.len(), 2);
                assert_eq!(methods[0].name.lexeme, "init");
                assert_eq!(methods[0].params.len(), 1);
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_class_with_qualified_superclass() {
        match &parse("class B < shapes.Base { }")[0] {
            Stmt::Class { superclass, .. } => {
                assert!(matches!(superclass, Some(Expr::Get { .. })));
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_with_statement() {
        match &parse("with open(\"f\", \"r\") as f { f.read() }")[0] {
            Stmt::With { alias, .. } => assert_eq!(alias.lexeme, "f"),
            other => panic!("expected with, got {:?}", other),
        }
    }

    #[test]
    fn test_import_forms() {
        match &parse("import \"lib/util\" as util")[0] {
            Stmt::Import { path, alias } => {
                assert_eq!(path.lexeme, "\"lib/util\"");
                assert_eq!(alias.as_ref().unwrap().lexeme, "util");
            }
            other => panic!("expected import, got {:?}", other),
        }

        match &parse("import \"lib/util\"")[0] {
            Stmt::Import { alias, .. } => assert!(alias.is_none()),
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_export_wraps_declaration() {
        match &parse("export func f() { }")[0] {
            Stmt::Export(inner) => assert!(matches!(inner.as_ref(), Stmt::Function(_))),
            other => panic!("expected export, got {:?}", other),
        }

        let err = parse_err("export print 1");
        assert!(err
            .to_string()
            .contains("Expect 'func', 'class' or 'let' after 'export'."));
    }

    #[test]
    fn test_return_without_value_before_brace() {
        // `return }` carries no value; `return x` does.
        let stmts = parse("func f() { return }\nfunc g() { return 1 }");

        for (index, has_value) in [(0usize, false), (1usize, true)] {
            match &stmts[index] {
                Stmt::Function(decl) => match &decl.body[0] {
                    Stmt::Return { value, .. } => assert_eq!(value.is_some(), has_value),
                    other => panic!("expected return, got {:?}", other),
                },
                other => panic!("expected function, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_super_requires_method_name() {
        let err = parse_err("class B < A { m() { super } }");
        assert!(err.to_string().contains("Expect '.' after 'super'."));
    }

    #[test]
    fn test_print_with_multiple_expressions() {
        match &parse("print 1, 2, 3")[0] {
            Stmt::Print(expressions) => assert_eq!(expressions.len(), 3),
            other => panic!("expected print, got {:?}", other),
        }
    }

    #[test]
    fn test_reference_nodes_get_unique_ids() {
        let stmts = parse("a = a + b");

        let mut ids: Vec<usize> = Vec::new();
        if let Stmt::Expression(Expr::Assign { id, value, .. }) = &stmts[0] {
            ids.push(*id);
            if let Expr::Binary(left, _, right) = value.as_ref() {
                if let Expr::Variable { id, .. } = left.as_ref() {
                    ids.push(*id);
                }
                if let Expr::Variable { id, .. } = right.as_ref() {
                    ids.push(*id);
                }
            }
        }

        assert_eq!(ids.len(), 3);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3, "node ids must be unique");
    }
}
