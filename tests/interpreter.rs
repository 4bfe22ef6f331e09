#[cfg(test)]
mod interpreter_tests {
    use nox::error::NoxError;
    use nox::nox::Nox;

    /// Run one source unit with print output captured.
    fn run_capture(source: &str) -> (String, Result<(), NoxError>) {
        let mut runtime = Nox::new();
        let buffer = runtime.interpreter_mut().capture_output();
        let result = runtime.run(source);
        let output = buffer.borrow().clone();
        (output, result)
    }

    fn assert_output(source: &str, expected_lines: &[&str]) {
        let (output, result) = run_capture(source);

        if let Err(err) = result {
            panic!("script failed: {}\noutput so far: {}", err, output);
        }

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, expected_lines, "for source:\n{}", source);
    }

    fn runtime_err(source: &str) -> NoxError {
        let (_, result) = run_capture(source);
        let err = result.expect_err("script should fail");

        assert!(
            matches!(err, NoxError::Runtime { .. }),
            "expected runtime error, got {:?}",
            err
        );

        err
    }

    // ── language basics ──────────────────────────────────────────────────

    #[test]
    fn test_arithmetic_and_print() {
        assert_output("print 1 + 2 * 3\nprint 10 % 3, 2 ** 10", &["7", "1 1024"]);
    }

    #[test]
    fn test_closures_capture_by_reference() {
        assert_output(
            "func make() { let i = 0; func inc() { i = i + 1; return i } return inc }\n\
             let c = make(); print c(); print c(); print c()",
            &["1", "2", "3"],
        );
    }

    #[test]
    fn test_inheritance_with_super() {
        assert_output(
            "class A { greet() { return \"A\" } }\n\
             class B < A { greet() { return super.greet() + \"B\" } }\n\
             print B().greet()",
            &["AB"],
        );
    }

    #[test]
    fn test_initializer_returns_self() {
        assert_output(
            "class P { init(x) { self.x = x; return } }\nprint P(7).x",
            &["7"],
        );
    }

    #[test]
    fn test_for_in_with_index_and_break() {
        assert_output(
            "for i, v in [\"a\", \"b\", \"c\"] { if i == 1 { break } print i, v }",
            &["0 a"],
        );
    }

    #[test]
    fn test_safe_expression_swallows_runtime_error() {
        assert_output(
            "let d = {\"k\": 1}\nprint ?d[\"missing\"], d[\"k\"]",
            &["nil 1"],
        );
    }

    // ── operators ────────────────────────────────────────────────────────

    #[test]
    fn test_string_concatenation_stringifies() {
        assert_output(
            "print \"a\" + 1\nprint 1 + \"a\"\nprint \"v=\" + nil\nprint \"ok \" + true",
            &["a1", "1a", "v=nil", "ok true"],
        );
    }

    #[test]
    fn test_plus_type_error() {
        let err = runtime_err("print 1 + nil");
        assert!(err.to_string().contains("Operands must be"));
    }

    #[test]
    fn test_modulo_truncates_to_integers() {
        assert_output("print -7 % 3\nprint 7 % 3", &["-1", "1"]);
    }

    #[test]
    fn test_arithmetic_edge_errors_via_safe() {
        assert_output(
            "print ?(1 / 0)\nprint ?(5 % 0)\nprint ?(0 ** 0)\nprint ?(2 ** -1)",
            &["nil", "nil", "nil", "nil"],
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_output(
            "print nil or \"fallback\"\nprint 1 and 2\nprint false and 2\nprint 0 or 2",
            &["fallback", "2", "false", "0"],
        );
    }

    #[test]
    fn test_truthiness_only_nil_and_false_are_falsey() {
        assert_output(
            "if 0 { print \"zero\" }\nif \"\" { print \"empty\" }\nif [] { print \"list\" }\nif nil { print \"nil\" } else { print \"no\" }",
            &["zero", "empty", "list", "no"],
        );
    }

    #[test]
    fn test_deep_equality() {
        assert_output(
            "print [1, [2]] == [1, [2]]\nprint {\"a\": 1} == {\"a\": 1}\nprint [1] == [2]\nprint \"a\" == \"a\", 1 == 2",
            &["true", "true", "false", "true false"],
        );
    }

    #[test]
    fn test_unary_operators() {
        assert_output(
            "print -3\nprint !true, !nil, not 0",
            &["-3", "false true false"],
        );
    }

    #[test]
    fn test_comparison_requires_numbers() {
        let err = runtime_err("print \"a\" < \"b\"");
        assert!(err.to_string().contains("must be a number"));
    }

    // ── variables and scope ──────────────────────────────────────────────

    #[test]
    fn test_undefined_variable() {
        let err = runtime_err("print missing");
        assert!(err.to_string().contains("Undefined variable 'missing'."));
    }

    #[test]
    fn test_global_redefinition_is_runtime_error() {
        let err = runtime_err("let x = 1\nlet x = 2");
        assert!(err.to_string().contains("already defined"));
    }

    #[test]
    fn test_block_shadowing() {
        assert_output(
            "let x = \"outer\"\n{ let x = \"inner\" print x }\nprint x",
            &["inner", "outer"],
        );
    }

    #[test]
    fn test_assignment_walks_to_enclosing_scope() {
        assert_output("let x = 1\n{ x = 2 }\nprint x", &["2"]);
    }

    // ── control flow ─────────────────────────────────────────────────────

    #[test]
    fn test_while_loop() {
        assert_output(
            "let i = 0\nwhile i < 3 { i = i + 1 print i }",
            &["1", "2", "3"],
        );
    }

    #[test]
    fn test_while_continue_and_break() {
        assert_output(
            "let i = 0\nwhile true { i = i + 1 if i == 2 { continue } if i > 3 { break } print i }",
            &["1", "3"],
        );
    }

    #[test]
    fn test_infinite_for_with_break() {
        assert_output(
            "let n = 0\nfor { n = n + 1 if n == 3 { break } }\nprint n",
            &["3"],
        );
    }

    #[test]
    fn test_break_escapes_only_nearest_loop() {
        assert_output(
            "for i, a in [0, 1] { for b in [\"x\", \"y\"] { break } print i }",
            &["0", "1"],
        );
    }

    #[test]
    fn test_for_over_string() {
        assert_output("for i, ch in \"ab\" { print i, ch }", &["0 a", "1 b"]);
    }

    #[test]
    fn test_for_over_dict_unordered() {
        let (output, result) = run_capture(
            "let d = {\"a\": 1, \"b\": 2}\nlet total = 0\nfor k, v in d { total = total + v }\nprint total",
        );
        result.expect("script should run");
        assert_eq!(output.trim(), "3");
    }

    #[test]
    fn test_for_over_false_runs_zero_times() {
        assert_output("for v in false { print v }\nprint \"done\"", &["done"]);
    }

    #[test]
    fn test_non_iterable_errors() {
        let err = runtime_err("for v in 5 { }");
        assert!(err.to_string().contains("not iterable"));
    }

    #[test]
    fn test_return_unwinds_through_loops() {
        assert_output(
            "func first(xs) { for v in xs { return v } return nil }\nprint first([9, 8])",
            &["9"],
        );
    }

    // ── functions and classes ────────────────────────────────────────────

    #[test]
    fn test_arity_mismatch() {
        let err = runtime_err("func f(a) { }\nf(1, 2)");
        assert!(err.to_string().contains("Expected 1 arguments but got 2."));
    }

    #[test]
    fn test_call_non_callable() {
        let err = runtime_err("let x = 5\nx()");
        assert!(err.to_string().contains("Can only call functions and classes"));
    }

    #[test]
    fn test_recursion() {
        assert_output(
            "func fib(n) { if n < 2 { return n } return fib(n - 1) + fib(n - 2) }\nprint fib(10)",
            &["55"],
        );
    }

    #[test]
    fn test_methods_see_self() {
        assert_output(
            "class Counter { init() { self.n = 0 } bump() { self.n = self.n + 1 return self.n } }\n\
             let c = Counter()\nc.bump()\nprint c.bump()",
            &["2"],
        );
    }

    #[test]
    fn test_bound_method_keeps_receiver() {
        assert_output(
            "class Greeter { init(name) { self.name = name } hello() { return \"hi \" + self.name } }\n\
             let m = Greeter(\"ada\").hello\nprint m()",
            &["hi ada"],
        );
    }

    #[test]
    fn test_inherited_method_lookup() {
        assert_output(
            "class A { m() { return \"from A\" } }\nclass B < A { }\nprint B().m()",
            &["from A"],
        );
    }

    #[test]
    fn test_undefined_property() {
        let err = runtime_err("class A { }\nA().missing");
        assert!(err.to_string().contains("Undefined property 'missing'"));
    }

    #[test]
    fn test_field_cannot_shadow_method() {
        let err = runtime_err("class A { m() { } }\nlet a = A()\na.m = 1");
        assert!(err.to_string().contains("Cannot shadow method 'm'"));
    }

    #[test]
    fn test_superclass_must_be_class() {
        let err = runtime_err("let NotAClass = 5\nclass B < NotAClass { }");
        assert!(err.to_string().contains("Superclass must be a class"));
    }

    #[test]
    fn test_set_on_non_instance() {
        let err = runtime_err("let xs = [1]\nxs.foo = 2");
        assert!(err.to_string().contains("Only instances have fields"));
    }

    // ── collections ──────────────────────────────────────────────────────

    #[test]
    fn test_list_methods() {
        assert_output(
            "let xs = [1, 2]\nxs.append(3)\nprint xs.length(), xs.contains(2), xs.index_of(3)\n\
             xs.reverse()\nprint xs\nprint xs.pop()\nprint xs.join(\"-\")",
            &["3 true 2", "[3, 2, 1]", "1", "3-2"],
        );
    }

    #[test]
    fn test_list_mutation_shared_reference() {
        assert_output(
            "let a = [1]\nlet b = a\nb.append(2)\nprint a",
            &["[1, 2]"],
        );
    }

    #[test]
    fn test_list_indexing() {
        assert_output("let xs = [10, 20]\nxs[1] = 25\nprint xs[0], xs[1]", &["10 25"]);

        let err = runtime_err("[1, 2][5]");
        assert!(err.to_string().contains("List index out of range"));
    }

    #[test]
    fn test_dict_methods_and_indexing() {
        assert_output(
            "let d = {\"a\": 1}\nd.set(\"b\", 2)\nd[\"c\"] = 3\n\
             print d.length(), d.contains(\"b\"), d.get(\"missing\")\n\
             print d[\"c\"]\nprint d.remove(\"a\"), d.remove(\"a\")\nprint d.keys().length()",
            &["3 true nil", "3", "true false", "2"],
        );
    }

    #[test]
    fn test_dict_missing_key_read_errors() {
        let err = runtime_err("let d = {}\nd[\"nope\"]");
        assert!(err.to_string().contains("Key 'nope' not found"));
    }

    #[test]
    fn test_dict_keys_must_be_strings() {
        let err = runtime_err("let d = {1: 2}");
        assert!(err.to_string().contains("Dictionary keys must be strings"));
    }

    #[test]
    fn test_string_methods() {
        assert_output(
            "let s = \" Hello,World \"\nprint s.trim()\nprint s.trim().upper()\n\
             print s.trim().split(\",\")\nprint \"abcabc\".index_of(\"b\"), \"abcabc\".last_index_of(\"b\")\n\
             print \"3.5\".to_number() + 1, \"x\".to_number()\nprint \"abc\".replace(\"b\", \"-\"), \"abc\".contains(\"bc\")",
            &[
                "Hello,World",
                "HELLO,WORLD",
                "[Hello, World]",
                "1 4",
                "4.5 nil",
                "a-c true",
            ],
        );
    }

    // ── with blocks ──────────────────────────────────────────────────────

    #[test]
    fn test_with_calls_close_on_normal_exit() {
        assert_output(
            "class R { init() { self.closed = false } close() { self.closed = true } }\n\
             let r = R()\nwith r as x { print \"body\" }\nprint r.closed",
            &["body", "true"],
        );
    }

    #[test]
    fn test_with_calls_close_on_error_unwind() {
        assert_output(
            "class R { init() { self.closed = false } close() { self.closed = true } }\n\
             let r = R()\nfunc use(res) { with res as x { [1][9] } }\n\
             print ?use(r)\nprint r.closed",
            &["nil", "true"],
        );
    }

    #[test]
    fn test_with_calls_close_on_return() {
        assert_output(
            "class R { init() { self.n = 0 } close() { self.n = self.n + 1 } }\n\
             let r = R()\nfunc f(res) { with res as x { return \"early\" } }\n\
             print f(r)\nprint r.n",
            &["early", "1"],
        );
    }

    // ── builtins ─────────────────────────────────────────────────────────

    #[test]
    fn test_builtin_registry() {
        assert_output(
            "print len(\"abc\"), len([1, 2]), len({\"a\": 1})\n\
             print range(3)\nprint range(1, 7, 2)\n\
             print type(1), type(\"s\"), type(nil), type([])\n\
             print str(12) + \"!\"\nprint type(clock())",
            &[
                "3 2 1",
                "[0, 1, 2]",
                "[1, 3, 5]",
                "number string nil list",
                "12!",
                "number",
            ],
        );
    }

    #[test]
    fn test_assert_builtin() {
        assert_output("print ?assert(1 == 2, \"broken\")\nassert(true, \"fine\")", &["nil"]);

        let err = runtime_err("assert(false, \"boom\")");
        assert!(err.to_string().contains("Assertion failed: boom"));
    }

    #[test]
    fn test_container_predicates_differ_from_truthiness() {
        assert_output(
            "print is_truthy([]), is_truthy([1]), is_falsey(\"\"), is_truthy(0)",
            &["false true true true"],
        );
    }

    #[test]
    fn test_range_step_zero_errors() {
        let err = runtime_err("range(0, 5, 0)");
        assert!(err.to_string().contains("step must not be zero"));
    }

    #[test]
    fn test_safe_does_not_swallow_return() {
        // `?f()` evaluates the call; the function's return is intercepted at
        // the call boundary, not by the safe operator.
        assert_output("func f() { return 3 }\nprint ?f()", &["3"]);
    }

    #[test]
    fn test_stringify_hook_is_pluggable() {
        fn tagged(value: &nox::value::Value) -> String {
            format!("<{}>", value)
        }

        let mut runtime = Nox::new();
        runtime.interpreter_mut().set_stringify(tagged);
        let buffer = runtime.interpreter_mut().capture_output();
        runtime.run("print 1").expect("script should run");

        assert_eq!(buffer.borrow().trim(), "<1>");
    }

    #[test]
    fn test_builtins_live_in_globals() {
        let mut runtime = Nox::new();
        let globals = runtime.interpreter_mut().globals();

        assert!(globals.borrow().is_defined_locally("clock"));
        assert!(globals.borrow().is_defined_locally("open"));
        assert!(globals.borrow().is_defined_locally("range"));
    }

    #[test]
    fn test_runtime_error_format() {
        let err = runtime_err("print missing");
        let text = err.to_string();
        assert!(text.contains("[line 1]"), "got: {}", text);
        assert!(text.contains("RuntimeError at 'missing'"), "got: {}", text);
    }
}
