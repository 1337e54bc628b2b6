#[cfg(test)]
mod interpreter_tests {
    use treelox::error::LoxError;
    use treelox::expr::{Expr, LiteralValue};
    use treelox::interpreter::{Interpreter, MAX_CALL_DEPTH};
    use treelox::runner;
    use treelox::value::Value;

    /// Run `source` on a fresh interpreter and capture what it printed.
    fn run(source: &str) -> (String, treelox::Result<()>) {
        let mut interpreter = Interpreter::with_output(Vec::new());
        let result = runner::run_source(source, &mut interpreter);
        let output = String::from_utf8(interpreter.into_output()).expect("utf-8 output");
        (output, result)
    }

    fn output_of(source: &str) -> String {
        let (output, result) = run(source);
        if let Err(e) = result {
            panic!("program failed: {}\n--- output so far ---\n{}", e, output);
        }
        output
    }

    /// Run a program expected to fail at runtime; return (message, line).
    fn runtime_error(source: &str) -> (String, usize) {
        match run(source).1 {
            Err(LoxError::Runtime { message, line }) => (message, line),
            Err(other) => panic!("expected runtime error, got {:?}", other),
            Ok(()) => panic!("expected runtime error, program succeeded"),
        }
    }

    #[test]
    fn test_number_literal_evaluates_to_itself() {
        let mut interpreter = Interpreter::with_output(Vec::new());

        for n in [0.0, 1.0, 2.5, 1e10, 123456.789] {
            let value = interpreter
                .evaluate(&Expr::Literal(LiteralValue::Number(n)))
                .expect("literal evaluation");
            assert_eq!(value, Value::Number(n));
        }
    }

    #[test]
    fn test_arithmetic_and_number_display() {
        assert_eq!(
            output_of("print 1 + 2; print 7 / 2; print 2 * -3; print 10 - 2 - 3; print 1 / 3;"),
            "3\n3.5\n-6\n5\n0.3333333333333333\n"
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(output_of("print \"a\" + \"b\";"), "ab\n");
        assert_eq!(
            output_of("print (\"a\" + \"b\") + \"c\"; print \"a\" + (\"b\" + \"c\");"),
            "abc\nabc\n"
        );
    }

    #[test]
    fn test_string_plus_number_is_type_error() {
        let (message, line) = runtime_error("var s = \"a\";\nprint s + 1;");
        assert_eq!(message, "Operands must be two numbers or two strings.");
        assert_eq!(line, 2);
    }

    #[test]
    fn test_non_numeric_operands() {
        assert_eq!(runtime_error("print \"a\" - 1;").0, "Operands must be numbers.");
        assert_eq!(runtime_error("print nil < 1;").0, "Operands must be numbers.");
        assert_eq!(runtime_error("print -\"a\";").0, "Operand must be a number.");
        assert_eq!(runtime_error("print 1 / 0;").0, "Division by zero.");
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            output_of("print !nil; print !false; print !0; print !\"\"; print !true;"),
            "true\ntrue\nfalse\nfalse\nfalse\n"
        );
        assert_eq!(
            output_of("if (0) print \"zero\"; if (\"\") print \"empty\"; if (nil) print \"nil\";"),
            "zero\nempty\n"
        );
    }

    #[test]
    fn test_equality_across_kinds() {
        assert_eq!(
            output_of(
                "print 1 == 1; print 1 == \"1\"; print nil == nil; print nil == false; \
                 print \"x\" != \"y\"; print true == true;"
            ),
            "true\nfalse\ntrue\nfalse\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_shadowing() {
        assert_eq!(
            output_of("var x = 1; { var x = 2; print x; } print x;"),
            "2\n1\n"
        );
    }

    #[test]
    fn test_assignment_reaches_enclosing_scope() {
        assert_eq!(
            output_of("var x = 1; { { x = 5; } } print x; var y; print y;"),
            "5\nnil\n"
        );
    }

    #[test]
    fn test_bindings_hold_copies() {
        assert_eq!(
            output_of("var a = \"x\"; var b = a; a = \"y\"; print b; print a;"),
            "x\ny\n"
        );
    }

    #[test]
    fn test_undefined_variable() {
        let (message, line) = runtime_error("print 1;\nprint missing;");
        assert_eq!(message, "Undefined variable 'missing'.");
        assert_eq!(line, 2);

        assert_eq!(
            runtime_error("missing = 3;").0,
            "Undefined variable 'missing'."
        );
    }

    #[test]
    fn test_closures_share_captured_scope() {
        let source = "
            fun make() {
                var i = 0;
                fun inc() { i = i + 1; return i; }
                return inc;
            }
            var c = make();
            print c();
            print c();
        ";
        assert_eq!(output_of(source), "1\n2\n");
    }

    #[test]
    fn test_sibling_closures_see_each_other() {
        let source = "
            var get; var set;
            fun pair() {
                var v = \"start\";
                fun g() { return v; }
                fun s(x) { v = x; }
                get = g; set = s;
            }
            pair();
            print get();
            set(\"changed\");
            print get();
        ";
        assert_eq!(output_of(source), "start\nchanged\n");
    }

    #[test]
    fn test_independent_closures() {
        let source = "
            fun counter() { var n = 0; fun step() { n = n + 1; return n; } return step; }
            var a = counter(); var b = counter();
            a(); a();
            print a(); print b();
        ";
        assert_eq!(output_of(source), "3\n1\n");
    }

    #[test]
    fn test_recursion_and_return() {
        assert_eq!(
            output_of(
                "fun fact(n) { if (n <= 1) return 1; return n * fact(n - 1); } print fact(5);"
            ),
            "120\n"
        );
        assert_eq!(
            output_of(
                "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(15);"
            ),
            "610\n"
        );
    }

    #[test]
    fn test_return_unwinds_loops_and_blocks() {
        let source = "
            fun find() {
                var i = 0;
                while (true) {
                    { if (i == 3) return i; }
                    i = i + 1;
                }
            }
            print find();
            fun nothing() { 1 + 1; }
            print nothing();
            fun bare() { return; }
            print bare();
        ";
        assert_eq!(output_of(source), "3\nnil\nnil\n");
    }

    #[test]
    fn test_function_sees_its_own_name() {
        assert_eq!(
            output_of("fun f() { return f; } print f() == f; print f;"),
            "true\n<fn f>\n"
        );
    }

    #[test]
    fn test_short_circuit() {
        let source = "
            fun sideEffect() { print \"called\"; return true; }
            false and sideEffect();
            true or sideEffect();
        ";
        assert_eq!(output_of(source), "");

        assert_eq!(
            output_of(
                "print nil or \"fallback\"; print \"left\" or 1; print nil and 1; print 1 and 2;"
            ),
            "fallback\ntrue\nfalse\n2\n"
        );
    }

    #[test]
    fn test_loops() {
        assert_eq!(
            output_of("var sum = 0; for (var i = 1; i <= 4; i = i + 1) sum = sum + i; print sum;"),
            "10\n"
        );
        assert_eq!(
            output_of("var n = 3; while (n > 0) { print n; n = n - 1; }"),
            "3\n2\n1\n"
        );
    }

    #[test]
    fn test_for_initializer_is_scoped_to_loop() {
        let (message, _) = runtime_error("for (var i = 0; i < 1; i = i + 1) {} print i;");
        assert_eq!(message, "Undefined variable 'i'.");
    }

    #[test]
    fn test_arity_mismatch() {
        let (message, line) = runtime_error("fun f(a, b) { return a; }\nf(1);");
        assert_eq!(message, "Expected 2 arguments but got 1.");
        assert_eq!(line, 2);

        assert_eq!(
            runtime_error("clock(1);").0,
            "Expected 0 arguments but got 1."
        );
    }

    #[test]
    fn test_calling_non_callable() {
        assert_eq!(
            runtime_error("var x = 1; x();").0,
            "Can only call functions and classes, not number."
        );
        assert_eq!(
            runtime_error("\"s\"();").0,
            "Can only call functions and classes, not string."
        );
    }

    #[test]
    fn test_arguments_evaluate_left_to_right() {
        let source = "
            fun show(x) { print x; return x; }
            fun three(a, b, c) { return a + b + c; }
            print three(show(1), show(2), show(3));
        ";
        assert_eq!(output_of(source), "1\n2\n3\n6\n");
    }

    #[test]
    fn test_native_clock() {
        assert_eq!(output_of("print clock() > 0; print clock;"), "true\n<native fn clock>\n");
    }

    #[test]
    fn test_runaway_recursion_is_stack_overflow() {
        match run("fun f() { f(); }\nf();").1 {
            Err(LoxError::StackOverflow { line }) => assert_eq!(line, 1),
            other => panic!("expected stack overflow, got {:?}", other),
        }
    }

    #[test]
    fn test_deep_legal_recursion() {
        let depth = MAX_CALL_DEPTH - 24;
        let source = format!(
            "fun down(n) {{ if (n == 0) return 0; return 1 + down(n - 1); }} print down({});",
            depth
        );
        assert_eq!(output_of(&source), format!("{}\n", depth));
    }

    #[test]
    fn test_huge_operator_chain_runs_and_is_released() {
        let terms = 300_000;
        let source = format!("print {};", vec!["1"; terms].join(" + "));

        let statements = runner::compile(&source).expect("chain compiles");
        let mut interpreter = Interpreter::with_output(Vec::new());
        interpreter.interpret(&statements).expect("chain evaluates");

        drop(statements);

        let output = String::from_utf8(interpreter.into_output()).expect("utf-8 output");
        assert_eq!(output, format!("{}\n", terms));
    }

    #[test]
    fn test_deeply_nested_blocks_and_unary_chain() {
        let depth = 100_000;
        let source = format!(
            "var x = \"outer\"; {} x = \"set\"; print x; print {}true; {}",
            "{".repeat(depth),
            "!".repeat(depth),
            "}".repeat(depth)
        );

        assert_eq!(output_of(&source), "set\ntrue\n");
    }

    #[test]
    fn test_negative_zero_keeps_its_sign() {
        assert_eq!(
            output_of("print -0; print 0; print -0 == 0; print 0 * -1;"),
            "-0\n0\ntrue\n-0\n"
        );
    }

    #[test]
    fn test_output_before_runtime_error_is_kept() {
        let (output, result) = run("print 1; print nil + 1; print 2;");
        assert_eq!(output, "1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_class_instantiation_and_fields() {
        let source = "
            class Point {}
            var a = Point();
            var b = Point();
            a.x = 1;
            b.x = 2;
            print a.x;
            print b.x;
            print Point;
            print a;
        ";
        assert_eq!(output_of(source), "1\n2\nPoint\nPoint instance\n");
    }

    #[test]
    fn test_instances_are_shared_by_reference() {
        let source = "
            class Box {}
            var a = Box();
            var alias = a;
            alias.value = \"set through alias\";
            print a.value;
            print a == alias;
            print a == Box();
        ";
        assert_eq!(output_of(source), "set through alias\ntrue\nfalse\n");
    }

    #[test]
    fn test_methods_initializer_and_this() {
        let source = "
            class Counter {
                init(start) { this.count = start; }
                bump() { this.count = this.count + 1; return this; }
                get() { return this.count; }
            }
            var c = Counter(10);
            c.bump().bump();
            print c.get();
            var m = c.get;
            c.bump();
            print m();
        ";
        assert_eq!(output_of(source), "12\n13\n");
    }

    #[test]
    fn test_method_through_class_value() {
        assert_eq!(
            output_of("class A { m() { return \"from class\"; } } print A.m();"),
            "from class\n"
        );
    }

    #[test]
    fn test_class_arity_follows_init() {
        assert_eq!(
            runtime_error("class P { init(a, b) {} } P(1);").0,
            "Expected 2 arguments but got 1."
        );
        assert_eq!(
            runtime_error("class Q {} Q(1);").0,
            "Expected 0 arguments but got 1."
        );
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_error("class A {} print A().nope;").0,
            "Undefined property 'nope'."
        );
        assert_eq!(
            runtime_error("var n = 1; print n.field;").0,
            "Only instances have properties."
        );
        assert_eq!(
            runtime_error("var n = 1; n.field = 2;").0,
            "Only instances have fields."
        );
    }

    #[test]
    fn test_this_outside_method() {
        assert_eq!(
            runtime_error("print this;").0,
            "Can't use 'this' outside of a class."
        );
    }

    #[test]
    fn test_syntax_errors_prevent_execution() {
        let (output, result) = run("print 1; print ;");
        assert_eq!(output, "");

        match result {
            Err(LoxError::Syntax(diagnostics)) => {
                assert_eq!(
                    diagnostics.to_string(),
                    "[line 1] Error at ';': Expect expression."
                );
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_runtime_error_display() {
        match run("\n\nprint -nil;").1 {
            Err(e) => assert_eq!(e.to_string(), "Operand must be a number.\n[line 3]"),
            Ok(()) => panic!("expected failure"),
        }
    }
}
