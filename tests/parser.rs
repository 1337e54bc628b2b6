#[cfg(test)]
mod parser_tests {
    use treelox::ast_printer::AstPrinter;
    use treelox::error::Diagnostics;
    use treelox::expr::{Expr, LiteralValue};
    use treelox::parser::Parser;
    use treelox::stmt::Stmt;
    use treelox::{parse, scan};

    /// Parse `source` and render every statement in prefix form.
    fn print_program(source: &str) -> (Vec<String>, Diagnostics) {
        let (tokens, mut diagnostics) = scan(source);
        let (statements, parse_diagnostics) = parse(tokens);
        diagnostics.extend(parse_diagnostics);

        let printed = statements.iter().map(AstPrinter::print_stmt).collect();
        (printed, diagnostics)
    }

    fn print_expression(source: &str) -> String {
        let (tokens, _) = scan(source);
        let mut diagnostics = Diagnostics::new();
        let expr = Parser::new(tokens, &mut diagnostics).parse_expression();

        assert!(diagnostics.is_empty(), "unexpected errors: {}", diagnostics);
        expr.map(|e| AstPrinter::print(&e)).unwrap_or_default()
    }

    fn messages(diagnostics: &Diagnostics) -> Vec<String> {
        diagnostics.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_precedence_levels() {
        assert_eq!(
            print_expression("1 + 2 * 3 - 4 / -5"),
            "(- (+ 1.0 (* 2.0 3.0)) (/ 4.0 (- 5.0)))"
        );
        assert_eq!(
            print_expression("a or b and c == d < e"),
            "(or a (and b (== c (< d e))))"
        );
        assert_eq!(print_expression("!!true"), "(! (! true))");
        assert_eq!(print_expression("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
    }

    #[test]
    fn test_binary_levels_are_left_associative() {
        assert_eq!(print_expression("10 - 2 - 3"), "(- (- 10.0 2.0) 3.0)");
        assert_eq!(print_expression("8 / 4 / 2"), "(/ (/ 8.0 4.0) 2.0)");
        assert_eq!(print_expression("a == b != c"), "(!= (== a b) c)");
        assert_eq!(print_expression("a or b or c"), "(or (or a b) c)");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(print_expression("a = b = 1"), "(= a (= b 1.0))");
        assert_eq!(print_expression("p.x = 2"), "(= (. p x) 2.0)");
    }

    #[test]
    fn test_calls_and_property_access_chain() {
        assert_eq!(print_expression("f(1)(2, x)"), "(call (call f 1.0) 2.0 x)");
        assert_eq!(print_expression("a.b.c()"), "(call (. (. a b) c))");
    }

    #[test]
    fn test_literals() {
        assert_eq!(print_expression("nil"), "nil");
        assert_eq!(print_expression("\"text\""), "text");
        assert_eq!(print_expression("2.5"), "2.5");
        assert_eq!(print_expression("false"), "false");
    }

    #[test]
    fn test_long_operator_chain_does_not_recurse() {
        let source = vec!["1"; 1_000].join(" - ");
        let (tokens, _) = scan(&format!("print {};", source));
        let (statements, diagnostics) = parse(tokens);

        assert!(diagnostics.is_empty());
        assert_eq!(statements.len(), 1);

        // the fold leans left: the outermost node's right operand is a leaf
        match &statements[0] {
            Stmt::Print(Expr::Binary { right, .. }) => {
                assert_eq!(**right, Expr::Literal(LiteralValue::Number(1.0)));
            }
            _ => panic!("expected print of binary"),
        }
    }

    #[test]
    fn test_declarations() {
        let (printed, diagnostics) = print_program(
            "var a; var b = 1; fun add(x, y) { return x + y; } class C { m() { return this; } }",
        );

        assert!(diagnostics.is_empty(), "{}", diagnostics);
        assert_eq!(
            printed,
            vec![
                "(var a)",
                "(var b 1.0)",
                "(fun add (x y) (return (+ x y)))",
                "(class C (method m () (return this)))",
            ]
        );
    }

    #[test]
    fn test_control_flow_statements() {
        let (printed, diagnostics) =
            print_program("if (a) print 1; else { print 2; } while (b) b = false;");

        assert!(diagnostics.is_empty());
        assert_eq!(
            printed,
            vec![
                "(if a (print 1.0) (block (print 2.0)))",
                "(while b (; (= b false)))",
            ]
        );
    }

    #[test]
    fn test_for_desugars_to_block_and_while() {
        let (printed, _) = print_program("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(
            printed,
            vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );

        let (printed, _) = print_program("for (;;) print 1;");
        assert_eq!(printed, vec!["(while true (print 1.0))"]);
    }

    #[test]
    fn test_for_without_condition_uses_true_literal() {
        let (tokens, _) = scan("for (x = 0;;) {}");
        let (statements, diagnostics) = parse(tokens);
        assert!(diagnostics.is_empty());

        let Some(Stmt::Block(inner)) = statements.first() else {
            panic!("expected block, got {:?}", statements);
        };
        match &inner[1] {
            Stmt::While { condition, .. } => {
                assert_eq!(condition, &Expr::Literal(LiteralValue::Bool(true)));
            }
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_error_recovery_keeps_later_statements() {
        let (printed, diagnostics) = print_program("print 1; var = 2; print 3; print (4; print 5;");

        assert_eq!(printed, vec!["(print 1.0)", "(print 3.0)", "(print 5.0)"]);
        assert_eq!(
            messages(&diagnostics),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 1] Error at ';': Expect ')' after expression.",
            ]
        );
    }

    #[test]
    fn test_error_at_end_of_input() {
        let (printed, diagnostics) = print_program("print 1");

        assert!(printed.is_empty());
        assert_eq!(
            messages(&diagnostics),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (printed, diagnostics) = print_program("1 + a = 3; print 2;");

        assert_eq!(printed, vec!["(print 2.0)"]);
        assert_eq!(
            messages(&diagnostics),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_argument_cap_is_reported_but_not_fatal() {
        let args: Vec<String> = (0..128).map(|i| i.to_string()).collect();
        let (printed, diagnostics) = print_program(&format!("f({}); print 1;", args.join(", ")));

        assert_eq!(printed.len(), 2);
        assert_eq!(diagnostics.len(), 1);
        assert!(messages(&diagnostics)[0].contains("Can't have more than 127 arguments."));

        let args: Vec<String> = (0..127).map(|i| i.to_string()).collect();
        let (_, diagnostics) = print_program(&format!("f({});", args.join(", ")));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_parameter_cap() {
        let params: Vec<String> = (0..128).map(|i| format!("p{}", i)).collect();
        let (printed, diagnostics) = print_program(&format!("fun f({}) {{}}", params.join(", ")));

        assert_eq!(printed.len(), 1);
        assert!(messages(&diagnostics)[0].contains("Can't have more than 127 parameters."));
    }

    #[test]
    fn test_return_outside_function() {
        let (_, diagnostics) = print_program("return 1;");
        assert_eq!(
            messages(&diagnostics),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );

        let (_, diagnostics) = print_program("fun f() { { return; } }");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unterminated_block_reports_at_end() {
        let (printed, diagnostics) = print_program("{ print 1;\n");

        assert!(printed.is_empty());
        assert_eq!(
            messages(&diagnostics),
            vec!["[line 2] Error at end: Expect '}' after block."]
        );
    }

    #[test]
    fn test_parse_expression_rejects_trailing_tokens() {
        let (tokens, _) = scan("1 + 2 3");
        let mut diagnostics = Diagnostics::new();
        let expr = Parser::new(tokens, &mut diagnostics).parse_expression();

        assert!(expr.is_none());
        assert_eq!(
            messages(&diagnostics),
            vec!["[line 1] Error at '3': Expect end of expression."]
        );
    }
}
