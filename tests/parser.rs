#[cfg(test)]
mod parser_tests {
    use rox::ast::{ExprKind, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::diagnostics::Diagnostics;
    use rox::parser::{Parser, MAX_ARGS};
    use rox::scanner::Scanner;
    use rox::token::Token;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        Scanner::new(source).filter_map(Result::ok).collect()
    }

    /// Parses `source` and renders every statement, failing on any error.
    fn printed(source: &str) -> Vec<String> {
        let tokens = tokens(source);
        let mut parser = Parser::new(&tokens);
        let statements = parser.parse();

        assert!(
            parser.errors().is_empty(),
            "Unexpected parse errors: {:?}",
            parser.errors()
        );

        statements.iter().map(|s| AstPrinter::print_stmt(s)).collect()
    }

    fn error_messages(source: &str) -> Vec<String> {
        let mut diagnostics = Diagnostics::new();
        let tokens = rox::scan(source, &mut diagnostics);
        rox::parse(&tokens, &mut diagnostics);

        diagnostics.errors().iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_parser_01_precedence() {
        assert_eq!(
            printed("print 1 + 2 * 3 - -4 / (5);"),
            vec!["(print (- (+ 1.0 (* 2.0 3.0)) (/ (- 4.0) (group 5.0))))"]
        );
    }

    #[test]
    fn test_parser_02_comparison_equality_logic() {
        assert_eq!(
            printed("a == b or c < d and !e;"),
            vec!["(; (or (== a b) (and (< c d) (! e))))"]
        );
    }

    #[test]
    fn test_parser_03_assignment_is_right_associative() {
        assert_eq!(printed("a = b = 3;"), vec!["(; (= a (= b 3.0)))"]);
    }

    #[test]
    fn test_parser_04_property_set_and_call_chain() {
        assert_eq!(
            printed("point.x = make().y(1, \"two\");"),
            vec!["(; (= (. point x) (call (. (call make) y) 1.0 two)))"]
        );
    }

    #[test]
    fn test_parser_05_for_is_desugared() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );
    }

    #[test]
    fn test_parser_06_for_without_clauses_loops_on_true() {
        assert_eq!(printed("for (;;) print 1;"), vec!["(while true (print 1.0))"]);
    }

    #[test]
    fn test_parser_07_declarations() {
        assert_eq!(
            printed(
                "class B < A { init(x) { this.x = x; } get() { return super.get(); } }\n\
                 fun f() {}\n\
                 var v;"
            ),
            vec![
                "(class B < A (init(x) (; (= (. this x) x))) (get() (return (call (super get)))))",
                "(fun f())",
                "(var v)",
            ]
        );
    }

    #[test]
    fn test_parser_08_if_else_and_while() {
        assert_eq!(
            printed("if (a) print 1; else { print 2; } while (false) return;"),
            vec![
                "(if a (print 1.0) (block (print 2.0)))",
                "(while false (return))",
            ]
        );
    }

    #[test]
    fn test_two_syntax_errors_are_both_reported() {
        assert_eq!(
            error_messages("print ;\nvar = 1;\nprint 2;"),
            vec![
                "[line 1] Error at ';': Expect expression.",
                "[line 2] Error at '=': Expect variable name.",
            ]
        );
    }

    #[test]
    fn test_recovery_keeps_later_statements() {
        let tokens = tokens("var a = ;\nprint a;");
        let mut parser = Parser::new(&tokens);
        let statements = parser.parse();

        assert_eq!(parser.errors().len(), 1);
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print(_)));
    }

    #[test]
    fn test_error_at_end_of_input() {
        assert_eq!(
            error_messages("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_invalid_assignment_target_is_not_fatal() {
        let tokens = tokens("1 + 2 = 3; print 4;");
        let mut parser = Parser::new(&tokens);
        let statements = parser.parse();

        let errors: Vec<String> = parser.errors().iter().map(|e| e.to_string()).collect();
        assert_eq!(errors, vec!["[line 1] Error at '=': Invalid assignment target."]);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_argument_cap_is_reported_but_parse_continues() {
        let source = "f(1, 2, 3, 4, 5, 6, 7, 8, 9);";
        let tokens = tokens(source);
        let mut parser = Parser::new(&tokens);
        let statements = parser.parse();

        let errors: Vec<String> = parser.errors().iter().map(|e| e.to_string()).collect();
        assert_eq!(
            errors,
            vec!["[line 1] Error at '9': Cannot have more than 8 arguments."]
        );

        match &statements[..] {
            [Stmt::Expression(expr)] => match &expr.kind {
                ExprKind::Call { arguments, .. } => assert_eq!(arguments.len(), MAX_ARGS + 1),
                other => panic!("Expected a call, got {:?}", other),
            },
            other => panic!("Expected one expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parameter_cap_is_reported_but_parse_continues() {
        let tokens = tokens("fun f(a, b, c, d, e, f, g, h, i) {}");
        let mut parser = Parser::new(&tokens);
        let statements = parser.parse();

        let errors: Vec<String> = parser.errors().iter().map(|e| e.to_string()).collect();
        assert_eq!(
            errors,
            vec!["[line 1] Error at 'i': Cannot have more than 8 parameters."]
        );

        match &statements[..] {
            [Stmt::Function(decl)] => assert_eq!(decl.params.len(), 9),
            other => panic!("Expected one function, got {:?}", other),
        }
    }

    #[test]
    fn test_expression_ids_are_distinct() {
        let tokens = tokens("a + a;");
        let mut parser = Parser::new(&tokens);
        let statements = parser.parse();

        match &statements[..] {
            [Stmt::Expression(expr)] => match &expr.kind {
                ExprKind::Binary { left, right, .. } => {
                    assert_ne!(left.id, right.id);
                    assert_ne!(left.id, expr.id);
                }
                other => panic!("Expected a binary expression, got {:?}", other),
            },
            other => panic!("Expected one expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_token_slice_parses_to_nothing() {
        let mut diagnostics = Diagnostics::new();
        let statements = rox::parse(&[], &mut diagnostics);

        assert!(statements.is_empty());
        assert!(diagnostics.errors().is_empty());
    }

    #[test]
    fn test_missing_eof_token_reads_as_end_of_input() {
        let tokens = tokens("print 1");
        let without_eof = &tokens[..tokens.len() - 1];

        let mut diagnostics = Diagnostics::new();
        let statements = rox::parse(without_eof, &mut diagnostics);

        assert!(statements.is_empty());
        assert_eq!(
            diagnostics
                .errors()
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>(),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }
}
