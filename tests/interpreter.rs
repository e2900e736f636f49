#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use rox::diagnostics::Diagnostics;
    use rox::interpreter::Interpreter;

    /// An in‑memory `print` sink the test keeps a handle to.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).expect("output is UTF-8")
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run(source: &str) -> (String, Diagnostics) {
        let out = SharedBuf::default();
        let mut diagnostics = Diagnostics::new();

        rox::run(source, out.clone(), &mut diagnostics);

        (out.contents(), diagnostics)
    }

    /// Runs a program expected to succeed and returns what it printed.
    fn output(source: &str) -> String {
        let (out, diagnostics) = run(source);

        assert!(
            diagnostics.errors().is_empty(),
            "Unexpected errors: {:?}",
            diagnostics.errors()
        );

        out
    }

    /// Runs a program expected to fail at runtime; returns its output and
    /// the error message.
    fn runtime_error(source: &str) -> (String, String) {
        let (out, diagnostics) = run(source);

        assert!(!diagnostics.had_error(), "Unexpected static errors");
        assert!(diagnostics.had_runtime_error(), "Expected a runtime error");
        assert_eq!(diagnostics.errors().len(), 1);

        (out, diagnostics.errors()[0].message())
    }

    #[test]
    fn test_arithmetic_and_number_formatting() {
        assert_eq!(
            output("print 1 + 2; print 7 / 2; print -(3 * 2); print 10 - 0.5;"),
            "3\n3.5\n-6\n9.5\n"
        );
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(output("print 1 / 0; print -1 / 0;"), "inf\n-inf\n");
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            output(
                "if (nil) print \"nil\"; else print \"nil is false\";\n\
                 if (false) print \"false\"; else print \"false is false\";\n\
                 if (0) print \"0 is true\";\n\
                 if (\"\") print \"empty is true\";\n\
                 print !nil;"
            ),
            "nil is false\nfalse is false\n0 is true\nempty is true\ntrue\n"
        );
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            output("print nil == nil; print nil == false; print 1 == \"1\"; print \"a\" == \"a\"; print 2 != 3;"),
            "true\nfalse\nfalse\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_string_and_number_addition() {
        assert_eq!(output("print \"a\" + \"b\"; print 1 + 1;"), "ab\n2\n");

        let (_, message) = runtime_error("print \"a\" + 1;");
        assert_eq!(message, "Operands must be two numbers or two strings.");
    }

    #[test]
    fn test_operand_type_errors() {
        let (_, message) = runtime_error("print -\"x\";");
        assert_eq!(message, "Operand must be a number.");

        let (_, message) = runtime_error("print 1 < \"2\";");
        assert_eq!(message, "Operands must be numbers.");
    }

    #[test]
    fn test_runtime_error_display_carries_line() {
        let (_, diagnostics) = run("\n\nprint nil * 2;");

        assert_eq!(
            diagnostics.errors()[0].to_string(),
            "Operands must be numbers.\n[line 3]"
        );
    }

    #[test]
    fn test_logical_operators_short_circuit_and_return_operands() {
        assert_eq!(
            output(
                "var called = false;\n\
                 fun touch() { called = true; return \"touched\"; }\n\
                 print nil or \"default\";\n\
                 print \"first\" or touch();\n\
                 print nil and touch();\n\
                 print called;"
            ),
            "default\nfirst\nnil\nfalse\n"
        );
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_eq!(output("var x; print x;"), "nil\n");
    }

    #[test]
    fn test_undefined_variable() {
        let (_, message) = runtime_error("print y;");
        assert_eq!(message, "Undefined variable 'y'.");

        let (_, message) = runtime_error("y = 1;");
        assert_eq!(message, "Undefined variable 'y'.");
    }

    #[test]
    fn test_block_scoping_and_shadowing() {
        assert_eq!(
            output(
                "var a = \"global\";\n\
                 { var a = \"outer\"; { var a = \"inner\"; print a; } print a; }\n\
                 print a;"
            ),
            "inner\nouter\nglobal\n"
        );
    }

    #[test]
    fn test_while_and_for_loops() {
        assert_eq!(
            output(
                "var i = 0; while (i < 3) { print i; i = i + 1; }\n\
                 for (var j = 0; j < 2; j = j + 1) print j;"
            ),
            "0\n1\n2\n0\n1\n"
        );
    }

    #[test]
    fn test_closure_counter() {
        assert_eq!(
            output(
                "fun makeCounter() { var i = 0; fun inc() { i = i + 1; return i; } return inc; }\n\
                 var c = makeCounter();\n\
                 print c();\n\
                 print c();"
            ),
            "1\n2\n"
        );
    }

    #[test]
    fn test_closures_bind_statically() {
        // The closure keeps seeing the global `a` even after a local shadows it.
        assert_eq!(
            output(
                "var a = \"global\";\n\
                 {\n\
                   fun show() { print a; }\n\
                   show();\n\
                   var a = \"block\";\n\
                   show();\n\
                 }"
            ),
            "global\nglobal\n"
        );
    }

    #[test]
    fn test_scope_congruence_in_loops_and_recursion() {
        assert_eq!(
            output(
                "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
                 var total = 0;\n\
                 for (var i = 0; i < 5; i = i + 1) {\n\
                   var x = i;\n\
                   { var y = x; fun add() { total = total + y; } add(); }\n\
                 }\n\
                 print total;\n\
                 print fib(10);"
            ),
            "10\n55\n"
        );
    }

    /// Ways of opening a nested scope around a piece of code.
    #[derive(Clone, Copy, Debug)]
    enum Wrapper {
        Block,
        Function,
        Closure,
        Method,
        Loop,
    }

    const WRAPPERS: [Wrapper; 5] = [
        Wrapper::Block,
        Wrapper::Function,
        Wrapper::Closure,
        Wrapper::Method,
        Wrapper::Loop,
    ];

    fn wrap(wrapper: Wrapper, level: usize, body: &str) -> String {
        match wrapper {
            Wrapper::Block => format!("{{\n{}}}\n", body),
            Wrapper::Function => format!("fun f{0}() {{\n{1}}}\nf{0}();\n", level, body),
            Wrapper::Closure => format!(
                "fun make{0}() {{ fun run() {{\n{1}}} return run; }}\nmake{0}()();\n",
                level, body
            ),
            Wrapper::Method => format!(
                "class C{0} {{ m() {{\n{1}}} }}\nC{0}().m();\n",
                level, body
            ),
            Wrapper::Loop => format!(
                "for (var k{0} = 0; k{0} < 2; k{0} = k{0} + 1) {{\n{1}}}\n",
                level, body
            ),
        }
    }

    /// Code for scope `level` and everything nested in it, with the lines it
    /// should print.  `visible` is the value `v` holds on entry.
    fn scope_body(
        level: usize,
        wrappers: &[Wrapper],
        shadows: u32,
        read_first: bool,
        visible: &str,
    ) -> (String, Vec<String>) {
        let mut code = String::new();
        let mut expected = Vec::new();
        let mut visible = visible.to_string();

        if read_first {
            code.push_str("print v;\n");
            expected.push(visible.clone());
        }

        if shadows & (1 << level) != 0 {
            visible = format!("v{}", level);
            code.push_str(&format!("var v = \"{}\";\n", visible));
        }

        code.push_str("print v;\n");
        expected.push(visible.clone());

        if let Some(&wrapper) = wrappers.get(level) {
            let (inner, inner_expected) =
                scope_body(level + 1, wrappers, shadows, read_first, &visible);

            code.push_str(&wrap(wrapper, level + 1, &inner));

            let repeats = if matches!(wrapper, Wrapper::Loop) { 2 } else { 1 };
            for _ in 0..repeats {
                expected.extend(inner_expected.iter().cloned());
            }

            code.push_str("print v;\n");
            expected.push(visible.clone());
        }

        (code, expected)
    }

    #[test]
    fn test_generated_nested_scopes_resolve_like_they_run() {
        let mut programs = 0;

        for depth in 1..=3u32 {
            for combination in 0..WRAPPERS.len().pow(depth) {
                let mut index = combination;
                let wrappers: Vec<Wrapper> = (0..depth)
                    .map(|_| {
                        let wrapper = WRAPPERS[index % WRAPPERS.len()];
                        index /= WRAPPERS.len();
                        wrapper
                    })
                    .collect();

                for shadows in 0..(1u32 << (depth + 1)) {
                    for read_first in [false, true] {
                        let (body, expected) =
                            scope_body(0, &wrappers, shadows, read_first, "g");
                        let source = format!("var v = \"g\";\n{}", body);
                        let expected = format!("{}\n", expected.join("\n"));

                        let (out, diagnostics) = run(&source);

                        assert!(
                            diagnostics.errors().is_empty(),
                            "Unexpected errors {:?} in:\n{}",
                            diagnostics.errors(),
                            source
                        );
                        assert_eq!(out, expected, "Wrong output for:\n{}", source);

                        programs += 1;
                    }
                }
            }
        }

        assert_eq!(programs, 5 * 4 * 2 + 25 * 8 * 2 + 125 * 16 * 2);
    }

    #[test]
    fn test_runaway_recursion_is_a_runtime_error() {
        let (out, message) = runtime_error(
            "fun f(n) { if (n > 0) f(n - 1); }\n\
             f(100000);\n\
             print \"done\";",
        );

        assert_eq!(message, "Stack overflow.");
        assert_eq!(out, "");
    }

    #[test]
    fn test_recursion_below_the_call_limit_runs() {
        assert_eq!(
            output(
                "fun depth(n) { if (n == 0) return 0; return 1 + depth(n - 1); }\n\
                 print depth(150);"
            ),
            "150\n"
        );
    }

    #[test]
    fn test_call_depth_recovers_after_overflow() {
        let first_source = "fun f(n) { if (n > 0) f(n - 1); return n; } f(100000);";
        let second_source = "print f(150);";

        let mut diagnostics = Diagnostics::new();
        let first_tokens = rox::scan(first_source, &mut diagnostics);
        let second_tokens = rox::scan(second_source, &mut diagnostics);

        let out = SharedBuf::default();
        let mut interpreter = Interpreter::with_output(out.clone());

        let first = rox::parse(&first_tokens, &mut diagnostics);
        let locals = rox::resolve(&first, &mut diagnostics);
        rox::interpret(&mut interpreter, &first, locals, &mut diagnostics);

        assert!(diagnostics.had_runtime_error());
        assert_eq!(diagnostics.errors()[0].message(), "Stack overflow.");

        diagnostics.reset();

        let second = rox::parse(&second_tokens, &mut diagnostics);
        let locals = rox::resolve(&second, &mut diagnostics);
        rox::interpret(&mut interpreter, &second, locals, &mut diagnostics);

        assert!(diagnostics.errors().is_empty());
        assert_eq!(out.contents(), "150\n");
    }

    #[test]
    fn test_return_unwinds_loops_but_is_not_an_error() {
        assert_eq!(
            output(
                "fun find() { var i = 0; while (true) { if (i == 3) return i; i = i + 1; } }\n\
                 print find();\n\
                 fun nothing() { return; }\n\
                 print nothing();"
            ),
            "3\nnil\n"
        );
    }

    #[test]
    fn test_arity_check_has_no_side_effects() {
        let (out, message) = runtime_error(
            "fun pair(a, b) { print \"body ran\"; return a; }\n\
             pair(1);",
        );

        assert_eq!(message, "Not enough arguments.");
        assert_eq!(out, "");
    }

    #[test]
    fn test_surplus_arguments_are_ignored() {
        assert_eq!(output("fun one(a) { return a; } print one(1, 2, 3);"), "1\n");
    }

    #[test]
    fn test_calling_a_non_callable() {
        let (_, message) = runtime_error("\"str\"();");
        assert_eq!(message, "Can only call functions and classes.");
    }

    #[test]
    fn test_runtime_error_stops_execution() {
        let (out, message) = runtime_error("print 1; print nil + 1; print 2;");

        assert_eq!(out, "1\n");
        assert_eq!(message, "Operands must be two numbers or two strings.");
    }

    #[test]
    fn test_stringification_of_callables_and_objects() {
        assert_eq!(
            output(
                "fun f() {}\n\
                 class Bagel { eat() {} }\n\
                 print f;\n\
                 print clock;\n\
                 print Bagel;\n\
                 print Bagel();\n\
                 print Bagel().eat;"
            ),
            "<fn f>\n<native fn clock>\nBagel\nBagel instance\n<fn eat>\n"
        );
    }

    #[test]
    fn test_clock_returns_seconds() {
        assert_eq!(output("var t = clock(); print t > 1000000000;"), "true\n");
    }

    #[test]
    fn test_fields_and_methods() {
        assert_eq!(
            output(
                "class Point {\n\
                   init(x, y) { this.x = x; this.y = y; }\n\
                   sum() { return this.x + this.y; }\n\
                 }\n\
                 var p = Point(1, 2);\n\
                 print p.sum();\n\
                 p.x = 10;\n\
                 print p.sum();\n\
                 p.label = \"new field\";\n\
                 print p.label;"
            ),
            "3\n12\nnew field\n"
        );
    }

    #[test]
    fn test_fields_shadow_methods() {
        assert_eq!(
            output(
                "class A { m() { return \"method\"; } }\n\
                 var a = A();\n\
                 a.m = \"field\";\n\
                 print a.m;"
            ),
            "field\n"
        );
    }

    #[test]
    fn test_bound_method_remembers_receiver() {
        assert_eq!(
            output(
                "class Person { init(name) { this.name = name; } hi() { print this.name; } }\n\
                 var hi = Person(\"Jane\").hi;\n\
                 hi();"
            ),
            "Jane\n"
        );
    }

    #[test]
    fn test_initializer_returns_this() {
        assert_eq!(
            output(
                "class Foo { init() { this.n = 1; return; } }\n\
                 var foo = Foo();\n\
                 print foo.init() == foo;\n\
                 print foo.n;"
            ),
            "true\n1\n"
        );
    }

    #[test]
    fn test_class_arity_comes_from_init() {
        let (_, message) = runtime_error("class P { init(a, b) {} } P(1);");
        assert_eq!(message, "Not enough arguments.");

        assert_eq!(output("class Q {} print Q();"), "Q instance\n");
    }

    #[test]
    fn test_inheritance_and_super() {
        assert_eq!(
            output(
                "class A { greet() { return \"A\"; } }\n\
                 class B < A { greet() { return super.greet() + \"B\"; } }\n\
                 print B().greet();"
            ),
            "AB\n"
        );
    }

    #[test]
    fn test_inherited_methods_and_initializer() {
        assert_eq!(
            output(
                "class Base { init(v) { this.v = v; } get() { return this.v; } }\n\
                 class Derived < Base { twice() { return this.get() * 2; } }\n\
                 print Derived(21).twice();"
            ),
            "42\n"
        );
    }

    #[test]
    fn test_super_binds_to_the_defining_class() {
        // C's `super` is B even when called on an instance of a subclass of C.
        assert_eq!(
            output(
                "class A { name() { return \"A\"; } }\n\
                 class B < A { name() { return \"B\" + super.name(); } }\n\
                 class C < B { name() { return \"C\" + super.name(); } }\n\
                 class D < C {}\n\
                 print D().name();"
            ),
            "CBA\n"
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let (_, message) = runtime_error("var NotAClass = 1; class Sub < NotAClass {}");
        assert_eq!(message, "Superclass must be a class.");
    }

    #[test]
    fn test_property_errors() {
        let (_, message) = runtime_error("class A {} print A().missing;");
        assert_eq!(message, "Undefined property 'missing'.");

        let (_, message) = runtime_error("var n = 1; print n.field;");
        assert_eq!(message, "Only instances have properties.");

        let (_, message) = runtime_error("var n = 1; n.field = 2;");
        assert_eq!(message, "Only instances have fields.");
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let (out, diagnostics) = run("print \"before\";\nvar a = 1; { var a = a; }");

        assert!(diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());
        assert_eq!(out, "");
    }

    #[test]
    fn test_two_syntax_errors_abort_before_running() {
        let (out, diagnostics) = run("print 1;\nprint ;\nvar = 2;");

        assert!(diagnostics.had_error());
        assert_eq!(diagnostics.errors().len(), 2);
        assert_eq!(out, "");
    }

    #[test]
    fn test_definitions_persist_across_interpret_calls() {
        let first_source = "fun add(a, b) { return a + b; } var base = 40;";
        let second_source = "{ var two = 2; print add(base, two); }";

        let mut diagnostics = Diagnostics::new();
        let first_tokens = rox::scan(first_source, &mut diagnostics);
        let second_tokens = rox::scan(second_source, &mut diagnostics);

        let out = SharedBuf::default();
        let mut interpreter = Interpreter::with_output(out.clone());

        let first = rox::parse(&first_tokens, &mut diagnostics);
        let locals = rox::resolve(&first, &mut diagnostics);
        rox::interpret(&mut interpreter, &first, locals, &mut diagnostics);

        let second = rox::parse(&second_tokens, &mut diagnostics);
        let locals = rox::resolve(&second, &mut diagnostics);
        rox::interpret(&mut interpreter, &second, locals, &mut diagnostics);

        assert!(diagnostics.errors().is_empty());
        assert_eq!(out.contents(), "42\n");
    }

    #[test]
    fn test_diagnostics_reset_between_runs() {
        let (_, mut diagnostics) = run("print undefined;");

        assert!(diagnostics.had_runtime_error());

        diagnostics.reset();

        assert!(!diagnostics.had_runtime_error());
        assert!(!diagnostics.had_error());
        assert!(diagnostics.errors().is_empty());
    }
}
