// ABOUTME: End-to-end tests running whole programs through lex -> parse -> resolve -> interpret

use lox_rs::interpreter::Interpreter;
use std::cell::RefCell;
use std::rc::Rc;

/// Runs `source` to completion and returns everything it printed plus the
/// compile/runtime outcome, mirroring how `main.rs` drives one script.
fn run(source: &str) -> (String, lox_rs::RunOutcome) {
    let output = Rc::new(RefCell::new(Vec::new()));
    let mut interpreter = Interpreter::with_output(output.clone());
    let outcome = lox_rs::run(source, &mut interpreter);
    let printed = String::from_utf8(output.borrow().clone()).expect("printed output is valid utf-8");
    (printed, outcome)
}

fn run_ok(source: &str) -> String {
    let (printed, outcome) = run(source);
    assert!(!outcome.had_compile_error, "unexpected compile error for: {source}");
    assert!(outcome.runtime_error.is_none(), "unexpected runtime error for: {source}");
    printed
}

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(run_ok("print 1 + 2 * 3;"), "7\n");
}

#[test]
fn closures_capture_by_reference() {
    let source = r#"
        var a = 1;
        fun f() { print a; }
        a = 2;
        f();
    "#;
    assert_eq!(run_ok(source), "2\n");
}

#[test]
fn static_resolution_wins_over_later_shadowing() {
    let source = r#"
        var a = "global";
        {
            fun show() { print a; }
            show();
            var a = "local";
            show();
        }
    "#;
    assert_eq!(run_ok(source), "global\nglobal\n");
}

#[test]
fn single_inheritance_and_super_dispatch() {
    let source = r#"
        class A { greet() { print "A"; } }
        class B < A {
            greet() { super.greet(); print "B"; }
        }
        B().greet();
    "#;
    assert_eq!(run_ok(source), "A\nB\n");
}

#[test]
fn initializer_returns_instance_even_on_bare_return() {
    let source = r#"
        class C { init() { return; } }
        print C().init();
    "#;
    assert_eq!(run_ok(source), "C instance\n");
}

#[test]
fn adding_string_and_number_is_a_runtime_error_with_line_marker() {
    let (printed, outcome) = run(r#"print "a" + 1;"#);
    assert_eq!(printed, "");
    let err = outcome.runtime_error.expect("expected a runtime error");
    assert_eq!(err.message, "Operands must both be either strings or numbers");
    assert_eq!(err.token.line, 1);
}

#[test]
fn logical_operators_preserve_operand_type_and_short_circuit() {
    assert_eq!(run_ok(r#"print nil or "default";"#), "default\n");
    assert_eq!(run_ok(r#"print 1 and 2;"#), "2\n");
    assert_eq!(run_ok(r#"print false and 2;"#), "false\n");
}

#[test]
fn equality_rules_match_spec() {
    assert_eq!(run_ok("print -0 == 0;"), "true\n");
    assert_eq!(run_ok("print nil == nil;"), "true\n");
    assert_eq!(run_ok("print nil == 0;"), "false\n");
    assert_eq!(run_ok(r#"print "abc" == "abc";"#), "true\n");
}

#[test]
fn calling_init_directly_returns_the_instance_not_nil() {
    let source = r#"
        class Box { init(v) { this.v = v; } }
        var b = Box(1);
        print b.init(2);
        print b.v;
    "#;
    assert_eq!(run_ok(source), "Box instance\n2\n");
}

#[test]
fn for_loop_desugars_and_supports_missing_clauses() {
    let source = r#"
        var total = 0;
        for (var i = 0; i < 5; i = i + 1) {
            total = total + i;
        }
        print total;
    "#;
    assert_eq!(run_ok(source), "10\n");
}

#[test]
fn whole_valued_numbers_print_without_trailing_fraction() {
    assert_eq!(run_ok("print 7.0;"), "7\n");
    assert_eq!(run_ok("print 7.5;"), "7.5\n");
}

#[test]
fn native_clock_is_available() {
    assert_eq!(run_ok("print clock() >= 0;"), "true\n");
}

#[test]
fn fields_set_on_an_instance_shadow_methods_of_the_same_name() {
    let source = r#"
        class Thing {
            greet() { print "method"; }
        }
        var t = Thing();
        t.greet = "field";
        print t.greet;
    "#;
    assert_eq!(run_ok(source), "field\n");
}

#[test]
fn undefined_variable_is_a_runtime_error() {
    let (_, outcome) = run("print nope;");
    let err = outcome.runtime_error.expect("expected a runtime error");
    assert_eq!(err.message, "Undefined Variable 'nope'.");
}

#[test]
fn self_inheritance_is_a_compile_time_error() {
    let (printed, outcome) = run("class A < A {}");
    assert!(outcome.had_compile_error);
    assert!(outcome.runtime_error.is_none());
    assert_eq!(printed, "");
}

#[test]
fn top_level_return_is_a_compile_time_error() {
    let (_, outcome) = run("return 1;");
    assert!(outcome.had_compile_error);
}

#[test]
fn recursive_functions_work_via_global_lookup() {
    let source = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
    "#;
    assert_eq!(run_ok(source), "55\n");
}

#[test]
fn multi_level_inheritance_resolves_methods_up_the_chain() {
    let source = r#"
        class A { a() { print "a"; } }
        class B < A {}
        class C < B {}
        C().a();
    "#;
    assert_eq!(run_ok(source), "a\n");
}
