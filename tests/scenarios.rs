//! End-to-end tests driving the whole pipeline: scan, parse, resolve, interpret.

use rfinch::{
    interpreter::{Interpreter, RuntimeError},
    parser::Parser,
    resolver::{ResolveError, Resolver},
    scanner::Scanner,
};
use std::{cell::RefCell, io::Write, rc::Rc};

/// Run the given source and return everything it printed, panicking on any error.
fn run(source: &str) -> String {
    let (output, result) = try_run(source);
    result.unwrap_or_else(|error| panic!("Runtime error in test program: {error:?}"));
    output
}

/// Run the given source and return everything it printed along with the runtime result.
///
/// Panics if the program has static errors; use [`resolve_errors`] to test those.
fn try_run(source: &str) -> (String, Result<(), RuntimeError>) {
    let tokens = Scanner::scan_tokens(source);
    let stmts = Parser::parse(tokens);
    let (locals, errors) = Resolver::resolve(&stmts);
    assert!(errors.is_empty(), "Static errors in test program: {errors:?}");

    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    let sink: Rc<RefCell<dyn Write>> = buffer.clone();
    let mut interpreter = Interpreter::with_output(sink);
    let result = interpreter.interpret(&stmts, locals);

    let output = String::from_utf8(buffer.borrow().clone()).unwrap();
    (output, result)
}

/// Run the given source and expect a runtime error, returning its message.
fn run_error(source: &str) -> String {
    let (_, result) = try_run(source);
    result.expect_err("Expected a runtime error").message
}

/// Resolve the given source and return the static errors.
fn resolve_errors(source: &str) -> Vec<ResolveError> {
    let stmts = Parser::parse(Scanner::scan_tokens(source));
    Resolver::resolve(&stmts).1
}

#[test]
fn recursion() {
    let output = run("
        var cache = [];
        for (var i = 0; i < 6; i = i + 1) { cache = cache + [-1]; }
        fun fib(n){ if (n==1 or n==2) return 1; return fib(n-1)+fib(n-2); }
        print fib(5);
    ");
    assert_eq!(output, "5\n");
}

#[test]
fn closures_capture_variables_not_values() {
    let output = run("
        fun make(){ var i = 0; fun inc(){ i = i + 1; return i; } return inc; }
        var c = make(); print c(); print c(); print c();
    ");
    assert_eq!(output, "1\n2\n3\n");
}

#[test]
fn for_loop_with_break_and_continue() {
    let output = run("
        for (var i = 0; i < 5; i = i + 1) {
          if (i == 1) continue;
          if (i == 4) break;
          print i;
        }
    ");
    assert_eq!(output, "0\n2\n3\n");
}

#[test]
fn higher_order_natives_with_lambdas() {
    let output = run("
        var xs = [1,2,3,4,5];
        print reduce(lambda(a,b)=>{return a+b;},
               filter(lambda(x)=>{return x>4;},
                map(lambda(x)=>{return x*2;}, xs)));
    ");
    assert_eq!(output, "24\n");
}

#[test]
fn dictionary_with_heterogeneous_keys() {
    let output = run("
        var a = 2;
        var d = { a:4, str(a):5, \"a\":6 };
        print d[a]; print d[str(a)]; print d[\"a\"];
    ");
    assert_eq!(output, "4\n5\n6\n");
}

#[test]
fn self_reference_in_initializer_is_a_static_error() {
    let errors = resolve_errors("var a = 1; { var a = a + 1; }");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("its own initializer"));
}

#[test]
fn blocks_shadow_and_restore() {
    let output = run("
        var a = 1;
        { var a = 2; print a; }
        print a;
    ");
    assert_eq!(output, "2\n1\n");
}

#[test]
fn blocks_restore_the_environment_through_unwinds() {
    // the return unwinds out of two nested blocks; the globals must be intact afterwards
    let output = run("
        var a = \"global\";
        fun f() { { var a = \"inner\"; { return a; } } }
        print f();
        print a;
        print f();
    ");
    assert_eq!(output, "inner\nglobal\ninner\n");
}

#[test]
fn closures_from_loop_iterations_share_the_iteration_scope() {
    let output = run("
        var fs = [];
        for (var i = 0; i < 2; i = i + 1) {
          var j = i * 10;
          fs = fs + [lambda() => { j = j + 1; return j; }];
        }
        print fs[0](); print fs[0](); print fs[1]();
    ");
    assert_eq!(output, "1\n2\n11\n");
}

#[test]
fn arrays_are_shared_by_reference() {
    let output = run("
        var a = [1, 2];
        var b = a;
        b[0] = 99;
        print a[0];
        a[1] = a[1] + 1;
        print b[1];
    ");
    assert_eq!(output, "99\n3\n");
}

#[test]
fn array_concatenation_builds_a_fresh_array() {
    let output = run("
        var a = [1];
        var b = [2, 3];
        var c = a + b;
        c[0] = 5;
        print a[0];
        print len(c);
        print c[2];
    ");
    assert_eq!(output, "1\n3\n3\n");
}

#[test]
fn string_concatenation_is_not_commutative() {
    let output = run("print \"ab\" + \"cd\"; print \"cd\" + \"ab\";");
    assert_eq!(output, "abcd\ncdab\n");
}

#[test]
fn logical_operators_normalize_to_booleans_and_short_circuit() {
    let output = run("
        print 1 and 2;
        print nil and 1;
        print 0 or false;
        print nil or nil;
        print false or false or true;
        var called = 0;
        fun touch() { called = called + 1; return true; }
        var ignored = false and touch();
        var also_ignored = true or touch();
        print called;
    ");
    assert_eq!(output, "true\nfalse\ntrue\nfalse\ntrue\n0\n");
}

#[test]
fn while_loops_with_break_and_continue() {
    let output = run("
        var i = 0;
        while (true) { i = i + 1; if (i == 3) break; }
        print i;

        var total = 0;
        var n = 0;
        while (n < 5) {
          n = n + 1;
          if (n == 2) continue;
          total = total + n;
        }
        print total;
    ");
    assert_eq!(output, "3\n13\n");
}

#[test]
fn dictionary_subscript_assignment_inserts_and_updates() {
    let output = run("
        var d = {};
        d[\"k\"] = 1;
        d[\"k\"] = 2;
        d[3] = \"three\";
        print d[\"k\"];
        print d[3];
        print d[3.0];
    ");
    assert_eq!(output, "2\nthree\nthree\n");
}

#[test]
fn reduce_edge_cases() {
    let output = run("
        fun add(a, b) { return a + b; }
        print reduce(add, []);
        print reduce(add, [7]);
        print reduce(add, [1, 2, 3]);
    ");
    assert_eq!(output, "nil\n7\n6\n");
}

#[test]
fn str_native_stringifies() {
    let output = run("print str(3) + \"x\"; print str(nil); print str(true);");
    assert_eq!(output, "3x\nnil\ntrue\n");
}

#[test]
fn truthiness_follows_nil_and_false_only() {
    let output = run("
        if (0) print \"zero\";
        if (\"\") print \"empty\";
        if ([]) print \"array\";
        if (nil) print \"nil\"; else print \"not nil\";
        if (false) print \"false\"; else print \"not false\";
    ");
    assert_eq!(output, "zero\nempty\narray\nnot nil\nnot false\n");
}

#[test]
fn numbers_print_without_integral_fraction() {
    let output = run("print 3.0; print 2.5; print 10 / 4; print 1 / 3;");
    assert_eq!(output, "3\n2.5\n2.5\n0.3333333333333333\n");
}

#[test]
fn global_functions_see_later_globals() {
    let output = run("
        fun show() { print value; }
        var value = 42;
        show();
    ");
    assert_eq!(output, "42\n");
}

#[test]
fn undefined_variable_is_a_runtime_error() {
    assert_eq!(run_error("print missing;"), "Undefined variable 'missing'.");
    assert_eq!(run_error("missing = 1;"), "Undefined variable 'missing'.");
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
    assert_eq!(run_error("var x = 1; x();"), "Can only call functions.");
}

#[test]
fn arity_mismatch_is_a_runtime_error() {
    assert_eq!(
        run_error("fun f(a) { return a; } f(1, 2);"),
        "Expected 1 arguments but got 2."
    );
}

#[test]
fn equality_requires_numbers() {
    assert_eq!(
        run_error("print \"a\" == \"a\";"),
        "Unsupported operation '==' between types 'string' and 'string'."
    );
    let output = run("print 1 == 1.0; print 1 != 2;");
    assert_eq!(output, "true\ntrue\n");
}

#[test]
fn arithmetic_type_errors() {
    assert_eq!(
        run_error("print 1 + \"a\";"),
        "Unsupported operation '+' between types 'number' and 'string'."
    );
    assert_eq!(
        run_error("print -\"a\";"),
        "Unsupported operation '-' on type 'string'."
    );
}

#[test]
fn subscript_errors() {
    assert_eq!(
        run_error("var xs = [1]; print xs[1];"),
        "Array index out of bounds."
    );
    assert_eq!(
        run_error("var xs = [1]; xs[0 - 1] = 2;"),
        "Array index out of bounds."
    );
    assert_eq!(
        run_error("var xs = [1]; print xs[0.5];"),
        "Can only use subscript operator [] with integers."
    );
    assert_eq!(
        run_error("var xs = [1]; print xs[\"0\"];"),
        "Can only use subscript operator [] with integers."
    );
    assert_eq!(
        run_error("var d = {}; print d[\"missing\"];"),
        "Dictionary does not contain given key."
    );
    assert_eq!(
        run_error("print 5[0];"),
        "Can only use subscript operator [] on arrays or dictionaries, not 'number'."
    );
}

#[test]
fn assignment_evaluates_to_the_assigned_value() {
    let output = run("
        var a = 1;
        var b = a = 7;
        print b;
        var xs = [0];
        print xs[0] = 9;
    ");
    assert_eq!(output, "7\n9\n");
}

#[test]
fn division_follows_ieee_754() {
    let output = run("print 1 / 0; print 0 / 0;");
    assert_eq!(output, "inf\nNaN\n");
}

#[test]
fn lambdas_close_over_their_declaration_environment() {
    let output = run("
        var offset = 100;
        fun make(base) { return lambda(x) => { return base + x + offset; }; }
        var f = make(10);
        print f(1);
        offset = 200;
        print f(1);
    ");
    assert_eq!(output, "111\n211\n");
}

#[test]
fn function_values_print_reasonably() {
    let output = run("
        fun f() { return nil; }
        print f;
        print str;
        print lambda() => { return nil; };
    ");
    assert_eq!(output, "<fn f>\n<native fn str>\n<lambda>\n");
}

#[test]
fn map_rejects_wrong_arity_functions() {
    assert_eq!(
        run_error("map(lambda(a, b) => { return a; }, [1]);"),
        "Map function must take exactly one argument."
    );
    assert_eq!(
        run_error("map(1, [1]);"),
        "First argument to map must be a function."
    );
    assert_eq!(
        run_error("map(lambda(a) => { return a; }, 5);"),
        "Second argument to map must be an array."
    );
    assert_eq!(
        run_error("len(5);"),
        "First argument to len must be an array."
    );
}

#[test]
fn dictionary_keys_must_be_hashable() {
    assert_eq!(
        run_error("var d = { [1]: 2 };"),
        "Can only use nil, booleans, numbers, and strings as dictionary keys, not 'array'."
    );
}

#[test]
fn later_duplicate_keys_overwrite_earlier_ones() {
    let output = run("var d = { \"k\": 1, \"k\": 2 }; print d[\"k\"];");
    assert_eq!(output, "2\n");
}

#[test]
fn nested_loops_break_the_innermost_loop_only() {
    let output = run("
        for (var i = 0; i < 2; i = i + 1) {
          for (var j = 0; j < 5; j = j + 1) {
            if (j == 1) break;
            print str(i) + \",\" + str(j);
          }
        }
    ");
    assert_eq!(output, "0,0\n1,0\n");
}

#[test]
fn return_unwinds_nested_loops_inside_a_function() {
    let output = run("
        fun find(xs, wanted) {
          for (var i = 0; i < len(xs); i = i + 1) {
            if (xs[i] == wanted) return i;
          }
          return 0 - 1;
        }
        print find([4, 5, 6], 5);
        print find([4, 5, 6], 9);
    ");
    assert_eq!(output, "1\n-1\n");
}

#[test]
fn static_errors_accumulate_and_do_not_stop_resolution() {
    let errors = resolve_errors("return 1; break; { var a = 1; var a = 2; }");
    assert_eq!(errors.len(), 3);
}

#[test]
fn global_bindings_persist_across_interpret_calls() {
    // one interpreter, two separate runs, like two REPL lines
    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    let sink: Rc<RefCell<dyn Write>> = buffer.clone();
    let mut interpreter = Interpreter::with_output(sink);

    for source in ["var a = 1; fun bump() { a = a + 1; return a; }", "print bump(); print bump();"] {
        let stmts = Parser::parse(Scanner::scan_tokens(source));
        let (locals, errors) = Resolver::resolve(&stmts);
        assert!(errors.is_empty(), "{errors:?}");
        interpreter.interpret(&stmts, locals).unwrap();
    }

    assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "2\n3\n");
}
