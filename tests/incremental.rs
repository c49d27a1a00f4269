//! Incremental solving: re-solves, assumptions and conditional scopes

use pbsolver_rs::engine::{EngineCall, MockEngine};
use pbsolver_rs::{PbError, Solver};

fn chain() -> Solver {
    let mut solver = Solver::new();
    solver.implies("a", "b").unwrap();
    solver.implies("b", "c").unwrap();
    solver.at_least_one(&["a", "d"]).unwrap();
    solver
}

#[test]
fn test_resolve_is_stable() {
    let mut solver = chain();
    let first = solver.solve().unwrap();
    let second = solver.solve().unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_new_clause_over_true_variable_changes_solution() {
    let mut solver = chain();
    let first = solver.solve().unwrap().expect("satisfiable");
    let victim = first.iter().next().expect("some variable is true").to_string();

    solver.is_false(&victim).unwrap();
    if let Some(second) = solver.solve().unwrap() {
        assert!(!second.contains(&victim));
    }
}

#[test]
fn test_clauses_after_solve_accumulate() {
    let mut solver = chain();
    solver.solve().unwrap();
    solver.is_false("c").unwrap();
    let solution = solver.solve().unwrap().expect("d carries the disjunction");
    assert_eq!(solution.names(), &["d"]);

    solver.is_false("d").unwrap();
    assert_eq!(solver.solve().unwrap(), None);
}

#[test]
fn test_new_names_after_solve_are_rejected() {
    let mut solver = chain();
    solver.solve().unwrap();
    assert!(matches!(solver.is_true("e"), Err(PbError::Usage(_))));
    assert!(matches!(solver.gen_var(), Err(PbError::Usage(_))));
    // Known names still work.
    solver.is_true("a").unwrap();
}

#[test]
fn test_failed_provisional_constraint_stays_inert() {
    let mut solver = chain();
    solver.is_true("a").unwrap();
    solver.solve().unwrap().expect("satisfiable");

    assert_eq!(
        solver
            .solve_with_constraint(&["b", "c"], 1i64, "<", 2)
            .unwrap(),
        None
    );
    let solution = solver.solve().unwrap().expect("constraint was provisional");
    assert!(solution.contains("b") && solution.contains("c"));
}

#[test]
fn test_scopes_are_independent() {
    let mut solver = chain();
    solver.solve().unwrap();
    let no_a = solver.conditionally(|s| s.is_false("a")).unwrap();
    let no_d = solver.conditionally(|s| s.is_false("d")).unwrap();

    let solution = solver.solve_under(no_a).unwrap().expect("d is free");
    assert!(solution.contains("d"));
    let solution = solver.solve_under(no_d).unwrap().expect("a is free");
    assert_eq!(solution.names(), &["a", "b", "c"]);
}

#[test]
fn test_engine_call_sequence() {
    let mut solver = Solver::with_engine(MockEngine::new());
    solver.is_true("a").unwrap();
    solver.solve().unwrap();
    solver.solve_assuming("a").unwrap();
    solver
        .solve_with_constraint(&["a"], 1i64, "<=", 1)
        .unwrap();

    let calls = solver.engine().calls();
    assert!(matches!(calls[0], EngineCall::NewVar(_)));
    assert!(matches!(calls[1], EngineCall::Clause { guard: None, .. }));
    assert_eq!(calls[2], EngineCall::Solve);
    assert!(matches!(calls[3], EngineCall::SolveAgain(Some(_))));
    let EngineCall::EnterConditional(guard) = calls[4] else {
        panic!("expected a conditional scope, got {:?}", calls[4]);
    };
    assert!(matches!(
        calls[5],
        EngineCall::Constraint { guard: Some(g), .. } if g == guard
    ));
    assert_eq!(calls[6], EngineCall::ExitConditional);
    assert_eq!(calls[7], EngineCall::SolveAgain(Some(guard)));
    assert_eq!(solver.statistics().num_solves(), 3);
}

#[test]
fn test_invalid_input_never_reaches_engine() {
    let mut solver = Solver::with_engine(MockEngine::new());
    assert!(matches!(solver.add_clause(&["ok", "bad\nname"], &[]), Err(PbError::Validation(_))));
    assert!(matches!(solver.add_clause(&["`01"], &[]), Err(PbError::Validation(_))));
    assert!(matches!(
        solver.add_constraint(&["a", "b"], vec![1i64], "<=", 1),
        Err(PbError::Validation(_))
    ));
    assert!(matches!(
        solver.add_constraint(&["a"], -1i64, "<=", 1),
        Err(PbError::Validation(_))
    ));
    assert!(matches!(
        solver.add_constraint(&["a"], 1i64, "<=", -1),
        Err(PbError::Validation(_))
    ));
    assert!(matches!(
        solver.add_constraint(&["a"], 1i64, "!=", 1),
        Err(PbError::Validation(_))
    ));
    assert!(solver.engine().calls().is_empty());
    assert_eq!(solver.statistics().num_variables(), 0);
}
