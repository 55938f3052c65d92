// arturo-embed - Embedding API tests
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

use arturo_embed::{Engine, FromArturoVal, IntoArturoVal};
use arturo_parser::ArturoVal;

#[test]
fn test_eval_returns_last_value() {
    let mut engine = Engine::new();
    assert_eq!(engine.eval("add 40 2").unwrap(), ArturoVal::Integer(42));
    assert_eq!(engine.eval("x: 1").unwrap(), ArturoVal::Null);
}

#[test]
fn test_state_persists_between_evals() {
    let mut engine = Engine::new();
    engine.eval("counter: 10").unwrap();
    assert_eq!(engine.eval("counter + 5").unwrap(), ArturoVal::Integer(15));
}

#[test]
fn test_host_values_cross_the_boundary() {
    let mut engine = Engine::new();
    engine.set("nums", vec![1i64, 2, 3]);
    let result = engine.eval("size nums").unwrap();
    assert_eq!(i64::from_arturo(&result), Some(3));

    engine.set("greeting", "hello");
    let result = engine.eval("upper greeting").unwrap();
    assert_eq!(String::from_arturo(&result), Some("HELLO".to_string()));
}

#[test]
fn test_into_arturo_conversions() {
    assert_eq!(42i64.into_arturo(), ArturoVal::Integer(42));
    assert_eq!(true.into_arturo(), ArturoVal::Logical(true));
    assert_eq!("x".into_arturo(), ArturoVal::string("x"));
}

#[test]
fn test_captured_output() {
    let mut engine = Engine::new();
    let buffer = engine.capture_output();
    engine.eval("print \"captured\"").unwrap();
    assert_eq!(buffer.borrow().as_str(), "captured\n");
}

#[test]
fn test_errors_surface() {
    let mut engine = Engine::new();
    assert!(engine.eval("to :integer \"nope\"").is_err());
    assert!(engine.eval("print [unclosed").is_err());
}

#[test]
fn test_seeded_random_is_deterministic() {
    let run = |seed: u64| {
        let mut engine = Engine::new();
        engine.seed_random(seed);
        engine.eval("map 1..10 'x [random 1 1000]").unwrap().to_string()
    };
    assert_eq!(run(7), run(7));
    assert_ne!(run(7), run(8));
}
