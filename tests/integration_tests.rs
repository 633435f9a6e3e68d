use builder_synth::materialize::collect;
use builder_synth::{
    synthesize, Arguments, BuildError, BuilderModel, CollectionFamily, DefaultExpr, ElementOrder,
    ParameterSpec, Representation, Scalar, ScalarType, Schema, Shape, SynthConfig, SynthesisError,
    TypeKind, Value,
};
use proptest::prelude::*;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, PartialEq)]
struct Student {
    name: String,
    age: i64,
    lessons: Vec<String>,
    teacher: String,
}

#[derive(Error, Debug, PartialEq)]
enum StudentError {
    #[error("missing argument {0}")]
    Missing(&'static str),
    #[error("a student needs a name")]
    Unnamed,
}

fn text(arguments: &Arguments, name: &'static str) -> Result<String, StudentError> {
    arguments
        .get(name)
        .and_then(Value::as_text)
        .map(str::to_string)
        .ok_or(StudentError::Missing(name))
}

fn new_student(arguments: Arguments) -> Result<Student, StudentError> {
    let name = text(&arguments, "name")?;
    if name.is_empty() {
        return Err(StudentError::Unnamed);
    }
    let lessons = arguments
        .get("lessons")
        .and_then(Value::as_collection)
        .ok_or(StudentError::Missing("lessons"))?
        .iter()
        .filter_map(|s| s.as_text().map(str::to_string))
        .collect();
    Ok(Student {
        name,
        age: arguments.get("age").and_then(Value::as_int).unwrap_or_default(),
        lessons,
        teacher: text(&arguments, "teacher")?,
    })
}

fn echo(arguments: Arguments) -> Result<Arguments, Infallible> {
    Ok(arguments)
}

fn student_schema(lessons: TypeKind) -> Schema {
    Schema::constructor("Student")
        .with_parameter(ParameterSpec::scalar("name", ScalarType::Text))
        .with_parameter(ParameterSpec::scalar("age", ScalarType::Int))
        .with_parameter(ParameterSpec::new("lessons", lessons).singular())
        .with_parameter(
            ParameterSpec::scalar("teacher", ScalarType::Text)
                .with_default(DefaultExpr::literal("Mrs. White")),
        )
}

fn student_model() -> BuilderModel {
    synthesize(&student_schema(TypeKind::list(ScalarType::Text)), &SynthConfig::default()).unwrap()
}

#[test]
fn test_build_typed_product() {
    let model = student_model();
    let mut builder = model.builder(new_student);
    builder
        .set("name", "alice")
        .unwrap()
        .set("age", 14)
        .unwrap()
        .add("lesson", "math")
        .unwrap()
        .add_all("lessons", ["art", "gym"])
        .unwrap();

    let student = builder.build().unwrap();
    assert_eq!(
        student,
        Student {
            name: "alice".into(),
            age: 14,
            lessons: vec!["math".into(), "art".into(), "gym".into()],
            teacher: "Mrs. White".into(),
        }
    );
}

#[test]
fn test_lessons_set_end_to_end() {
    let model = synthesize(
        &student_schema(TypeKind::set(ScalarType::Text)),
        &SynthConfig::default(),
    )
    .unwrap();
    let mut builder = model.builder(echo);
    builder
        .add("lesson", "math")
        .unwrap()
        .add("lesson", "art")
        .unwrap()
        .add_all("lessons", ["gym"])
        .unwrap();

    let arguments = builder.build().unwrap();
    let lessons = arguments.get("lessons").and_then(Value::as_collection).unwrap();
    let expected = collect(
        &Shape::Set,
        CollectionFamily::Frozen,
        ["math", "art", "gym"].map(Scalar::from),
    );
    assert_eq!(lessons, &expected);
    assert_eq!(lessons.len(), 3);
    assert!(matches!(
        lessons.representation(),
        Representation::General { .. }
    ));
}

#[test]
fn test_teacher_default_end_to_end() {
    let model = student_model();

    let mut builder = model.builder(new_student);
    builder.set("name", "bob").unwrap();
    assert_eq!(builder.build().unwrap().teacher, "Mrs. White");

    builder.set("teacher", "").unwrap();
    assert_eq!(builder.build().unwrap().teacher, "");
}

#[test]
fn test_direct_only_builder_passes_zero_values() {
    let schema = Schema::constructor("Point")
        .with_parameter(ParameterSpec::scalar("x", ScalarType::Int))
        .with_parameter(ParameterSpec::scalar("label", ScalarType::Text))
        .with_parameter(ParameterSpec::scalar("visible", ScalarType::Bool))
        .with_parameter(ParameterSpec::new("tags", TypeKind::set(ScalarType::Text)));
    let model = synthesize(&schema, &SynthConfig::default()).unwrap();

    let arguments = model.builder(echo).build().unwrap();
    assert_eq!(arguments.get("x"), Some(&Value::from(0)));
    assert_eq!(arguments.get("label"), Some(&Value::from("")));
    assert_eq!(arguments.get("visible"), Some(&Value::from(false)));
    let tags = arguments.get("tags").and_then(Value::as_collection).unwrap();
    assert!(tags.is_empty());
    assert_eq!(tags.representation(), Representation::Empty);
}

#[test]
fn test_untouched_singular_is_canonical_empty() {
    let model = student_model();
    let builder = model.builder(echo);
    let arguments = builder.build().unwrap();
    let lessons = arguments.get("lessons").and_then(Value::as_collection).unwrap();
    assert_eq!(lessons.representation(), Representation::Empty);
    assert!(!builder.is_allocated("lessons"));
}

#[test]
fn test_clear_semantics() {
    let model = student_model();
    let mut builder = model.builder(echo);
    builder
        .add("lesson", "math")
        .unwrap()
        .clear("clear_lessons")
        .unwrap()
        .add("lesson", "art")
        .unwrap();

    let arguments = builder.build().unwrap();
    let lessons = arguments.get("lessons").and_then(Value::as_collection).unwrap();
    assert_eq!(lessons.len(), 1);
    assert!(lessons.contains(&Scalar::from("art")));
    assert!(!lessons.contains(&Scalar::from("math")));

    builder.clear("clear_lessons").unwrap();
    let arguments = builder.build().unwrap();
    assert!(arguments
        .get("lessons")
        .and_then(Value::as_collection)
        .unwrap()
        .is_empty());
}

#[test]
fn test_clearing_defaulted_collection_beats_default() {
    let schema = Schema::constructor("Course").with_parameter(
        ParameterSpec::new("tags", TypeKind::list(ScalarType::Text))
            .singular()
            .with_default(DefaultExpr::computed(|| {
                Value::from(collect(
                    &Shape::List,
                    CollectionFamily::Frozen,
                    [Scalar::from("core")],
                ))
            })),
    );
    let model = synthesize(&schema, &SynthConfig::default()).unwrap();

    let mut builder = model.builder(echo);
    let untouched = builder.build().unwrap();
    assert_eq!(
        untouched.get("tags").and_then(Value::as_collection).map(|c| c.len()),
        Some(1)
    );

    builder.clear("clear_tags").unwrap();
    let cleared = builder.build().unwrap();
    assert_eq!(
        cleared.get("tags").and_then(Value::as_collection).map(|c| c.len()),
        Some(0)
    );
}

#[test]
fn test_computed_default_evaluated_once_per_build() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let schema = Schema::constructor("Ticket").with_parameter(
        ParameterSpec::scalar("serial", ScalarType::Int).with_default(DefaultExpr::computed(
            move || Value::from(counter.fetch_add(1, Ordering::SeqCst) as i64 + 100),
        )),
    );
    let model = synthesize(&schema, &SynthConfig::default()).unwrap();
    let mut builder = model.builder(echo);

    assert_eq!(builder.build().unwrap().get("serial"), Some(&Value::from(100)));
    assert_eq!(builder.build().unwrap().get("serial"), Some(&Value::from(101)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    builder.set("serial", 7).unwrap();
    assert_eq!(builder.build().unwrap().get("serial"), Some(&Value::from(7)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_construction_failure_passes_through() {
    let model = student_model();
    let mut builder = model.builder(new_student);

    match builder.build() {
        Err(BuildError::Construction(err)) => assert_eq!(err, StudentError::Unnamed),
        other => panic!("expected construction error, got {:?}", other),
    }

    builder.set("name", "carol").unwrap();
    assert_eq!(builder.build().unwrap().name, "carol");
}

#[test]
fn test_products_are_snapshots() {
    let model = student_model();
    let mut builder = model.builder(echo);
    builder.add("lesson", "math").unwrap();
    let before = builder.build().unwrap();

    builder.add("lesson", "art").unwrap().add("lesson", "gym").unwrap();
    let after = builder.build().unwrap();

    let size = |a: &Arguments| a.get("lessons").and_then(Value::as_collection).map(|c| c.len());
    assert_eq!(size(&before), Some(1));
    assert_eq!(size(&after), Some(3));
}

#[test]
fn test_persistent_family_end_to_end() {
    let config = SynthConfig::default().with_family(CollectionFamily::Persistent);
    let model = synthesize(&student_schema(TypeKind::set(ScalarType::Text)), &config).unwrap();
    let mut builder = model.builder(echo);
    builder.add_all("lessons", ["math", "art", "math"]).unwrap();

    let arguments = builder.build().unwrap();
    let lessons = arguments.get("lessons").and_then(Value::as_collection).unwrap();
    assert_eq!(lessons.family(), CollectionFamily::Persistent);
    assert_eq!(lessons.representation(), Representation::Persistent);
    assert_eq!(lessons.len(), 2);
}

#[test]
fn test_sorted_set_reverse_order() {
    let schema = Schema::constructor("Leaderboard").with_parameter(
        ParameterSpec::new("scores", TypeKind::sorted_set(ScalarType::Int, ElementOrder::Reverse))
            .singular(),
    );
    let model = synthesize(&schema, &SynthConfig::default()).unwrap();
    let mut builder = model.builder(echo);
    builder.add_all("scores", [3, 9, 1, 9]).unwrap();

    let arguments = builder.build().unwrap();
    let scores: Vec<i64> = arguments
        .get("scores")
        .and_then(Value::as_collection)
        .unwrap()
        .iter()
        .filter_map(Scalar::as_int)
        .collect();
    assert_eq!(scores, vec![9, 3, 1]);
}

#[test]
fn test_collision_names_the_method() {
    let schema = Schema::constructor("Archive")
        .with_parameter(ParameterSpec::new("data", TypeKind::list(ScalarType::Text)).singular());
    match synthesize(&schema, &SynthConfig::default()) {
        Err(SynthesisError::NamingCollision { method, .. }) => assert_eq!(method, "data"),
        other => panic!("expected naming collision, got {:?}", other),
    }

    let fixed = Schema::constructor("Archive").with_parameter(
        ParameterSpec::new("data", TypeKind::list(ScalarType::Text)).singular_as("datum"),
    );
    let model = synthesize(&fixed, &SynthConfig::default()).unwrap();
    assert!(model.method("datum").is_some());
}

#[test]
fn test_inferred_method_names() {
    let schema = Schema::constructor("Household")
        .with_parameter(ParameterSpec::new("children", TypeKind::list(ScalarType::Text)).singular())
        .with_parameter(ParameterSpec::new("categories", TypeKind::set(ScalarType::Text)).singular())
        .with_parameter(ParameterSpec::new("boxes", TypeKind::list(ScalarType::Int)).singular());
    let model = synthesize(&schema, &SynthConfig::default()).unwrap();
    for method in ["child", "category", "box", "clear_children", "clear_categories"] {
        assert!(model.method(method).is_some(), "missing {}", method);
    }
}

proptest! {
    #[test]
    fn prop_add_one_calls_keep_count_and_order(lessons in proptest::collection::vec("[a-z]{1,8}", 0..40)) {
        let model = student_model();
        let mut builder = model.builder(echo);
        for lesson in &lessons {
            builder.add("lesson", lesson.as_str()).unwrap();
        }
        let arguments = builder.build().unwrap();
        let built: Vec<String> = arguments
            .get("lessons")
            .and_then(Value::as_collection)
            .unwrap()
            .iter()
            .filter_map(|s| s.as_text().map(str::to_string))
            .collect();
        prop_assert_eq!(built, lessons);
    }
}
