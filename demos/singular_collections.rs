use builder_synth::{
    synthesize, Arguments, ElementOrder, ParameterSpec, ScalarType, Schema, SynthConfig, TypeKind,
};
use std::convert::Infallible;

fn main() {
    println!("=== Singular Collections Example ===\n");

    let schema = Schema::constructor("Student")
        .with_parameter(ParameterSpec::scalar("name", ScalarType::Text))
        .with_parameter(ParameterSpec::new("lessons", TypeKind::set(ScalarType::Text)).singular())
        .with_parameter(
            ParameterSpec::new("grades", TypeKind::map(ScalarType::Text, ScalarType::Int)).singular(),
        )
        .with_parameter(
            ParameterSpec::new("ranks", TypeKind::sorted_set(ScalarType::Int, ElementOrder::Reverse))
                .singular_as("rank"),
        );
    let model = synthesize(&schema, &SynthConfig::default()).expect("Failed to synthesize builder");

    for plan in model.parameters() {
        println!("{:<8} {}", plan.name, plan.strategy);
    }

    let mut builder = model.builder(|arguments: Arguments| Ok::<_, Infallible>(arguments));
    builder
        .set("name", "alice")
        .and_then(|b| b.add("lesson", "math"))
        .and_then(|b| b.add_all("lessons", ["art", "gym", "math"]))
        .and_then(|b| b.put("grade", "math", 90))
        .and_then(|b| b.put_all("grades", [("art", 75), ("math", 95)]))
        .and_then(|b| b.add_all("ranks", [3, 1, 2]))
        .expect("Rejected builder call");

    let arguments = builder.build().expect("Failed to build");
    println!();
    for (name, value) in arguments.iter() {
        println!("{} = {}", name, value);
    }

    // Clearing starts the collection over
    builder.clear("clear_lessons").expect("Rejected clear");
    let arguments = builder.build().expect("Failed to build");
    println!("\nAfter clear_lessons: lessons = {}", arguments.get("lessons").map(ToString::to_string).unwrap_or_default());
}
