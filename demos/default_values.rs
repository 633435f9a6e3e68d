use builder_synth::{
    synthesize, Arguments, DefaultExpr, ParameterSpec, ScalarType, Schema, SynthConfig, Value,
};
use std::convert::Infallible;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

fn main() {
    println!("=== Default Values Example ===\n");

    let next_id = Arc::new(AtomicI64::new(1));
    let counter = Arc::clone(&next_id);
    let schema = Schema::constructor("Student")
        .with_parameter(ParameterSpec::scalar("name", ScalarType::Text))
        .with_parameter(
            ParameterSpec::scalar("teacher", ScalarType::Text)
                .with_default(DefaultExpr::literal("Mrs. White")),
        )
        .with_parameter(ParameterSpec::scalar("id", ScalarType::Int).with_default(
            DefaultExpr::computed(move || Value::from(counter.fetch_add(1, Ordering::SeqCst))),
        ));
    let model = synthesize(&schema, &SynthConfig::default()).expect("Failed to synthesize builder");
    let show = |arguments: Arguments| Ok::<_, Infallible>(arguments);

    // 1. Unset parameters use their defaults
    let mut builder = model.builder(show);
    builder.set("name", "alice").expect("Rejected setter call");
    println!("1. {:?}", render(&builder.build().expect("Failed to build")));

    // 2. Each build evaluates a computed default again
    println!("2. {:?}", render(&builder.build().expect("Failed to build")));

    // 3. An explicit empty value still wins over the default
    builder.set("teacher", "").expect("Rejected setter call");
    println!("3. {:?}", render(&builder.build().expect("Failed to build")));
}

fn render(arguments: &Arguments) -> Vec<String> {
    arguments
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect()
}
