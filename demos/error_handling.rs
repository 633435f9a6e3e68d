use builder_synth::{
    synthesize, Arguments, BuildError, ParameterSpec, ScalarType, Schema, SynthConfig, TypeKind,
    Value,
};

#[derive(Debug)]
struct Registration {
    username: String,
    terms_accepted: bool,
}

fn register(arguments: Arguments) -> Result<Registration, String> {
    let username = arguments
        .get("username")
        .and_then(Value::as_text)
        .filter(|name| !name.is_empty())
        .ok_or("username is required")?
        .to_string();
    let terms_accepted = arguments.get("terms_accepted").and_then(Value::as_bool) == Some(true);
    if !terms_accepted {
        return Err("terms must be accepted".to_string());
    }
    Ok(Registration {
        username,
        terms_accepted,
    })
}

fn main() {
    println!("=== Error Handling Example ===\n");

    // 1. Synthesis rejects colliding method names
    println!("1. Uninflectable collection name:");
    let schema = Schema::constructor("Archive")
        .with_parameter(ParameterSpec::new("data", TypeKind::list(ScalarType::Text)).singular());
    match synthesize(&schema, &SynthConfig::default()) {
        Ok(_) => println!("   Unexpectedly succeeded!\n"),
        Err(e) => println!("   Error: {}\n", e),
    }

    let schema = Schema::constructor("Registration")
        .with_parameter(ParameterSpec::scalar("username", ScalarType::Text))
        .with_parameter(ParameterSpec::scalar("terms_accepted", ScalarType::Bool));
    let model = synthesize(&schema, &SynthConfig::default()).expect("Failed to synthesize builder");
    let mut builder = model.builder(register);

    // 2. Calls are checked against the generated surface
    println!("2. Bad calls:");
    if let Err(e) = builder.set("email", "alice@example.com") {
        println!("   Error: {}", e);
    }
    if let Err(e) = builder.set("terms_accepted", "yes") {
        println!("   Error: {}\n", e);
    }

    // 3. Construction errors pass through unchanged
    println!("3. Missing username:");
    match builder.build() {
        Ok(reg) => println!("   Success: {:?}\n", reg),
        Err(BuildError::Construction(e)) => println!("   Construction failed: {}\n", e),
        Err(e) => println!("   Error: {}\n", e),
    }

    // 4. The builder is still usable after a failed build
    println!("4. Successful registration:");
    builder
        .set("username", "alice")
        .and_then(|b| b.set("terms_accepted", true))
        .expect("Rejected setter call");
    match builder.build() {
        Ok(reg) => println!("   Success: {:?}", reg),
        Err(e) => println!("   Error: {}", e),
    }
}
