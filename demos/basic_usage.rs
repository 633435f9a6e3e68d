use builder_synth::{synthesize, Arguments, ParameterSpec, ScalarType, Schema, SynthConfig, Value};
use std::convert::Infallible;

#[derive(Debug)]
struct User {
    username: String,
    email: String,
    age: i64,
}

fn new_user(arguments: Arguments) -> Result<User, Infallible> {
    let text = |name: &str| {
        arguments
            .get(name)
            .and_then(Value::as_text)
            .unwrap_or_default()
            .to_string()
    };
    Ok(User {
        username: text("username"),
        email: text("email"),
        age: arguments.get("age").and_then(Value::as_int).unwrap_or_default(),
    })
}

fn main() {
    println!("=== Basic Usage Example ===\n");

    let schema = Schema::constructor("User")
        .with_parameter(ParameterSpec::scalar("username", ScalarType::Text))
        .with_parameter(ParameterSpec::scalar("email", ScalarType::Text))
        .with_parameter(ParameterSpec::scalar("age", ScalarType::Int));
    let model = synthesize(&schema, &SynthConfig::default()).expect("Failed to synthesize builder");

    println!("Generated methods:");
    for (name, method) in model.methods() {
        println!("  {} ({})", name, method.kind);
    }

    // Build a user with all fields
    let mut builder = model.builder(new_user);
    builder
        .set("username", "alice")
        .and_then(|b| b.set("email", "alice@example.com"))
        .and_then(|b| b.set("age", 30))
        .expect("Rejected setter call");
    let user = builder.build().expect("Failed to build user");
    println!("\nCreated user: {:?}", user);

    // Unset parameters take their zero value
    let user = model.builder(new_user).build().expect("Failed to build user");
    println!("Created empty user: {:?}", user);
}
