//! # builder-synth
//!
//! Synthesizes fluent builders from a schema of construction parameters.
//!
//! A [`Schema`] is turned into a [`BuilderModel`] by [`synthesize`]. The
//! model names every generated method and picks an accumulation strategy
//! for each parameter. Builders created from it collect values through
//! setters, add-one, add-many and clear methods, and hand the resolved
//! arguments to a [`Construct`] capability on `build`.
//!
//! ## Example
//!
//! ```rust
//! use builder_synth::{
//!     synthesize, Arguments, DefaultExpr, ParameterSpec, ScalarType, Schema, SynthConfig,
//!     TypeKind, Value,
//! };
//! use std::convert::Infallible;
//!
//! let schema = Schema::constructor("Student")
//!     .with_parameter(ParameterSpec::scalar("name", ScalarType::Text))
//!     .with_parameter(ParameterSpec::new("lessons", TypeKind::set(ScalarType::Text)).singular())
//!     .with_parameter(
//!         ParameterSpec::scalar("teacher", ScalarType::Text)
//!             .with_default(DefaultExpr::literal("Mrs. White")),
//!     );
//!
//! let model = synthesize(&schema, &SynthConfig::default())?;
//! let mut builder = model.builder(|args: Arguments| Ok::<_, Infallible>(args));
//! builder
//!     .set("name", "alice")?
//!     .add("lesson", "math")?
//!     .add("lesson", "art")?;
//!
//! let args = builder.build()?;
//! assert_eq!(args.get("lessons").and_then(Value::as_collection).map(|c| c.len()), Some(2));
//! assert_eq!(args.get("teacher"), Some(&Value::from("Mrs. White")));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
mod collection;
mod config;
pub mod defaults;
pub mod descriptor;
mod diagnostics;
mod error;
pub mod materialize;
pub mod naming;
mod schema;
mod synth;
mod value;

pub use builder::{Arguments, Builder, Construct};
pub use collection::{
    Collection, FrozenList, FrozenMap, FrozenSet, FrozenSortedSet, Representation,
};
pub use config::{CollectionFamily, FlagUsage, NamingConfig, SynthConfig};
pub use descriptor::{load_schema, parse_schema, DescriptorError, DescriptorResult};
pub use diagnostics::{Diagnostic, Feature, Severity};
pub use error::{BuildError, BuildResult, CallError, CallResult, SynthResult, SynthesisError};
pub use schema::{
    Comparator, DefaultExpr, ElementOrder, ParameterSpec, Schema, Shape, Target, TypeKind,
};
pub use synth::{
    synthesize, AccumulationStrategy, BuilderModel, MethodKind, MethodSpec, ParameterPlan,
};
pub use value::{Scalar, ScalarType, Value};
