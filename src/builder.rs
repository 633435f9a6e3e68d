//! Runtime builder instances.
//!
//! A [`Builder`] is a mutable accumulator over a [`BuilderModel`]. Methods
//! are addressed by the names the model generated, and `build` hands the
//! resolved arguments to the [`Construct`] capability in declaration order.
//!
//! A builder is meant for one owner. Sharing one across threads requires
//! external synchronization; the `&mut self` API enforces this in safe code.

use crate::collection::Collection;
use crate::defaults::{self, SetState, Source};
use crate::error::{BuildError, BuildResult, CallError, CallResult};
use crate::materialize::{materialize, Buffer};
use crate::schema::{Shape, TypeKind};
use crate::synth::{AccumulationStrategy, BuilderModel, MethodKind};
use crate::value::{Scalar, ScalarType, Value};
use std::fmt;
use tracing::debug;

/// The resolved argument list, in schema declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    entries: Vec<(String, Value)>,
}

impl Arguments {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Removes and returns the argument for `name`.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Positional values for position-dependent targets.
    pub fn into_values(self) -> Vec<Value> {
        self.entries.into_iter().map(|(_, v)| v).collect()
    }
}

impl IntoIterator for Arguments {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The external capability that turns arguments into a product.
pub trait Construct {
    type Product;
    type Error;

    fn construct(&self, arguments: Arguments) -> Result<Self::Product, Self::Error>;
}

impl<F, P, E> Construct for F
where
    F: Fn(Arguments) -> Result<P, E>,
{
    type Product = P;
    type Error = E;

    fn construct(&self, arguments: Arguments) -> Result<P, E> {
        self(arguments)
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Direct(Value),
    /// `None` until the first add.
    Accumulated(Option<Buffer>, Shape),
}

#[derive(Debug, Clone)]
struct ParameterState {
    slot: Slot,
    state: SetState,
}

pub struct Builder<'m, C> {
    model: &'m BuilderModel,
    construct: C,
    parameters: Vec<ParameterState>,
}

impl<'m, C: Construct> Builder<'m, C> {
    pub(crate) fn new(model: &'m BuilderModel, construct: C) -> Self {
        let parameters = model
            .parameters()
            .iter()
            .map(|plan| {
                let slot = match (plan.strategy.base(), plan.kind.shape()) {
                    (AccumulationStrategy::Singular { .. }, Some(shape)) => {
                        Slot::Accumulated(None, shape.clone())
                    }
                    _ => Slot::Direct(plan.kind.zero_value(model.family())),
                };
                ParameterState {
                    slot,
                    state: SetState::unset(),
                }
            })
            .collect();
        Self {
            model,
            construct,
            parameters,
        }
    }

    pub fn model(&self) -> &'m BuilderModel {
        self.model
    }

    /// Assigns a value through a setter.
    pub fn set(&mut self, method: &str, value: impl Into<Value>) -> CallResult<&mut Self> {
        let index = self.lookup(method, MethodKind::Setter)?;
        let value = value.into();
        let kind = &self.model.parameters()[index].kind;
        if !kind.accepts(&value) {
            return Err(self.mismatch(index, kind.to_string(), value.describe()));
        }
        let value = kind.normalize(value, self.model.family());
        let parameter = &mut self.parameters[index];
        parameter.slot = Slot::Direct(value);
        parameter.state.mark();
        Ok(self)
    }

    /// Appends one element through an add-one method.
    pub fn add(&mut self, method: &str, item: impl Into<Scalar>) -> CallResult<&mut Self> {
        let index = self.lookup(method, MethodKind::AddOne)?;
        let item = item.into();
        let element = self.element_type(index, false)?;
        self.check_scalar(index, element, &item)?;
        let parameter = &mut self.parameters[index];
        if let Some(storage) = buffer_of(&mut parameter.slot).and_then(Buffer::elements_mut) {
            storage.push(item);
        }
        parameter.state.mark();
        Ok(self)
    }

    /// Adds one entry through a map parameter's add-one method.
    pub fn put(
        &mut self,
        method: &str,
        key: impl Into<Scalar>,
        value: impl Into<Scalar>,
    ) -> CallResult<&mut Self> {
        let index = self.lookup(method, MethodKind::AddOne)?;
        let entry = (key.into(), value.into());
        self.check_entry(index, &entry)?;
        let parameter = &mut self.parameters[index];
        if let Some(storage) = buffer_of(&mut parameter.slot).and_then(Buffer::entries_mut) {
            storage.push(entry);
        }
        parameter.state.mark();
        Ok(self)
    }

    /// Appends every element through an add-many method. Either all items
    /// are accepted or none are.
    pub fn add_all<I, T>(&mut self, method: &str, items: I) -> CallResult<&mut Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        let index = self.lookup(method, MethodKind::AddMany)?;
        let items: Vec<Scalar> = items.into_iter().map(Into::into).collect();
        let element = self.element_type(index, false)?;
        for item in &items {
            self.check_scalar(index, element, item)?;
        }
        let parameter = &mut self.parameters[index];
        if let Some(storage) = buffer_of(&mut parameter.slot).and_then(Buffer::elements_mut) {
            storage.extend(items);
        }
        parameter.state.mark();
        Ok(self)
    }

    /// Adds every entry through a map parameter's add-many method.
    pub fn put_all<I, K, V>(&mut self, method: &str, entries: I) -> CallResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Scalar>,
        V: Into<Scalar>,
    {
        let index = self.lookup(method, MethodKind::AddMany)?;
        self.element_type(index, true)?;
        let entries: Vec<(Scalar, Scalar)> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        for entry in &entries {
            self.check_entry(index, entry)?;
        }
        let parameter = &mut self.parameters[index];
        if let Some(storage) = buffer_of(&mut parameter.slot).and_then(Buffer::entries_mut) {
            storage.extend(entries);
        }
        parameter.state.mark();
        Ok(self)
    }

    /// Merges a collection through an add-many method, for maps as well
    /// as element collections.
    pub fn add_from(&mut self, method: &str, collection: &Collection) -> CallResult<&mut Self> {
        if collection.conforms_to(&Shape::Map) {
            self.put_all(
                method,
                collection.entries().map(|(k, v)| (k.clone(), v.clone())),
            )
        } else {
            self.add_all(method, collection.iter().cloned())
        }
    }

    /// Discards everything accumulated so far. Counts as an explicit
    /// assignment for defaulted parameters.
    pub fn clear(&mut self, method: &str) -> CallResult<&mut Self> {
        let index = self.lookup(method, MethodKind::Clear)?;
        let parameter = &mut self.parameters[index];
        if let Slot::Accumulated(buffer, _) = &mut parameter.slot {
            *buffer = None;
        }
        parameter.state.mark();
        Ok(self)
    }

    /// Whether `parameter` has been explicitly assigned, added to or cleared.
    pub fn is_set(&self, parameter: &str) -> Option<bool> {
        let index = self.model.parameter_index(parameter)?;
        Some(self.parameters[index].state.is_set())
    }

    /// Whether a singular parameter's buffer has been allocated.
    pub fn is_allocated(&self, parameter: &str) -> bool {
        self.model
            .parameter_index(parameter)
            .is_some_and(|index| {
                matches!(self.parameters[index].slot, Slot::Accumulated(Some(_), _))
            })
    }

    /// Resolves every parameter into the argument list `build` would pass.
    pub fn arguments(&self) -> BuildResult<Arguments, C::Error> {
        let family = self.model.family();
        let mut entries = Vec::with_capacity(self.parameters.len());
        for (plan, parameter) in self.model.parameters().iter().zip(&self.parameters) {
            let resolution = defaults::resolve(parameter.state, plan.strategy.default_expr(), || {
                match &parameter.slot {
                    Slot::Direct(value) => value.clone(),
                    Slot::Accumulated(Some(buffer), _) => Value::Collection(materialize(buffer, family)),
                    Slot::Accumulated(None, shape) => Value::Collection(Collection::empty(shape, family)),
                }
            });
            if resolution.source == Source::Default && !plan.kind.accepts(&resolution.value) {
                return Err(BuildError::DefaultType {
                    parameter: plan.name.clone(),
                    expected: plan.kind.to_string(),
                    found: resolution.value.describe(),
                });
            }
            let value = match resolution.source {
                Source::Default => plan.kind.normalize(resolution.value, family),
                Source::Current => resolution.value,
            };
            entries.push((plan.name.clone(), value));
        }
        Ok(Arguments { entries })
    }

    /// Builds the product. The builder is left untouched and can keep
    /// accumulating or build again.
    pub fn build(&self) -> BuildResult<C::Product, C::Error> {
        let arguments = self.arguments()?;
        debug!(
            "Building `{}` with {} argument(s)",
            self.model.product(),
            arguments.len()
        );
        self.construct
            .construct(arguments)
            .map_err(BuildError::Construction)
    }

    fn lookup(&self, method: &str, expected: MethodKind) -> CallResult<usize> {
        let spec = self
            .model
            .method(method)
            .ok_or_else(|| CallError::UnknownMethod(method.to_string()))?;
        match spec.parameter {
            Some(index) if spec.kind == expected => Ok(index),
            _ => Err(CallError::WrongMethodKind {
                method: method.to_string(),
                expected: expected.label(),
                actual: spec.kind.label(),
            }),
        }
    }

    /// Element type of a collection parameter; `map` selects whether the
    /// caller is supplying entries.
    fn element_type(&self, index: usize, map: bool) -> CallResult<ScalarType> {
        match &self.model.parameters()[index].kind {
            TypeKind::Collection { element, shape, .. } if shape.is_map() == map => Ok(*element),
            kind => Err(self.mismatch(
                index,
                kind.to_string(),
                if map { "key/value entry" } else { "single element" }.to_string(),
            )),
        }
    }

    fn check_scalar(&self, index: usize, expected: ScalarType, item: &Scalar) -> CallResult<()> {
        if item.scalar_type() == expected {
            Ok(())
        } else {
            Err(self.mismatch(index, expected.to_string(), item.scalar_type().to_string()))
        }
    }

    fn check_entry(&self, index: usize, (key, value): &(Scalar, Scalar)) -> CallResult<()> {
        let key_type = self.element_type(index, true)?;
        self.check_scalar(index, key_type, key)?;
        if let TypeKind::Collection {
            value: Some(value_type),
            ..
        } = &self.model.parameters()[index].kind
        {
            self.check_scalar(index, *value_type, value)?;
        }
        Ok(())
    }

    fn mismatch(&self, index: usize, expected: String, found: String) -> CallError {
        CallError::TypeMismatch {
            parameter: self.model.parameters()[index].name.clone(),
            expected,
            found,
        }
    }
}

/// The slot's buffer, allocated on first use.
fn buffer_of(slot: &mut Slot) -> Option<&mut Buffer> {
    match slot {
        Slot::Accumulated(buffer, shape) => Some(buffer.get_or_insert_with(|| Buffer::for_shape(shape))),
        Slot::Direct(_) => None,
    }
}

impl<C> fmt::Debug for Builder<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("product", &self.model.product())
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthConfig;
    use crate::schema::{DefaultExpr, ParameterSpec, Schema};
    use crate::synth::synthesize;
    use std::convert::Infallible;

    fn echo(arguments: Arguments) -> Result<Arguments, Infallible> {
        Ok(arguments)
    }

    fn model() -> BuilderModel {
        let schema = Schema::constructor("Student")
            .with_parameter(ParameterSpec::scalar("name", ScalarType::Text))
            .with_parameter(ParameterSpec::new("lessons", TypeKind::list(ScalarType::Text)).singular())
            .with_parameter(
                ParameterSpec::new("grades", TypeKind::map(ScalarType::Text, ScalarType::Int)).singular(),
            )
            .with_parameter(
                ParameterSpec::scalar("teacher", ScalarType::Text)
                    .with_default(DefaultExpr::literal("Mrs. White")),
            );
        synthesize(&schema, &SynthConfig::default()).unwrap()
    }

    #[test]
    fn test_buffers_are_lazy() {
        let model = model();
        let mut builder = model.builder(echo);
        assert!(!builder.is_allocated("lessons"));
        builder.add("lesson", "math").unwrap();
        assert!(builder.is_allocated("lessons"));
        assert!(!builder.is_allocated("grades"));
    }

    #[test]
    fn test_unknown_and_wrong_kind_methods() {
        let model = model();
        let mut builder = model.builder(echo);
        assert_eq!(
            builder.set("nickname", "x").unwrap_err(),
            CallError::UnknownMethod("nickname".into())
        );
        assert!(matches!(
            builder.set("lesson", "math").unwrap_err(),
            CallError::WrongMethodKind { expected: "setter", .. }
        ));
        assert!(matches!(
            builder.clear("build").unwrap_err(),
            CallError::WrongMethodKind { actual: "build method", .. }
        ));
    }

    #[test]
    fn test_type_mismatch_leaves_state_unchanged() {
        let model = model();
        let mut builder = model.builder(echo);
        let err = builder.add_all("lessons", [Scalar::from("math"), Scalar::from(3)]).unwrap_err();
        assert!(matches!(err, CallError::TypeMismatch { ref parameter, .. } if parameter == "lessons"));
        assert_eq!(builder.is_set("lessons"), Some(false));
        assert!(!builder.is_allocated("lessons"));

        assert!(builder.set("name", 5).is_err());
        assert_eq!(builder.is_set("name"), Some(false));
    }

    #[test]
    fn test_map_needs_put() {
        let model = model();
        let mut builder = model.builder(echo);
        assert!(matches!(
            builder.add("grade", "math").unwrap_err(),
            CallError::TypeMismatch { .. }
        ));
        assert!(matches!(
            builder.put("lesson", "math", 1).unwrap_err(),
            CallError::TypeMismatch { .. }
        ));

        builder.put("grade", "math", 90).unwrap().put("grade", "art", 85).unwrap();
        let arguments = builder.build().unwrap();
        let grades = arguments.get("grades").unwrap().as_collection().unwrap();
        assert_eq!(grades.len(), 2);
        assert_eq!(grades.get(&Scalar::from("art")), Some(&Scalar::from(85)));
    }

    #[test]
    fn test_put_rejects_wrong_value_type() {
        let model = model();
        let mut builder = model.builder(echo);
        let err = builder.put("grade", "math", "A").unwrap_err();
        assert_eq!(
            err,
            CallError::TypeMismatch {
                parameter: "grades".into(),
                expected: "int".into(),
                found: "text".into(),
            }
        );
    }

    #[test]
    fn test_build_is_repeatable_and_snapshots() {
        let model = model();
        let mut builder = model.builder(echo);
        builder.add("lesson", "math").unwrap();
        let first = builder.build().unwrap();

        builder.add("lesson", "art").unwrap();
        let second = builder.build().unwrap();

        let lessons = |args: &Arguments| args.get("lessons").unwrap().as_collection().unwrap().len();
        assert_eq!(lessons(&first), 1);
        assert_eq!(lessons(&second), 2);
    }

    #[test]
    fn test_add_from_collection() {
        let model = model();
        let mut builder = model.builder(echo);
        builder.put("grade", "math", 70).unwrap();

        let mut other = model.builder(echo);
        other.put("grade", "math", 95).unwrap().put("grade", "gym", 60).unwrap();
        let merged = other.build().unwrap();
        let grades = merged.get("grades").unwrap().as_collection().unwrap();

        builder.add_from("grades", grades).unwrap();
        let arguments = builder.build().unwrap();
        let grades = arguments.get("grades").unwrap().as_collection().unwrap();
        assert_eq!(grades.len(), 2);
        assert_eq!(grades.get(&Scalar::from("math")), Some(&Scalar::from(95)));
    }

    #[test]
    fn test_arguments_follow_declaration_order() {
        let model = model();
        let builder = model.builder(echo);
        let arguments = builder.arguments().unwrap();
        let names: Vec<&str> = arguments.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "lessons", "grades", "teacher"]);
    }

    #[test]
    fn test_put_all_rejects_element_parameter_even_when_empty() {
        let model = model();
        let mut builder = model.builder(echo);
        let none: [(&str, i64); 0] = [];
        assert!(matches!(
            builder.put_all("lessons", none).unwrap_err(),
            CallError::TypeMismatch { .. }
        ));
        assert_eq!(builder.is_set("lessons"), Some(false));
        assert!(!builder.is_allocated("lessons"));
    }

    #[test]
    fn test_sorted_set_values_follow_declared_order() {
        use crate::config::CollectionFamily;
        use crate::materialize::collect;
        use crate::schema::ElementOrder;

        let natural = || {
            collect(
                &Shape::SortedSet(ElementOrder::Natural),
                CollectionFamily::Frozen,
                [Scalar::from(3), Scalar::from(1), Scalar::from(2)],
            )
        };
        let schema = Schema::constructor("Leaderboard")
            .with_parameter(ParameterSpec::new(
                "ranks",
                TypeKind::sorted_set(ScalarType::Int, ElementOrder::Reverse),
            ))
            .with_parameter(
                ParameterSpec::new("seeds", TypeKind::sorted_set(ScalarType::Int, ElementOrder::Reverse))
                    .with_default(DefaultExpr::literal(Value::Collection(natural()))),
            );
        let model = synthesize(&schema, &SynthConfig::default()).unwrap();
        let mut builder = model.builder(echo);
        builder.set("ranks", natural()).unwrap();

        let arguments = builder.build().unwrap();
        let order = |name: &str| -> Vec<i64> {
            arguments
                .get(name)
                .and_then(Value::as_collection)
                .unwrap()
                .iter()
                .filter_map(Scalar::as_int)
                .collect()
        };
        assert_eq!(order("ranks"), vec![3, 2, 1]);
        assert_eq!(order("seeds"), vec![3, 2, 1]);
    }

    #[test]
    fn test_positional_construct_reads_values_in_order() {
        let model = model();
        let mut builder = model.builder(|arguments: Arguments| {
            let values = arguments.into_values();
            match values.as_slice() {
                [name, _, _, teacher] => Ok(format!(
                    "{} with {}",
                    name.as_text().unwrap_or_default(),
                    teacher.as_text().unwrap_or_default()
                )),
                _ => Err(values.len()),
            }
        });
        builder.set("name", "alice").unwrap();
        assert_eq!(builder.build().unwrap(), "alice with Mrs. White");
    }

    #[test]
    fn test_arguments_take() {
        let model = model();
        let mut builder = model.builder(echo);
        builder.set("name", "alice").unwrap();
        let mut arguments = builder.build().unwrap();
        assert_eq!(arguments.take("name"), Some(Value::from("alice")));
        assert_eq!(arguments.take("name"), None);
        assert_eq!(arguments.len(), 3);
    }

    #[test]
    fn test_computed_default_of_wrong_type_fails_build() {
        let schema = Schema::constructor("Class").with_parameter(
            ParameterSpec::scalar("room", ScalarType::Int).with_default(DefaultExpr::computed(|| Value::from("B12"))),
        );
        let model = synthesize(&schema, &SynthConfig::default()).unwrap();
        let builder = model.builder(echo);
        match builder.build() {
            Err(BuildError::DefaultType { parameter, .. }) => assert_eq!(parameter, "room"),
            other => panic!("expected default type error, got {:?}", other.map(|a| a.len())),
        }
    }
}
