//! Language-neutral description of a constructible target.
//!
//! A [`Schema`] lists the construction parameters of a product in
//! declaration order together with their type classification and the
//! modifiers that steer builder synthesis (`singular`, defaults, explicit
//! singular names).

use crate::collection::Collection;
use crate::config::CollectionFamily;
use crate::materialize::collect;
use crate::value::{Scalar, ScalarType, Value};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// The entry point the builder feeds its arguments to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Constructor,
    Factory(String),
}

/// A caller-supplied total order over scalars.
#[derive(Clone)]
pub struct Comparator(Arc<dyn Fn(&Scalar, &Scalar) -> Ordering + Send + Sync>);

impl Comparator {
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&Scalar, &Scalar) -> Ordering + Send + Sync + 'static,
    {
        Self(Arc::new(compare))
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator(..)")
    }
}

/// Ordering used by sorted-set parameters.
#[derive(Debug, Clone, Default)]
pub enum ElementOrder {
    #[default]
    Natural,
    Reverse,
    Custom(Comparator),
}

impl ElementOrder {
    pub fn custom<F>(compare: F) -> Self
    where
        F: Fn(&Scalar, &Scalar) -> Ordering + Send + Sync + 'static,
    {
        ElementOrder::Custom(Comparator::new(compare))
    }

    pub fn compare(&self, a: &Scalar, b: &Scalar) -> Ordering {
        match self {
            ElementOrder::Natural => a.cmp(b),
            ElementOrder::Reverse => b.cmp(a),
            ElementOrder::Custom(c) => (c.0)(a, b),
        }
    }

    pub fn is_natural(&self) -> bool {
        matches!(self, ElementOrder::Natural)
    }
}

/// Container shape of a collection parameter.
#[derive(Debug, Clone)]
pub enum Shape {
    List,
    Set,
    SortedSet(ElementOrder),
    Map,
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::List => "list",
            Shape::Set => "set",
            Shape::SortedSet(_) => "sorted_set",
            Shape::Map => "map",
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Shape::Map)
    }
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Scalar(ScalarType),
    /// For `Map`, `element` is the key type and `value` the value type.
    Collection {
        element: ScalarType,
        value: Option<ScalarType>,
        shape: Shape,
    },
}

impl TypeKind {
    pub fn list(element: ScalarType) -> Self {
        TypeKind::Collection {
            element,
            value: None,
            shape: Shape::List,
        }
    }

    pub fn set(element: ScalarType) -> Self {
        TypeKind::Collection {
            element,
            value: None,
            shape: Shape::Set,
        }
    }

    pub fn sorted_set(element: ScalarType, order: ElementOrder) -> Self {
        TypeKind::Collection {
            element,
            value: None,
            shape: Shape::SortedSet(order),
        }
    }

    pub fn map(key: ScalarType, value: ScalarType) -> Self {
        TypeKind::Collection {
            element: key,
            value: Some(value),
            shape: Shape::Map,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, TypeKind::Collection { .. })
    }

    pub fn shape(&self) -> Option<&Shape> {
        match self {
            TypeKind::Collection { shape, .. } => Some(shape),
            TypeKind::Scalar(_) => None,
        }
    }

    /// The value used when a parameter is never set and has no default.
    pub fn zero_value(&self, family: CollectionFamily) -> Value {
        match self {
            TypeKind::Scalar(ty) => Value::Scalar(ty.zero()),
            TypeKind::Collection { shape, .. } => Value::Collection(Collection::empty(shape, family)),
        }
    }

    /// Re-sorts a sorted-set value under this kind's declared order, so a
    /// collection ordered some other way cannot reach the product. Other
    /// values are returned as they are.
    pub fn normalize(&self, value: Value, family: CollectionFamily) -> Value {
        match (self, value) {
            (
                TypeKind::Collection {
                    shape: shape @ Shape::SortedSet(_),
                    ..
                },
                Value::Collection(c),
            ) => Value::Collection(collect(shape, family, c.iter().cloned())),
            (_, value) => value,
        }
    }

    /// Whether `value` is a legal argument for a parameter of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeKind::Scalar(ty), Value::Scalar(s)) => s.scalar_type() == *ty,
            (
                TypeKind::Collection {
                    element,
                    value: value_type,
                    shape,
                },
                Value::Collection(c),
            ) => {
                if !c.conforms_to(shape) {
                    return false;
                }
                match value_type {
                    Some(vt) => c
                        .entries()
                        .all(|(k, v)| k.scalar_type() == *element && v.scalar_type() == *vt),
                    None => c.iter().all(|e| e.scalar_type() == *element),
                }
            }
            _ => false,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Scalar(ty) => write!(f, "{}", ty),
            TypeKind::Collection {
                element,
                value: Some(v),
                shape,
            } => write!(f, "{}<{}, {}>", shape.name(), element, v),
            TypeKind::Collection { element, shape, .. } => {
                write!(f, "{}<{}>", shape.name(), element)
            }
        }
    }
}

/// The value substituted for a defaulted parameter that was never set.
#[derive(Clone)]
pub enum DefaultExpr {
    Literal(Value),
    /// Deferred expression, evaluated at most once per build call.
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultExpr {
    pub fn literal(value: impl Into<Value>) -> Self {
        DefaultExpr::Literal(value.into())
    }

    pub fn computed<F>(expr: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        DefaultExpr::Computed(Arc::new(expr))
    }

    pub fn evaluate(&self) -> Value {
        match self {
            DefaultExpr::Literal(v) => v.clone(),
            DefaultExpr::Computed(expr) => expr(),
        }
    }
}

impl fmt::Debug for DefaultExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultExpr::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DefaultExpr::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// One declared construction input.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: TypeKind,
    /// Accumulate through add-one / add-many / clear instead of a setter.
    pub singular: bool,
    pub default: Option<DefaultExpr>,
    /// Overrides the inferred singular method name.
    pub singular_name: Option<String>,
}

impl ParameterSpec {
    pub fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            singular: false,
            default: None,
            singular_name: None,
        }
    }

    pub fn scalar(name: &str, ty: ScalarType) -> Self {
        Self::new(name, TypeKind::Scalar(ty))
    }

    pub fn singular(mut self) -> Self {
        self.singular = true;
        self
    }

    /// Marks the parameter singular with an explicit per-item method name.
    pub fn singular_as(mut self, singular_name: &str) -> Self {
        self.singular = true;
        self.singular_name = Some(singular_name.to_string());
        self
    }

    pub fn with_default(mut self, default: DefaultExpr) -> Self {
        self.default = Some(default);
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub target: Target,
    /// Name of the product type.
    pub product: String,
    pub parameters: Vec<ParameterSpec>,
    /// Prefix joined onto setter and add methods (`with_name` / `withName`).
    pub setter_prefix: Option<String>,
    pub build_method: String,
}

impl Schema {
    pub fn constructor(product: &str) -> Self {
        Self {
            target: Target::Constructor,
            product: product.to_string(),
            parameters: Vec::new(),
            setter_prefix: None,
            build_method: "build".to_string(),
        }
    }

    pub fn factory(product: &str, factory: &str) -> Self {
        Self {
            target: Target::Factory(factory.to_string()),
            ..Self::constructor(product)
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_setter_prefix(mut self, prefix: &str) -> Self {
        self.setter_prefix = Some(prefix.to_string());
        self
    }

    pub fn with_build_method(mut self, name: &str) -> Self {
        self.build_method = name.to_string();
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
