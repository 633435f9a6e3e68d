//! Builder model synthesis.
//!
//! [`synthesize`] validates a [`Schema`], picks an accumulation strategy for
//! every parameter, names the generated methods, and rejects any schema
//! whose method surface would contain the same name twice.

use crate::builder::{Builder, Construct};
use crate::config::{CollectionFamily, SynthConfig};
use crate::diagnostics::{Diagnostic, Feature, Severity};
use crate::error::{SynthResult, SynthesisError};
use crate::naming;
use crate::schema::{DefaultExpr, ParameterSpec, Schema, Shape, Target, TypeKind};
use indexmap::IndexMap;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Setter,
    AddOne,
    AddMany,
    Clear,
    Build,
}

impl MethodKind {
    pub fn label(self) -> &'static str {
        match self {
            MethodKind::Setter => "setter",
            MethodKind::AddOne => "add-one method",
            MethodKind::AddMany => "add-many method",
            MethodKind::Clear => "clear method",
            MethodKind::Build => "build method",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the generated method surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    pub kind: MethodKind,
    /// Index into [`BuilderModel::parameters`]; `None` for the build method.
    pub parameter: Option<usize>,
}

/// How a builder accumulates one parameter.
#[derive(Debug, Clone)]
pub enum AccumulationStrategy {
    /// A single setter overwriting the stored value.
    Direct { setter: String },
    /// A lazily allocated buffer behind add-one, add-many and clear.
    Singular {
        add_one: String,
        add_many: String,
        clear: String,
    },
    /// `inner` plus an unset sentinel; `default` is used while unset.
    Defaulted {
        inner: Box<AccumulationStrategy>,
        default: DefaultExpr,
    },
}

impl AccumulationStrategy {
    /// The strategy with any `Defaulted` wrapper removed.
    pub fn base(&self) -> &AccumulationStrategy {
        match self {
            AccumulationStrategy::Defaulted { inner, .. } => inner.base(),
            other => other,
        }
    }

    pub fn default_expr(&self) -> Option<&DefaultExpr> {
        match self {
            AccumulationStrategy::Defaulted { default, .. } => Some(default),
            _ => None,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, AccumulationStrategy::Defaulted { .. })
    }

    pub fn is_singular(&self) -> bool {
        matches!(self.base(), AccumulationStrategy::Singular { .. })
    }

    /// Generated method names with their kinds, in registration order.
    pub fn methods(&self) -> Vec<(&str, MethodKind)> {
        match self.base() {
            AccumulationStrategy::Direct { setter } => vec![(setter.as_str(), MethodKind::Setter)],
            AccumulationStrategy::Singular {
                add_one,
                add_many,
                clear,
            } => vec![
                (add_one.as_str(), MethodKind::AddOne),
                (add_many.as_str(), MethodKind::AddMany),
                (clear.as_str(), MethodKind::Clear),
            ],
            AccumulationStrategy::Defaulted { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for AccumulationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccumulationStrategy::Direct { setter } => write!(f, "direct {}", setter),
            AccumulationStrategy::Singular {
                add_one,
                add_many,
                clear,
            } => write!(f, "singular {} / {} / {}", add_one, add_many, clear),
            AccumulationStrategy::Defaulted { inner, .. } => write!(f, "defaulted {}", inner),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterPlan {
    pub name: String,
    pub kind: TypeKind,
    pub strategy: AccumulationStrategy,
}

/// The synthesized, immutable description of a builder.
///
/// Parameters keep schema declaration order, which is also the order of the
/// argument list handed to the construct capability.
#[derive(Debug, Clone)]
pub struct BuilderModel {
    product: String,
    target: Target,
    build_method: String,
    family: CollectionFamily,
    parameters: Vec<ParameterPlan>,
    methods: IndexMap<String, MethodSpec>,
    diagnostics: Vec<Diagnostic>,
}

impl BuilderModel {
    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn build_method(&self) -> &str {
        &self.build_method
    }

    pub fn family(&self) -> CollectionFamily {
        self.family
    }

    pub fn parameters(&self) -> &[ParameterPlan] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterPlan> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub(crate) fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.get(name)
    }

    /// The full method surface, build method first.
    pub fn methods(&self) -> impl Iterator<Item = (&str, &MethodSpec)> {
        self.methods.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Creates an empty builder that hands its arguments to `construct`.
    pub fn builder<C: Construct>(&self, construct: C) -> Builder<'_, C> {
        Builder::new(self, construct)
    }
}

/// Maps a schema to a builder model.
///
/// Synthesis is pure: it reads `schema` and `config` and touches nothing
/// else, so independent schemas may be synthesized concurrently.
pub fn synthesize(schema: &Schema, config: &SynthConfig) -> SynthResult<BuilderModel> {
    let mut diagnostics = Vec::new();
    check_flag_usage(
        config.flag_usage.builder,
        Feature::Builder,
        &schema.product,
        None,
        &mut diagnostics,
    )?;
    validate_schema(schema, config)?;

    let mut surface = Surface::new(&schema.parameters);
    surface.register(
        &schema.build_method,
        MethodSpec {
            kind: MethodKind::Build,
            parameter: None,
        },
    )?;

    let mut parameters = Vec::with_capacity(schema.parameters.len());
    for (index, spec) in schema.parameters.iter().enumerate() {
        let strategy = select_strategy(schema, spec, config, &mut diagnostics)?;
        for (method, kind) in strategy.methods() {
            surface.register(
                method,
                MethodSpec {
                    kind,
                    parameter: Some(index),
                },
            )?;
        }
        parameters.push(ParameterPlan {
            name: spec.name.clone(),
            kind: spec.kind.clone(),
            strategy,
        });
    }

    debug!(
        "Synthesized builder for `{}`: {} parameter(s), {} method(s)",
        schema.product,
        parameters.len(),
        surface.methods.len()
    );

    Ok(BuilderModel {
        product: schema.product.clone(),
        target: schema.target.clone(),
        build_method: schema.build_method.clone(),
        family: config.collection_family,
        parameters,
        methods: surface.methods,
        diagnostics,
    })
}

fn select_strategy(
    schema: &Schema,
    spec: &ParameterSpec,
    config: &SynthConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> SynthResult<AccumulationStrategy> {
    let with_prefix = |name: &str| match &schema.setter_prefix {
        Some(prefix) => naming::prefixed(prefix, name),
        None => name.to_string(),
    };

    let base = if spec.singular {
        check_flag_usage(
            config.flag_usage.singular,
            Feature::Singular,
            &spec.name,
            Some(&spec.name),
            diagnostics,
        )?;
        let singular = singular_token(spec, config, diagnostics)?;
        AccumulationStrategy::Singular {
            add_one: with_prefix(&singular),
            add_many: with_prefix(&spec.name),
            clear: naming::prefixed("clear", &spec.name),
        }
    } else {
        AccumulationStrategy::Direct {
            setter: with_prefix(&spec.name),
        }
    };

    match &spec.default {
        Some(default) => {
            check_flag_usage(
                config.flag_usage.default,
                Feature::Default,
                &spec.name,
                Some(&spec.name),
                diagnostics,
            )?;
            Ok(AccumulationStrategy::Defaulted {
                inner: Box::new(base),
                default: default.clone(),
            })
        }
        None => Ok(base),
    }
}

fn singular_token(
    spec: &ParameterSpec,
    config: &SynthConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> SynthResult<String> {
    if spec.singular_name.is_none() && !config.infer_singular_names {
        return Err(SynthesisError::violation(
            &spec.name,
            "singular name inference is disabled; an explicit singular name is required",
        ));
    }
    let singular = naming::resolve(&spec.name, spec.singular_name.as_deref(), &config.naming);
    if singular.is_ambiguous() {
        diagnostics.push(Diagnostic::warning(
            Some(&spec.name),
            "cannot infer a singular form; specify the singular name explicitly",
        ));
    }
    Ok(singular.token)
}

fn check_flag_usage(
    level: Option<Severity>,
    feature: Feature,
    subject: &str,
    parameter: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> SynthResult<()> {
    match level {
        None => Ok(()),
        Some(Severity::Warning) => {
            warn!("Use of the {} feature on `{}` is flagged", feature, subject);
            diagnostics.push(Diagnostic::warning(
                parameter,
                format!("use of the {} feature is flagged", feature),
            ));
            Ok(())
        }
        Some(Severity::Error) => Err(SynthesisError::FlagUsage {
            feature,
            subject: subject.to_string(),
        }),
    }
}

fn validate_schema(schema: &Schema, config: &SynthConfig) -> SynthResult<()> {
    if !naming::is_identifier(&schema.build_method) {
        return Err(SynthesisError::violation(
            &schema.build_method,
            "build method name is not a valid identifier",
        ));
    }
    if let Some(prefix) = &schema.setter_prefix {
        if !naming::is_identifier(prefix) {
            return Err(SynthesisError::violation(
                prefix,
                "setter prefix is not a valid identifier",
            ));
        }
    }
    if let Target::Factory(factory) = &schema.target {
        if !naming::is_identifier(factory) {
            return Err(SynthesisError::violation(
                factory,
                "factory name is not a valid identifier",
            ));
        }
    }

    let mut seen = std::collections::HashSet::new();
    for spec in &schema.parameters {
        if !naming::is_identifier(&spec.name) {
            return Err(SynthesisError::violation(
                &spec.name,
                "parameter name is not a valid identifier",
            ));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(SynthesisError::violation(
                &spec.name,
                "duplicate parameter name",
            ));
        }
        validate_parameter(spec, config)?;
    }
    Ok(())
}

fn validate_parameter(spec: &ParameterSpec, config: &SynthConfig) -> SynthResult<()> {
    if let TypeKind::Collection { value, shape, .. } = &spec.kind {
        match (shape, value) {
            (Shape::Map, None) => {
                return Err(SynthesisError::violation(
                    &spec.name,
                    "map parameters need a value type",
                ))
            }
            (Shape::Map, Some(_)) => {}
            (_, Some(_)) => {
                return Err(SynthesisError::violation(
                    &spec.name,
                    format!("{} parameters take a single element type", shape.name()),
                ))
            }
            (_, None) => {}
        }
        if let Shape::SortedSet(order) = shape {
            if !order.is_natural() && config.collection_family == CollectionFamily::Persistent {
                return Err(SynthesisError::violation(
                    &spec.name,
                    "persistent sorted sets only support natural ordering",
                ));
            }
        }
    }

    if spec.singular && !spec.kind.is_collection() {
        return Err(SynthesisError::violation(
            &spec.name,
            "singular parameters must be collections",
        ));
    }
    match &spec.singular_name {
        Some(_) if !spec.singular => {
            return Err(SynthesisError::violation(
                &spec.name,
                "a singular name is only allowed on singular parameters",
            ))
        }
        Some(token) if !naming::is_identifier(token) => {
            return Err(SynthesisError::violation(
                &spec.name,
                format!("singular name `{}` is not a valid identifier", token),
            ))
        }
        _ => {}
    }

    if let Some(DefaultExpr::Literal(value)) = &spec.default {
        if !spec.kind.accepts(value) {
            return Err(SynthesisError::violation(
                &spec.name,
                format!(
                    "default value of type {} does not match {}",
                    value.describe(),
                    spec.kind
                ),
            ));
        }
    }
    Ok(())
}

/// Method names registered so far, for collision detection.
struct Surface<'s> {
    parameters: &'s [ParameterSpec],
    methods: IndexMap<String, MethodSpec>,
}

impl<'s> Surface<'s> {
    fn new(parameters: &'s [ParameterSpec]) -> Self {
        Self {
            parameters,
            methods: IndexMap::new(),
        }
    }

    fn register(&mut self, name: &str, spec: MethodSpec) -> SynthResult<()> {
        if let Some(existing) = self.methods.get(name) {
            return Err(SynthesisError::NamingCollision {
                method: name.to_string(),
                first: self.describe(existing),
                second: self.describe(&spec),
            });
        }
        self.methods.insert(name.to_string(), spec);
        Ok(())
    }

    fn describe(&self, spec: &MethodSpec) -> String {
        match spec.parameter.and_then(|i| self.parameters.get(i)) {
            Some(p) => format!("{} of `{}`", spec.kind, p.name),
            None => spec.kind.to_string(),
        }
    }
}
