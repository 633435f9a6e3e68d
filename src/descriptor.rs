//! JSON schema descriptors.
//!
//! A descriptor is the hand-written form of a [`Schema`]:
//!
//! ```json
//! {
//!   "product": "Student",
//!   "parameters": [
//!     { "name": "name", "type": "text" },
//!     { "name": "lessons", "type": "text", "collection": "set", "singular": true },
//!     { "name": "teacher", "type": "text", "default": "Mrs. White" }
//!   ]
//! }
//! ```
//!
//! Custom comparators and computed defaults have no JSON form and must be
//! attached through the [`Schema`] API.

use crate::config::CollectionFamily;
use crate::materialize::{collect, collect_entries};
use crate::schema::{DefaultExpr, ElementOrder, ParameterSpec, Schema, Shape, TypeKind};
use crate::value::{Scalar, ScalarType, Value};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid descriptor for `{parameter}`: {reason}")]
    Invalid { parameter: String, reason: String },
}

pub type DescriptorResult<T> = Result<T, DescriptorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionDescriptor {
    List,
    Set,
    SortedSet,
    Map,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDescriptor {
    #[default]
    Natural,
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    /// Scalar type, or element/key type for collections.
    #[serde(rename = "type")]
    pub ty: ScalarType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionDescriptor>,
    /// Map value type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ScalarType>,
    #[serde(default)]
    pub order: OrderDescriptor,
    #[serde(default)]
    pub singular: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singular_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter_prefix: Option<String>,
    #[serde(default = "default_build_method")]
    pub build_method: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
}

fn default_build_method() -> String {
    "build".to_string()
}

impl SchemaDescriptor {
    /// Converts to a [`Schema`]. Collection defaults are materialized in
    /// `family`.
    pub fn into_schema(self, family: CollectionFamily) -> DescriptorResult<Schema> {
        let mut schema = match &self.factory {
            Some(factory) => Schema::factory(&self.product, factory),
            None => Schema::constructor(&self.product),
        }
        .with_build_method(&self.build_method);
        if let Some(prefix) = &self.setter_prefix {
            schema = schema.with_setter_prefix(prefix);
        }
        for parameter in self.parameters {
            schema = schema.with_parameter(parameter.into_spec(family)?);
        }
        Ok(schema)
    }
}

impl ParameterDescriptor {
    fn into_spec(self, family: CollectionFamily) -> DescriptorResult<ParameterSpec> {
        let kind = self.kind()?;
        let mut spec = ParameterSpec::new(&self.name, kind.clone());
        if self.singular {
            spec = spec.singular();
        }
        // Without `singular` this is left for synthesis to reject.
        spec.singular_name = self.singular_name.clone();
        if let Some(default) = &self.default {
            let literal = self.literal(&kind, default, family)?;
            spec = spec.with_default(DefaultExpr::literal(literal));
        }
        Ok(spec)
    }

    fn kind(&self) -> DescriptorResult<TypeKind> {
        let order = match self.order {
            OrderDescriptor::Natural => ElementOrder::Natural,
            OrderDescriptor::Reverse => ElementOrder::Reverse,
        };
        if self.order != OrderDescriptor::Natural
            && self.collection != Some(CollectionDescriptor::SortedSet)
        {
            return Err(self.invalid("`order` only applies to sorted sets"));
        }
        // Shape/value-type agreement is left to synthesis.
        let shape = match self.collection {
            None => {
                if self.value_type.is_some() {
                    return Err(self.invalid("`value_type` requires `collection: map`"));
                }
                return Ok(TypeKind::Scalar(self.ty));
            }
            Some(CollectionDescriptor::List) => Shape::List,
            Some(CollectionDescriptor::Set) => Shape::Set,
            Some(CollectionDescriptor::SortedSet) => Shape::SortedSet(order),
            Some(CollectionDescriptor::Map) => Shape::Map,
        };
        Ok(TypeKind::Collection {
            element: self.ty,
            value: self.value_type,
            shape,
        })
    }

    fn literal(
        &self,
        kind: &TypeKind,
        json: &serde_json::Value,
        family: CollectionFamily,
    ) -> DescriptorResult<Value> {
        match kind {
            TypeKind::Scalar(ty) => Ok(Value::Scalar(self.scalar(*ty, json)?)),
            TypeKind::Collection {
                element,
                value: Some(value_type),
                shape: Shape::Map,
            } => {
                let object = json
                    .as_object()
                    .ok_or_else(|| self.invalid("map default must be a JSON object"))?;
                let mut entries = Vec::with_capacity(object.len());
                for (key, value) in object {
                    let key = self.scalar(*element, &serde_json::Value::String(key.clone()))?;
                    entries.push((key, self.scalar(*value_type, value)?));
                }
                Ok(Value::Collection(collect_entries(family, entries)))
            }
            TypeKind::Collection { element, shape, .. } => {
                let array = json
                    .as_array()
                    .ok_or_else(|| self.invalid("collection default must be a JSON array"))?;
                let items = array
                    .iter()
                    .map(|item| self.scalar(*element, item))
                    .collect::<DescriptorResult<Vec<_>>>()?;
                Ok(Value::Collection(collect(shape, family, items)))
            }
        }
    }

    /// Map keys arrive as JSON strings and are parsed for non-text key types.
    fn scalar(&self, ty: ScalarType, json: &serde_json::Value) -> DescriptorResult<Scalar> {
        let parsed = match (ty, json) {
            (ScalarType::Bool, serde_json::Value::Bool(b)) => Some(Scalar::Bool(*b)),
            (ScalarType::Int, serde_json::Value::Number(n)) => n.as_i64().map(Scalar::Int),
            (ScalarType::Int, serde_json::Value::String(s)) => s.parse().ok().map(Scalar::Int),
            (ScalarType::Float, serde_json::Value::Number(n)) => n.as_f64().map(Scalar::Float),
            (ScalarType::Float, serde_json::Value::String(s)) => s.parse().ok().map(Scalar::Float),
            (ScalarType::Bool, serde_json::Value::String(s)) => s.parse().ok().map(Scalar::Bool),
            (ScalarType::Text, serde_json::Value::String(s)) => Some(Scalar::Text(s.clone())),
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid(format!("default {} is not a valid {}", json, ty)))
    }

    fn invalid(&self, reason: impl Into<String>) -> DescriptorError {
        DescriptorError::Invalid {
            parameter: self.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Parses a JSON descriptor into a [`Schema`].
pub fn parse_schema(json: &str, family: CollectionFamily) -> DescriptorResult<Schema> {
    let descriptor: SchemaDescriptor = serde_json::from_str(json)?;
    descriptor.into_schema(family)
}

/// Reads and parses a JSON descriptor file.
pub fn load_schema(path: impl AsRef<Path>, family: CollectionFamily) -> DescriptorResult<Schema> {
    let json = fs::read_to_string(path)?;
    parse_schema(&json, family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Target;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const STUDENT: &str = r#"{
        "product": "Student",
        "factory": "enroll",
        "setter_prefix": "with",
        "parameters": [
            { "name": "name", "type": "text" },
            { "name": "lessons", "type": "text", "collection": "set", "singular": true },
            { "name": "grades", "type": "text", "collection": "map", "value_type": "int",
              "singular": true, "singular_name": "score" },
            { "name": "ranks", "type": "int", "collection": "sorted_set", "order": "reverse" },
            { "name": "teacher", "type": "text", "default": "Mrs. White" }
        ]
    }"#;

    #[test]
    fn test_parse_full_descriptor() {
        let schema = parse_schema(STUDENT, CollectionFamily::Frozen).unwrap();
        assert_eq!(schema.product, "Student");
        assert_eq!(schema.target, Target::Factory("enroll".into()));
        assert_eq!(schema.setter_prefix.as_deref(), Some("with"));
        assert_eq!(schema.build_method, "build");
        assert_eq!(schema.parameters.len(), 5);

        let lessons = schema.get("lessons").unwrap();
        assert!(lessons.singular);
        assert_eq!(lessons.kind.to_string(), "set<text>");

        let grades = schema.get("grades").unwrap();
        assert_eq!(grades.singular_name.as_deref(), Some("score"));
        assert_eq!(grades.kind.to_string(), "map<text, int>");

        let ranks = schema.get("ranks").unwrap();
        assert!(matches!(
            ranks.kind.shape(),
            Some(Shape::SortedSet(ElementOrder::Reverse))
        ));

        let teacher = schema.get("teacher").unwrap();
        assert_eq!(
            teacher.default.as_ref().map(DefaultExpr::evaluate),
            Some(Value::from("Mrs. White"))
        );
    }

    #[test]
    fn test_collection_defaults() {
        let json = r#"{
            "product": "Course",
            "parameters": [
                { "name": "tags", "type": "text", "collection": "list", "default": ["core", "core"] },
                { "name": "credits", "type": "int", "collection": "map", "value_type": "int",
                  "default": { "1": 10, "2": 20 } }
            ]
        }"#;
        let schema = parse_schema(json, CollectionFamily::Frozen).unwrap();

        let tags = schema.get("tags").unwrap().default.as_ref().unwrap().evaluate();
        assert_eq!(tags.as_collection().map(|c| c.len()), Some(2));

        let credits = schema.get("credits").unwrap().default.as_ref().unwrap().evaluate();
        let credits = credits.as_collection().unwrap();
        assert_eq!(credits.get(&Scalar::Int(2)), Some(&Scalar::Int(20)));
    }

    #[test]
    fn test_default_of_wrong_type_is_invalid() {
        let json = r#"{
            "product": "Class",
            "parameters": [ { "name": "room", "type": "int", "default": "B12" } ]
        }"#;
        match parse_schema(json, CollectionFamily::Frozen) {
            Err(DescriptorError::Invalid { parameter, .. }) => assert_eq!(parameter, "room"),
            other => panic!("expected invalid descriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_singular_name_without_singular_is_rejected_by_synthesis() {
        use crate::config::SynthConfig;
        use crate::error::SynthesisError;
        use crate::synth::synthesize;

        let json = r#"{
            "product": "Post",
            "parameters": [
                { "name": "tags", "type": "text", "collection": "list", "singular_name": "tag" }
            ]
        }"#;
        let schema = parse_schema(json, CollectionFamily::Frozen).unwrap();
        let tags = schema.get("tags").unwrap();
        assert!(!tags.singular);
        assert_eq!(tags.singular_name.as_deref(), Some("tag"));
        assert!(matches!(
            synthesize(&schema, &SynthConfig::default()),
            Err(SynthesisError::SchemaViolation { ref parameter, .. }) if parameter == "tags"
        ));
    }

    #[test]
    fn test_order_requires_sorted_set() {
        let json = r#"{
            "product": "Class",
            "parameters": [ { "name": "ids", "type": "int", "collection": "set", "order": "reverse" } ]
        }"#;
        assert!(matches!(
            parse_schema(json, CollectionFamily::Frozen),
            Err(DescriptorError::Invalid { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_schema("{ \"product\": ", CollectionFamily::Frozen),
            Err(DescriptorError::Json(_))
        ));
        assert!(matches!(
            parse_schema(r#"{ "parameters": [] }"#, CollectionFamily::Frozen),
            Err(DescriptorError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(STUDENT.as_bytes()).unwrap();

        let schema = load_schema(file.path(), CollectionFamily::Persistent).unwrap();
        assert_eq!(schema.parameters.len(), 5);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_schema(dir.path().join("missing.json"), CollectionFamily::Frozen);
        assert!(matches!(result, Err(DescriptorError::Io(_))));
    }

    #[test]
    fn test_descriptor_round_trips_through_serde() {
        let descriptor: SchemaDescriptor = serde_json::from_str(STUDENT).unwrap();
        let json = serde_json::to_string(&descriptor).unwrap();
        let again: SchemaDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(descriptor, again);
    }
}
