//! Field resolution against a FHIR structure schema
//!
//! The expression engine only needs one question answered about the data
//! model: which fields does a value of a given type expose, and what are their
//! types. [`FieldResolver`] is that boundary. [`FhirSchema`] answers it from a
//! compact JSON description of FHIR structure definitions; a subset of R4 is
//! bundled with the crate.

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::types::{Type, normalize_choice};
use crate::error::{EditorError, Result};

/// Maximum depth of `base` inheritance followed while collecting elements
const MAX_INHERITANCE_DEPTH: usize = 16;

/// Resolves the fields exposed by a type
pub trait FieldResolver: Send + Sync {
    /// Field name to field type. Total: a type without fields yields an empty map.
    fn fields(&self, ty: &Type) -> IndexMap<String, Type>;

    /// Names of structural types that can be referenced by `type` tokens
    fn type_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Schema-backed field resolver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FhirSchema {
    /// Type name to definition
    pub types: IndexMap<String, TypeDefinition>,
}

/// Definition of one named FHIR type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Type whose elements are inherited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Own elements, in declaration order
    #[serde(default)]
    pub elements: IndexMap<String, ElementDefinition>,
}

/// Definition of one element of a type or backbone element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDefinition {
    /// FHIR type name of the element, absent for backbone and choice elements
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Whether the element repeats
    #[serde(default)]
    pub array: bool,
    /// Allowed types of a `[x]` choice element
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    /// Inline elements of a backbone element
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub elements: IndexMap<String, ElementDefinition>,
}

static BUNDLED: LazyLock<FhirSchema> = LazyLock::new(|| {
    FhirSchema::from_json(include_str!("../../resources/fhir_schema.json")).unwrap_or_else(
        |error| {
            log::error!("bundled FHIR schema is malformed: {error}");
            FhirSchema::default()
        },
    )
});

/// Map a FHIR primitive or system type name to its system type
pub fn primitive_type(name: &str) -> Option<Type> {
    let ty = match name {
        "boolean" | "Boolean" => Type::Boolean,
        "integer" | "positiveInt" | "unsignedInt" | "integer64" | "Integer" => Type::Integer,
        "decimal" | "Decimal" => Type::Decimal,
        "string" | "code" | "id" | "uri" | "url" | "canonical" | "markdown" | "oid" | "uuid"
        | "base64Binary" | "xhtml" | "String" => Type::String,
        "date" | "Date" => Type::Date,
        "dateTime" | "instant" | "DateTime" => Type::DateTime,
        "time" | "Time" => Type::Time,
        "Quantity" | "Age" | "Duration" | "Count" | "Distance" | "SimpleQuantity"
        | "MoneyQuantity" => Type::Quantity,
        _ => return None,
    };
    Some(ty)
}

impl FhirSchema {
    /// Parse a schema from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(EditorError::from)
    }

    /// Read and parse a schema file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| EditorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The bundled R4 subset
    pub fn bundled() -> &'static FhirSchema {
        &BUNDLED
    }

    /// Number of defined types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the schema defines no types
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Own and inherited elements of a named type, base elements first
    fn type_elements(&self, name: &str) -> IndexMap<&str, &ElementDefinition> {
        let mut chain = Vec::new();
        let mut current = self.types.get(name);
        while let Some(definition) = current {
            if chain.len() >= MAX_INHERITANCE_DEPTH {
                log::warn!("inheritance chain of {name} is too deep, truncating");
                break;
            }
            chain.push(definition);
            current = definition
                .base
                .as_deref()
                .and_then(|base| self.types.get(base));
        }

        let mut elements = IndexMap::new();
        for definition in chain.into_iter().rev() {
            for (field, element) in &definition.elements {
                elements.insert(field.as_str(), element);
            }
        }
        elements
    }

    /// Elements addressed by a complex type path such as `["QuestionnaireResponse", "item"]`
    fn path_elements(&self, path: &[String]) -> IndexMap<&str, &ElementDefinition> {
        self.path_elements_visiting(path, &mut FxHashSet::default())
    }

    /// Follows dotted element types, yielding nothing once a path repeats
    fn path_elements_visiting(
        &self,
        path: &[String],
        visited: &mut FxHashSet<String>,
    ) -> IndexMap<&str, &ElementDefinition> {
        let Some((root, rest)) = path.split_first() else {
            return IndexMap::new();
        };
        let dotted = path.join(".");
        if !visited.insert(dotted.clone()) {
            log::warn!("element type {dotted} refers to itself");
            return IndexMap::new();
        }

        let mut elements = self.type_elements(root);
        for segment in rest {
            let Some(element) = elements.get(segment.as_str()).copied() else {
                elements = IndexMap::new();
                break;
            };
            elements = if !element.elements.is_empty() {
                element
                    .elements
                    .iter()
                    .map(|(field, element)| (field.as_str(), element))
                    .collect()
            } else if let Some(type_name) = &element.type_name {
                let path: Vec<String> = type_name.split('.').map(str::to_string).collect();
                self.path_elements_visiting(&path, visited)
            } else {
                IndexMap::new()
            };
        }
        visited.remove(&dotted);
        elements
    }

    fn element_type(&self, owner: &[String], field: &str, element: &ElementDefinition) -> Type {
        if !element.elements.is_empty() {
            let mut path = owner.to_vec();
            path.push(field.to_string());
            return Type::Complex(path);
        }
        match &element.type_name {
            Some(name) => named_type(name),
            // An element without a type and without children carries no information
            None => Type::Null,
        }
    }

    fn fields_of(&self, ty: &Type, single: bool) -> IndexMap<String, Type> {
        let (path, elements) = match ty {
            Type::Complex(path) => (path.clone(), self.path_elements(path)),
            other if other.is_primitive() => {
                let name = other.element_name();
                (vec![name.clone()], self.type_elements(&name))
            }
            _ => return IndexMap::new(),
        };

        let mut fields = IndexMap::new();
        for (name, element) in elements {
            let field_single = single && !element.array;
            let wrap = |t: Type| if field_single { Type::single(t) } else { t };

            if !element.choices.is_empty() {
                let base = name.strip_suffix("[x]").unwrap_or(name);
                let alternatives: Vec<Type> = element
                    .choices
                    .iter()
                    .map(|choice| wrap(named_type(choice)))
                    .collect();
                fields.insert(base.to_string(), normalize_choice(alternatives));
                for choice in &element.choices {
                    fields.insert(
                        format!("{base}{}", capitalize(choice)),
                        wrap(named_type(choice)),
                    );
                }
            } else {
                let ty = wrap(self.element_type(&path, name, element));
                fields.insert(name.to_string(), ty);
            }
        }
        fields
    }
}

impl FieldResolver for FhirSchema {
    fn fields(&self, ty: &Type) -> IndexMap<String, Type> {
        match ty {
            Type::Single(inner) => match inner.as_ref() {
                Type::Choice(alternatives) => merge_fields(
                    alternatives
                        .iter()
                        .map(|alt| self.fields(&Type::single(alt.clone()))),
                ),
                other => self.fields_of(other, true),
            },
            Type::Choice(alternatives) => {
                merge_fields(alternatives.iter().map(|alt| self.fields(alt)))
            }
            other => self.fields_of(other, false),
        }
    }

    fn type_names(&self) -> Vec<String> {
        self.types
            .keys()
            .filter(|name| primitive_type(name).is_none())
            .cloned()
            .collect()
    }
}

impl<R: FieldResolver + ?Sized> FieldResolver for &R {
    fn fields(&self, ty: &Type) -> IndexMap<String, Type> {
        (**self).fields(ty)
    }

    fn type_names(&self) -> Vec<String> {
        (**self).type_names()
    }
}

/// Type of an element declared by name; dotted names address backbone elements
fn named_type(name: &str) -> Type {
    primitive_type(name).unwrap_or_else(|| Type::complex(name.split('.')))
}

/// Union of field maps; a name present with different types becomes a choice
fn merge_fields(maps: impl Iterator<Item = IndexMap<String, Type>>) -> IndexMap<String, Type> {
    let mut merged: IndexMap<String, Type> = IndexMap::new();
    for map in maps {
        for (name, ty) in map {
            match merged.get_mut(&name) {
                Some(existing) if *existing != ty => {
                    *existing = normalize_choice(vec![existing.clone(), ty]);
                }
                Some(_) => {}
                None => {
                    merged.insert(name, ty);
                }
            }
        }
    }
    merged
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> &'static FhirSchema {
        FhirSchema::bundled()
    }

    #[test]
    fn test_bundled_schema_loads() {
        assert!(!schema().is_empty());
        assert!(schema().types.contains_key("Patient"));
        assert!(schema().types.contains_key("QuestionnaireResponse"));
    }

    #[test]
    fn test_single_receiver_keeps_cardinality() {
        let fields = schema().fields(&Type::single(Type::complex(["Patient"])));
        assert_eq!(fields.get("gender"), Some(&Type::single(Type::String)));
        assert_eq!(fields.get("name"), Some(&Type::complex(["HumanName"])));
        assert_eq!(fields.get("birthDate"), Some(&Type::single(Type::Date)));
    }

    #[test]
    fn test_collection_receiver_yields_collections() {
        let fields = schema().fields(&Type::complex(["Patient"]));
        assert_eq!(fields.get("gender"), Some(&Type::String));
    }

    #[test]
    fn test_inherited_elements() {
        let fields = schema().fields(&Type::single(Type::complex(["Patient"])));
        assert_eq!(fields.get("id"), Some(&Type::single(Type::String)));
        assert!(fields.contains_key("extension"));
    }

    #[test]
    fn test_backbone_elements() {
        let fields = schema().fields(&Type::single(Type::complex(["QuestionnaireResponse"])));
        assert_eq!(
            fields.get("item"),
            Some(&Type::complex(["QuestionnaireResponse", "item"]))
        );

        let answer = schema().fields(&Type::complex(["QuestionnaireResponse", "item", "answer"]));
        assert!(matches!(answer.get("value"), Some(Type::Choice(_))));
        assert_eq!(answer.get("valueBoolean"), Some(&Type::Boolean));
        assert_eq!(answer.get("valueCoding"), Some(&Type::complex(["Coding"])));
    }

    #[test]
    fn test_recursive_backbone_reference() {
        let fields = schema().fields(&Type::complex(["QuestionnaireResponse", "item"]));
        assert_eq!(
            fields.get("item"),
            Some(&Type::complex(["QuestionnaireResponse", "item"]))
        );
        let nested = schema().fields(&Type::complex(["QuestionnaireResponse", "item", "item"]));
        assert!(nested.contains_key("linkId"));
        let path = ["QuestionnaireResponse", "item", "item", "item"];
        let deeper = schema().fields(&Type::complex(path));
        assert!(deeper.contains_key("linkId"));
    }

    #[test]
    fn test_system_type_fields() {
        let fields = schema().fields(&Type::single(Type::Quantity));
        assert_eq!(fields.get("unit"), Some(&Type::single(Type::String)));
        assert_eq!(fields.get("value"), Some(&Type::single(Type::Decimal)));
        assert!(schema().fields(&Type::single(Type::String)).is_empty());
    }

    #[test]
    fn test_choice_receiver_merges_fields() {
        let receiver = Type::choice(vec![
            Type::single(Type::complex(["Patient"])),
            Type::single(Type::complex(["Observation"])),
        ]);
        let fields = schema().fields(&receiver);
        assert!(fields.contains_key("gender"));
        assert!(fields.contains_key("status"));
        assert_eq!(fields.get("id"), Some(&Type::single(Type::String)));
    }

    #[test]
    fn test_unknown_types_have_no_fields() {
        assert!(schema().fields(&Type::complex(["Nope"])).is_empty());
        assert!(schema().fields(&Type::Null).is_empty());
        assert!(schema().fields(&Type::generic("T")).is_empty());
    }

    #[test]
    fn test_type_names_exclude_primitives() {
        let names = schema().type_names();
        assert!(names.contains(&"Patient".to_string()));
        assert!(!names.contains(&"Quantity".to_string()));
    }

    #[test]
    fn test_self_referential_element_type_has_no_fields() {
        let schema = FhirSchema::from_json(
            r#"{"Q": {"elements": {"item": {"type": "Q.item"}, "code": {"type": "string"}}}}"#,
        )
        .unwrap();

        let fields = schema.fields(&Type::complex(["Q"]));
        assert_eq!(fields.get("item"), Some(&Type::complex(["Q", "item"])));
        assert!(schema.fields(&Type::complex(["Q", "item"])).is_empty());
        let nested = schema.fields(&Type::complex(["Q", "item", "item"]));
        assert!(nested.is_empty());
    }

    #[test]
    fn test_malformed_schema_is_an_error() {
        assert!(FhirSchema::from_json("{ not json").is_err());
    }
}
