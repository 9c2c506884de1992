//! Questionnaire items that answer tokens can refer to

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::Type;
use crate::error::Result;

/// One answerable questionnaire item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireItem {
    /// Type of the item's answer value
    #[serde(rename = "type")]
    pub item_type: Type,
    /// Question text shown to the user
    #[serde(default)]
    pub text: String,
}

/// Ordered mapping from link id to questionnaire item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionnaireItemRegistry {
    items: IndexMap<String, QuestionnaireItem>,
}

impl QuestionnaireItem {
    /// Create an item
    pub fn new(item_type: Type, text: impl Into<String>) -> Self {
        Self {
            item_type,
            text: text.into(),
        }
    }
}

impl QuestionnaireItemRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an item
    pub fn insert(&mut self, link_id: impl Into<String>, item: QuestionnaireItem) {
        self.items.insert(link_id.into(), item);
    }

    /// Look up an item by link id
    pub fn get(&self, link_id: &str) -> Option<&QuestionnaireItem> {
        self.items.get(link_id)
    }

    /// Check if a link id is known
    pub fn contains(&self, link_id: &str) -> bool {
        self.items.contains_key(link_id)
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in questionnaire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QuestionnaireItem)> {
        self.items.iter().map(|(id, item)| (id.as_str(), item))
    }

    /// Parse a Questionnaire resource from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let questionnaire: Value = serde_json::from_str(json)?;
        Ok(Self::from_questionnaire(&questionnaire))
    }

    /// Collect the answerable items of a Questionnaire resource, nested items included
    pub fn from_questionnaire(questionnaire: &Value) -> Self {
        let mut registry = Self::new();
        registry.collect(questionnaire);
        log::debug!("loaded {} questionnaire items", registry.len());
        registry
    }

    fn collect(&mut self, parent: &Value) {
        let Some(children) = parent.get("item").and_then(Value::as_array) else {
            return;
        };

        for item in children {
            let link_id = item.get("linkId").and_then(Value::as_str);
            let kind = item.get("type").and_then(Value::as_str).unwrap_or("group");
            let repeats = item
                .get("repeats")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            if let (Some(link_id), Some(answer_type)) = (link_id, answer_type(kind, repeats)) {
                let text = item.get("text").and_then(Value::as_str).unwrap_or("");
                self.insert(link_id, QuestionnaireItem::new(answer_type, text));
            } else if !matches!(kind, "group" | "display") {
                log::debug!("skipping questionnaire item of type {kind}");
            }

            self.collect(item);
        }
    }
}

/// Answer type of a questionnaire item type; `None` for items that take no answer
fn answer_type(kind: &str, repeats: bool) -> Option<Type> {
    let element = match kind {
        "boolean" => vec![Type::Boolean],
        "decimal" => vec![Type::Decimal],
        "integer" => vec![Type::Integer],
        "date" => vec![Type::Date],
        "dateTime" => vec![Type::DateTime],
        "time" => vec![Type::Time],
        "string" | "text" | "url" => vec![Type::String],
        "choice" => vec![Type::complex(["Coding"])],
        "open-choice" => vec![Type::complex(["Coding"]), Type::String],
        "quantity" => vec![Type::Quantity],
        "reference" => vec![Type::complex(["Reference"])],
        "attachment" => vec![Type::complex(["Attachment"])],
        _ => return None,
    };

    let alternatives = element
        .into_iter()
        .map(|t| if repeats { t } else { Type::single(t) })
        .collect();
    Some(Type::choice(alternatives))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_questionnaire_walks_nested_items() {
        let questionnaire = json!({
            "resourceType": "Questionnaire",
            "item": [
                {"linkId": "intro", "type": "display", "text": "Welcome"},
                {"linkId": "vitals", "type": "group", "item": [
                    {"linkId": "weight", "type": "quantity", "text": "Weight"},
                    {"linkId": "smoker", "type": "boolean", "text": "Smoker?"}
                ]},
                {"linkId": "allergies", "type": "open-choice", "repeats": true}
            ]
        });

        let registry = QuestionnaireItemRegistry::from_questionnaire(&questionnaire);
        let ids: Vec<&str> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["weight", "smoker", "allergies"]);

        assert_eq!(
            registry.get("weight").map(|item| &item.item_type),
            Some(&Type::single(Type::Quantity))
        );
        assert_eq!(
            registry.get("smoker").map(|item| item.text.as_str()),
            Some("Smoker?")
        );
        assert_eq!(
            registry.get("allergies").map(|item| &item.item_type),
            Some(&Type::choice(vec![Type::complex(["Coding"]), Type::String]))
        );
        assert!(!registry.contains("intro"));
    }

    #[test]
    fn test_unknown_item_type_is_skipped() {
        let questionnaire = json!({"item": [{"linkId": "x", "type": "mystery"}]});
        let registry = QuestionnaireItemRegistry::from_questionnaire(&questionnaire);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(QuestionnaireItemRegistry::from_json("[").is_err());
    }
}
