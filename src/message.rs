use std::collections::HashMap;

use serde_json::Value;

use crate::plural::PluralCategory;

/// A node in a locale's message tree.
///
/// Trees are closed tagged variants rather than raw JSON values:
/// resolution pattern-matches instead of inspecting runtime types.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageNode {
    /// A translatable template string
    Leaf(String),
    /// Plural variants selected by count
    Plural(PluralForms),
    /// A nested subtree keyed by path segment
    Branch(HashMap<String, MessageNode>),
}

/// Plural variants for a single message.
///
/// `=N` entries override the CLDR category for an exact integer count.
/// `other` is the mandatory catch-all, checked at selection time so a
/// single bad entry cannot fail message loading as a whole.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PluralForms {
    exact: HashMap<i64, String>,
    categories: HashMap<PluralCategory, String>,
}

impl PluralForms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_exact(&mut self, count: i64, template: String) {
        self.exact.insert(count, template);
    }

    pub fn insert_category(&mut self, category: PluralCategory, template: String) {
        self.categories.insert(category, template);
    }

    pub fn exact(&self, count: i64) -> Option<&str> {
        self.exact.get(&count).map(|s| s.as_str())
    }

    pub fn category(&self, category: PluralCategory) -> Option<&str> {
        self.categories.get(&category).map(|s| s.as_str())
    }

    pub fn has_other(&self) -> bool {
        self.categories.contains_key(&PluralCategory::Other)
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.categories.is_empty()
    }
}

/// Is this JSON object key a plural selector (`one`, `other`, `=3`, ...)?
fn plural_selector(key: &str) -> bool {
    if let Some(rest) = key.strip_prefix('=') {
        rest.parse::<i64>().is_ok()
    } else {
        PluralCategory::parse(key).is_some()
    }
}

impl MessageNode {
    /// Convert a loaded JSON value into a message tree.
    ///
    /// Strings become leaves. Objects whose keys are all plural
    /// selectors with string values become plural forms; any other
    /// object becomes a branch. Arrays become branches keyed by the
    /// stringified index, so `items.0.name` resolves by plain segment
    /// equality. Scalars are stringified into leaves.
    pub fn from_json(value: &Value) -> Option<MessageNode> {
        match value {
            Value::String(s) => Some(MessageNode::Leaf(s.clone())),
            Value::Number(n) => Some(MessageNode::Leaf(n.to_string())),
            Value::Bool(b) => Some(MessageNode::Leaf(b.to_string())),
            Value::Null => None,
            Value::Array(items) => {
                let mut children = HashMap::new();
                for (index, item) in items.iter().enumerate() {
                    if let Some(node) = MessageNode::from_json(item) {
                        children.insert(index.to_string(), node);
                    }
                }
                Some(MessageNode::Branch(children))
            }
            Value::Object(map) => {
                let is_plural = !map.is_empty()
                    && map
                        .iter()
                        .all(|(k, v)| plural_selector(k) && v.is_string());
                if is_plural {
                    let mut forms = PluralForms::new();
                    for (k, v) in map {
                        let template = v.as_str().unwrap_or_default().to_string();
                        if let Some(rest) = k.strip_prefix('=') {
                            if let Ok(count) = rest.parse::<i64>() {
                                forms.insert_exact(count, template);
                            }
                        } else if let Some(category) = PluralCategory::parse(k) {
                            forms.insert_category(category, template);
                        }
                    }
                    Some(MessageNode::Plural(forms))
                } else {
                    let mut children = HashMap::new();
                    for (k, v) in map {
                        if let Some(node) = MessageNode::from_json(v) {
                            children.insert(k.clone(), node);
                        }
                    }
                    Some(MessageNode::Branch(children))
                }
            }
        }
    }

    /// Child lookup on branches; leaves and plural forms have none.
    pub fn child(&self, segment: &str) -> Option<&MessageNode> {
        match self {
            MessageNode::Branch(children) => children.get(segment),
            _ => None,
        }
    }

    /// Deep-merge another tree into this one.
    ///
    /// Branches merge recursively; any other collision is replaced by
    /// the incoming node.
    pub fn merge(&mut self, other: MessageNode) {
        match (self, other) {
            (MessageNode::Branch(existing), MessageNode::Branch(incoming)) => {
                for (key, node) in incoming {
                    match existing.get_mut(&key) {
                        Some(current) => current.merge(node),
                        None => {
                            existing.insert(key, node);
                        }
                    }
                }
            }
            (slot, incoming) => *slot = incoming,
        }
    }

    /// An empty branch, the starting point for merges.
    pub fn empty() -> MessageNode {
        MessageNode::Branch(HashMap::new())
    }
}
