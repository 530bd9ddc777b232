//! GPC category tree model and builder
//!
//! A JSON publication is one [`Categories`] document whose `Schema` holds the
//! root segments. Every node nests its sub-categories under `Childs`:
//!
//! ```text
//! Segment (Level 1) -> Family (2) -> Class (3) -> Brick (4) -> Attribute (5) -> Value (6)
//! ```
//!
//! [`build`] reconstructs the tree from raw JSON values, keeping the order of
//! children exactly as received, and refuses documents nested deeper than
//! [`MAX_DEPTH`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Maximum nesting depth accepted by [`build`].
pub const MAX_DEPTH: usize = 1000;

/// Taxonomy parsing errors
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    /// Document shape or nesting is outside what a taxonomy can be
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// IO error while reading the document
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for taxonomy operations
pub type TaxonomyResult<T> = Result<T, TaxonomyError>;

/// One node of the product-classification hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Category {
    /// Hierarchy level (1 = segment ... 6 = attribute value)
    pub level: u8,
    /// Numeric code, stable within one taxonomy snapshot
    pub code: u64,
    /// Title
    pub title: String,
    /// Long-form definition
    pub definition: String,
    /// What the category explicitly excludes
    pub definition_excludes: String,
    /// Whether the category is active
    pub active: bool,
    /// Ordered sub-categories, empty for leaves
    pub childs: Vec<Category>,
}

/// Scalar fields of a raw category node.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CategoryFields {
    level: u8,
    code: u64,
    title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    definition: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    definition_excludes: String,
    active: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Category {
    /// Whether the node has no sub-categories.
    pub fn is_leaf(&self) -> bool {
        self.childs.is_empty()
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Number of levels in this subtree (1 for a leaf).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.childs.iter().map(|c| (c, depth + 1)));
        }
        deepest
    }

    /// Pre-order iterator over this subtree.
    pub fn iter(&self) -> CategoryIter<'_> {
        CategoryIter { stack: vec![self] }
    }

    /// Find a node by code within this subtree.
    pub fn find(&self, code: u64) -> Option<&Category> {
        self.iter().find(|c| c.code == code)
    }
}

/// Depth-first, pre-order walk over a category forest.
pub struct CategoryIter<'a> {
    stack: Vec<&'a Category>,
}

impl<'a> Iterator for CategoryIter<'a> {
    type Item = &'a Category;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.childs.iter().rev());
        Some(node)
    }
}

/// A parsed JSON publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Categories {
    /// Language code of the publication (e.g. "EN")
    pub language_code: String,
    /// Human-formatted "as of" date, kept verbatim
    pub date_utc: String,
    /// Root segments in canonical order
    pub schema: Vec<Category>,
}

impl Categories {
    /// Pre-order iterator over every node of the document.
    pub fn iter(&self) -> CategoryIter<'_> {
        CategoryIter {
            stack: self.schema.iter().rev().collect(),
        }
    }

    /// Find a node anywhere in the document by code.
    pub fn find(&self, code: u64) -> Option<&Category> {
        self.iter().find(|c| c.code == code)
    }

    /// Total number of nodes in the document.
    pub fn node_count(&self) -> usize {
        self.schema.iter().map(Category::node_count).sum()
    }

    /// Count nodes per level, sorted by level.
    pub fn level_counts(&self) -> Vec<(u8, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for node in self.iter() {
            *counts.entry(node.level).or_insert(0usize) += 1;
        }
        counts.into_iter().collect()
    }

    /// Encode the document back into its nested JSON form.
    pub fn to_value(&self) -> TaxonomyResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| TaxonomyError::MalformedDocument(format!("cannot encode document: {e}")))
    }
}

/// Build an ordered category list from the raw `Childs`/`Schema` array.
///
/// `None`, `null` and `[]` all yield an empty list. Nesting is walked with an
/// explicit stack, so stack usage does not grow with document depth.
pub fn build(raw: Option<&Value>) -> TaxonomyResult<Vec<Category>> {
    let mut stack = vec![PendingLevel {
        parent: None,
        items: level_items(raw, 1)?.iter(),
        built: Vec::new(),
    }];

    while let Some(level) = stack.last_mut() {
        if let Some(item) = level.items.next() {
            let depth = stack.len();
            let (fields, childs) = read_node(item)?;
            stack.push(PendingLevel {
                parent: Some(fields),
                items: level_items(childs, depth + 1)?.iter(),
                built: Vec::new(),
            });
            continue;
        }

        let Some(done) = stack.pop() else { break };
        match (done.parent, stack.last_mut()) {
            (Some(fields), Some(outer)) => outer.built.push(fields.into_category(done.built)),
            _ => return Ok(done.built),
        }
    }

    Ok(Vec::new())
}

/// A sibling list still being built, with the node that owns it.
struct PendingLevel<'a> {
    parent: Option<CategoryFields>,
    items: std::slice::Iter<'a, Value>,
    built: Vec<Category>,
}

impl CategoryFields {
    fn into_category(self, childs: Vec<Category>) -> Category {
        Category {
            level: self.level,
            code: self.code,
            title: self.title,
            definition: self.definition,
            definition_excludes: self.definition_excludes,
            active: self.active,
            childs,
        }
    }
}

/// Items of one `Childs` array sitting at `depth` (roots are depth 1).
fn level_items(raw: Option<&Value>, depth: usize) -> TaxonomyResult<&[Value]> {
    let items = match raw {
        None | Some(Value::Null) => return Ok(&[][..]),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(TaxonomyError::MalformedDocument(format!(
                "expected an array of categories, found {}",
                value_kind(other)
            )))
        }
    };

    if !items.is_empty() && depth > MAX_DEPTH {
        return Err(TaxonomyError::MalformedDocument(format!(
            "category nesting exceeds {MAX_DEPTH} levels"
        )));
    }

    Ok(items.as_slice())
}

fn read_node(raw: &Value) -> TaxonomyResult<(CategoryFields, Option<&Value>)> {
    let Value::Object(map) = raw else {
        return Err(TaxonomyError::MalformedDocument(format!(
            "expected a category object, found {}",
            value_kind(raw)
        )));
    };

    // Childs is skipped as an unknown field here
    let fields = CategoryFields::deserialize(raw)
        .map_err(|e| TaxonomyError::MalformedDocument(format!("invalid category: {e}")))?;

    Ok((fields, map.get("Childs")))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a whole publication document from a JSON value.
pub fn parse_document(value: &Value) -> TaxonomyResult<Categories> {
    let Value::Object(map) = value else {
        return Err(TaxonomyError::MalformedDocument(format!(
            "expected a document object, found {}",
            value_kind(value)
        )));
    };

    let text_field = |name: &str| -> TaxonomyResult<String> {
        map.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TaxonomyError::MalformedDocument(format!("missing {name}")))
    };

    Ok(Categories {
        language_code: text_field("LanguageCode")?,
        date_utc: text_field("DateUtc")?,
        schema: build(map.get("Schema"))?,
    })
}

/// Parse a publication document from any reader.
pub fn parse_reader<R: Read>(reader: R) -> TaxonomyResult<Categories> {
    let value: Value = serde_json::from_reader(reader).map_err(|e| {
        if e.is_io() {
            TaxonomyError::IoError(e.to_string())
        } else {
            TaxonomyError::MalformedDocument(format!("invalid JSON: {e}"))
        }
    })?;
    parse_document(&value)
}

/// Parse a downloaded JSON publication file.
pub fn parse_file(path: &Path) -> TaxonomyResult<Categories> {
    let file = std::fs::File::open(path)
        .map_err(|e| TaxonomyError::IoError(format!("{}: {e}", path.display())))?;
    parse_reader(std::io::BufReader::new(file))
}
