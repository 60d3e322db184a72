//! Export format DSL types.
//!
//! An export format maps every output attribute to a [`FormatSpec`]: a plain
//! reference into the resolved query, a formatting action, or a null-check
//! condition. Actions and conditions nest arbitrarily.
//!
//! The wire shape is the one used by the export configuration:
//!
//! ```json
//! {
//!     "identificatie": "identificatie",
//!     "begindatum": {"action": "format", "formatter": "format_date", "value": "beginGeldigheid"},
//!     "status": {
//!         "condition": "isempty",
//!         "reference": "eindGeldigheid",
//!         "trueval": {"action": "literal", "value": "actief"},
//!         "falseval": {"action": "literal", "value": "historisch"}
//!     }
//! }
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Ordered mapping from export attribute to its format spec.
///
/// Insertion order is the output column order.
pub type FieldMapping = IndexMap<String, FormatSpec>;

/// How a single export attribute is computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormatSpec {
    /// A dotted logical path into the resolved query (e.g. `ligtInBuurt.code`).
    Reference(String),

    /// A null-check condition selecting one of two branches.
    Condition(Condition),

    /// A formatting action.
    Action(Action),
}

impl FormatSpec {
    /// Create a reference spec.
    pub fn reference(path: impl Into<String>) -> Self {
        Self::Reference(path.into())
    }

    /// Returns the reference path if this spec is a plain reference.
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference(path) => Some(path),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for FormatSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error as _;

        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(path) => Ok(Self::Reference(path)),
            Value::Object(object) => {
                let is_condition = object.contains_key("condition");
                let is_action = object.contains_key("action");
                let value = Value::Object(object);
                if is_condition {
                    serde_json::from_value(value)
                        .map(Self::Condition)
                        .map_err(D::Error::custom)
                } else if is_action {
                    serde_json::from_value(value)
                        .map(Self::Action)
                        .map_err(D::Error::custom)
                } else {
                    Err(D::Error::custom(format!(
                        "object has neither 'action' nor 'condition': {value}"
                    )))
                }
            }
            other => Err(D::Error::custom(format!(
                "expected a reference, an action or a condition, got {other}"
            ))),
        }
    }
}

/// A null-check condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// The condition kind (`isempty` or `isnone`).
    pub condition: ConditionKind,

    /// The value that is checked.
    pub reference: Box<FormatSpec>,

    /// Swap the branches.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub negate: bool,

    /// Value when the reference is NULL (NULL when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trueval: Option<Box<FormatSpec>>,

    /// Value when the reference is not NULL (NULL when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub falseval: Option<Box<FormatSpec>>,
}

/// Supported condition kinds.
///
/// `isempty` and `isnone` compile to the same NULL check. Empty strings and
/// zero values are not treated as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionKind {
    /// `isempty`
    IsEmpty,
    /// `isnone`
    IsNone,
    /// Any other condition name. Compiling it fails.
    Unsupported(String),
}

impl From<String> for ConditionKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "isempty" => Self::IsEmpty,
            "isnone" => Self::IsNone,
            _ => Self::Unsupported(name),
        }
    }
}

impl From<ConditionKind> for String {
    fn from(kind: ConditionKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IsEmpty => write!(f, "isempty"),
            Self::IsNone => write!(f, "isnone"),
            Self::Unsupported(name) => write!(f, "{name}"),
        }
    }
}

/// A formatting action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub enum Action {
    /// Apply a named formatter to a referenced value.
    Format {
        formatter: Formatter,
        value: String,
        kwargs: FormatKwargs,
    },

    /// A constant string.
    Literal { value: String },

    /// Concatenation of independently evaluated parts.
    Concat { fields: Vec<FormatSpec> },

    /// Pad a referenced value to a fixed length.
    Fill {
        value: String,
        fill_type: FillType,
        length: usize,
        character: String,
    },

    /// Map the values of a reference to labels.
    Case {
        reference: String,
        values: IndexMap<String, String>,
    },

    /// Any other action name. Compiling it fails.
    Unsupported { kind: String },
}

/// Keyword arguments of a `format` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatKwargs {
    /// Source date/time pattern (e.g. `%Y-%m-%d`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Any other keyword arguments, kept so that a misspelled `format` is
    /// not silently ignored.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl FormatKwargs {
    /// Whether no keyword argument is given at all.
    pub fn is_empty(&self) -> bool {
        self.format.is_none() && self.extra.is_empty()
    }
}

/// Padding direction of a `fill` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillType {
    /// Justify left: pad on the right.
    Ljust,
    /// Justify right: pad on the left.
    Rjust,
}

impl FillType {
    /// Parse a fill type. Anything but `ljust` justifies right.
    pub fn parse(s: &str) -> Self {
        if s == "ljust" { Self::Ljust } else { Self::Rjust }
    }

    /// The configuration name of this fill type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ljust => "ljust",
            Self::Rjust => "rjust",
        }
    }
}

/// Formatters known to the export configuration.
///
/// Every formatter with a rendering rule has its own variant; all other names
/// are kept in [`Formatter::Unimplemented`] so that compiling them fails with
/// the formatter name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Formatter {
    Geometry,
    SoortObject,
    Date,
    Timestamp,
    Kadgrootte,
    Koopsom,
    Bedrag,
    CommaConcatter,
    Rotation,
    Guid,
    Unimplemented(String),
}

impl From<String> for Formatter {
    fn from(name: String) -> Self {
        let short = name.strip_prefix("format_").unwrap_or(&name);
        match short {
            "geometry" => Self::Geometry,
            "soort_object" => Self::SoortObject,
            "date" => Self::Date,
            "timestamp" => Self::Timestamp,
            "kadgrootte" => Self::Kadgrootte,
            "koopsom" => Self::Koopsom,
            "bedrag" => Self::Bedrag,
            "comma_concatter" => Self::CommaConcatter,
            "rotation" => Self::Rotation,
            "guid" => Self::Guid,
            _ => Self::Unimplemented(name),
        }
    }
}

impl From<Formatter> for String {
    fn from(formatter: Formatter) -> Self {
        formatter.to_string()
    }
}

impl fmt::Display for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Geometry => "format_geometry",
            Self::SoortObject => "format_soort_object",
            Self::Date => "format_date",
            Self::Timestamp => "format_timestamp",
            Self::Kadgrootte => "format_kadgrootte",
            Self::Koopsom => "format_koopsom",
            Self::Bedrag => "format_bedrag",
            Self::CommaConcatter => "comma_concatter",
            Self::Rotation => "format_rotation",
            Self::Guid => "format_guid",
            Self::Unimplemented(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

/// Flat wire representation of an action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawAction {
    action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formatter: Option<Formatter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<FormatSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kwargs: Option<FormatKwargs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fill_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<IndexMap<String, String>>,
}

impl RawAction {
    fn required<T>(field: Option<T>, action: &str, name: &str) -> Result<T, String> {
        field.ok_or_else(|| format!("'{action}' action requires '{name}'"))
    }

    /// The `value` field as a string; scalars are stringified.
    fn value_string(&self) -> Result<String, String> {
        match &self.value {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(other) => Err(format!(
                "'{}' action has a non-scalar value: {other}",
                self.action
            )),
            None => Err(format!("'{}' action requires 'value'", self.action)),
        }
    }
}

impl TryFrom<RawAction> for Action {
    type Error = String;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let kind = raw.action.clone();
        let action = match kind.as_str() {
            "format" => Self::Format {
                value: raw.value_string()?,
                formatter: RawAction::required(raw.formatter, &kind, "formatter")?,
                kwargs: raw.kwargs.unwrap_or_default(),
            },
            "literal" => Self::Literal {
                value: raw.value_string()?,
            },
            "concat" => Self::Concat {
                fields: RawAction::required(raw.fields, &kind, "fields")?,
            },
            "fill" => Self::Fill {
                value: raw.value_string()?,
                fill_type: FillType::parse(raw.fill_type.as_deref().unwrap_or_default()),
                length: RawAction::required(raw.length, &kind, "length")?,
                character: RawAction::required(raw.character, &kind, "character")?,
            },
            "case" => Self::Case {
                reference: RawAction::required(raw.reference, &kind, "reference")?,
                values: RawAction::required(raw.values, &kind, "values")?,
            },
            _ => Self::Unsupported { kind },
        };
        Ok(action)
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Format {
                formatter,
                value,
                kwargs,
            } => Self {
                action: "format".into(),
                formatter: Some(formatter),
                value: Some(Value::String(value)),
                kwargs: (!kwargs.is_empty()).then_some(kwargs),
                ..Default::default()
            },
            Action::Literal { value } => Self {
                action: "literal".into(),
                value: Some(Value::String(value)),
                ..Default::default()
            },
            Action::Concat { fields } => Self {
                action: "concat".into(),
                fields: Some(fields),
                ..Default::default()
            },
            Action::Fill {
                value,
                fill_type,
                length,
                character,
            } => Self {
                action: "fill".into(),
                value: Some(Value::String(value)),
                fill_type: Some(fill_type.as_str().to_string()),
                length: Some(length),
                character: Some(character),
                ..Default::default()
            },
            Action::Case { reference, values } => Self {
                action: "case".into(),
                reference: Some(reference),
                values: Some(values),
                ..Default::default()
            },
            Action::Unsupported { kind } => Self {
                action: kind,
                ..Default::default()
            },
        }
    }
}

/// The format of an export product.
///
/// Products either carry a full [`FieldMapping`] or a pipe-delimited column
/// format (`"identificatie:str|naam:str"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductFormat {
    /// A column format string.
    Columns(String),

    /// A field mapping.
    Mapping(FieldMapping),
}

impl ProductFormat {
    /// Whether the format defines no columns.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Columns(format) => format.trim().is_empty(),
            Self::Mapping(mapping) => mapping.is_empty(),
        }
    }

    /// Convert this format into a field mapping.
    pub fn into_mapping(self) -> FieldMapping {
        match self {
            Self::Columns(format) => column_format_to_mapping(&format),
            Self::Mapping(mapping) => mapping,
        }
    }
}

/// Convert a pipe-delimited column format into a field mapping.
///
/// Each column definition `source:type` becomes `col_<index> -> source`.
pub fn column_format_to_mapping(format: &str) -> FieldMapping {
    format
        .split('|')
        .enumerate()
        .map(|(index, column)| {
            let source = column.split(':').next().unwrap_or_default();
            (format!("col_{index}"), FormatSpec::reference(source))
        })
        .collect()
}
