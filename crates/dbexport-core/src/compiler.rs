//! Format-expression compilation.
//!
//! This module evaluates [`FormatSpec`] values against a
//! [`BaseExpressionRegistry`] and assembles the SELECT list of an export
//! query in Databricks SQL.

use std::collections::HashSet;
use std::fmt;

use crate::dialect::{DATE_PATTERN, DEFAULT_TIMESTAMP_PATTERN, DatabricksDialect};
use crate::format_spec::{
    Action, Condition, ConditionKind, FieldMapping, FillType, FormatKwargs, FormatSpec, Formatter,
};
use crate::registry::{BaseExpressionRegistry, to_snake};
use crate::{Error, Result};

const NULL: &str = "NULL";

/// Attribute that shape exports add when it is not mapped explicitly.
const GEOMETRY_ATTRIBUTE: &str = "geometrie";

/// Compiles the format of one export product.
///
/// A compiler borrows the registry of a single resolved query and is used for
/// one select list.
#[derive(Debug, Clone)]
pub struct FormatCompiler<'a> {
    registry: &'a BaseExpressionRegistry,
    dialect: DatabricksDialect,
}

impl<'a> FormatCompiler<'a> {
    /// Create a compiler for one registry.
    pub fn new(registry: &'a BaseExpressionRegistry, dialect: DatabricksDialect) -> Self {
        Self { registry, dialect }
    }

    /// Resolve a reference to a SQL expression.
    pub fn resolve_reference(&self, path: &str) -> Option<String> {
        self.registry.resolve(path)
    }

    /// Evaluate a format spec.
    ///
    /// References that cannot be resolved yield `None`; actions and
    /// conditions always yield an expression.
    ///
    /// # Errors
    ///
    /// Returns an error for unimplemented actions, formatters or conditions
    /// and for malformed formatter parameters.
    pub fn evaluate(&self, spec: &FormatSpec) -> Result<Option<String>> {
        match spec {
            FormatSpec::Reference(path) => Ok(self.resolve_reference(path)),
            FormatSpec::Condition(condition) => self.evaluate_condition(condition).map(Some),
            FormatSpec::Action(action) => self.evaluate_action(action).map(Some),
        }
    }

    /// Evaluate a condition to a `CASE WHEN ... IS NULL` expression.
    ///
    /// `isempty` and `isnone` are both compiled to a NULL check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnimplementedCondition`] for other condition kinds, and
    /// any error raised while evaluating the reference or the branches.
    pub fn evaluate_condition(&self, condition: &Condition) -> Result<String> {
        if let ConditionKind::Unsupported(kind) = &condition.condition {
            return Err(Error::UnimplementedCondition(kind.clone()));
        }

        let reference = self.evaluate_or_null(&condition.reference)?;
        let trueval = self.evaluate_branch(condition.trueval.as_deref())?;
        let falseval = self.evaluate_branch(condition.falseval.as_deref())?;

        let (when_null, otherwise) = if condition.negate {
            (falseval, trueval)
        } else {
            (trueval, falseval)
        };

        Ok(format!(
            "CASE WHEN {reference} IS NULL THEN {when_null} ELSE {otherwise} END"
        ))
    }

    /// Evaluate an action.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnimplementedAction`] or
    /// [`Error::UnimplementedFormatter`] when no rendering rule exists, and
    /// [`Error::MalformedFormatString`] for parameters that cannot be mapped.
    pub fn evaluate_action(&self, action: &Action) -> Result<String> {
        match action {
            Action::Format {
                formatter,
                value,
                kwargs,
            } => self.evaluate_formatter(formatter, value, kwargs),
            Action::Literal { value } => Ok(self.dialect.string_literal(value)),
            Action::Concat { fields } => {
                let args = fields
                    .iter()
                    .map(|field| self.evaluate_or_null(field))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("CONCAT({})", args.join(", ")))
            }
            Action::Fill {
                value,
                fill_type,
                length,
                character,
            } => {
                let function = match fill_type {
                    FillType::Ljust => "RPAD",
                    FillType::Rjust => "LPAD",
                };
                Ok(format!(
                    "{function}({}, {length}, {})",
                    self.mapped_or_null(value),
                    self.dialect.quoted_value(character)
                ))
            }
            Action::Case { reference, values } => {
                if values.is_empty() {
                    return Err(Error::MalformedFormatString(format!(
                        "case on '{reference}' has no values"
                    )));
                }
                let cases = values
                    .iter()
                    .map(|(key, label)| {
                        format!(
                            "WHEN {} THEN {}",
                            self.dialect.quoted_value(key),
                            self.dialect.quoted_value(label)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok(format!("CASE {} {cases} END", self.mapped_or_null(reference)))
            }
            Action::Unsupported { kind } => Err(Error::UnimplementedAction(kind.clone())),
        }
    }

    /// Render a `format` action.
    fn evaluate_formatter(
        &self,
        formatter: &Formatter,
        value: &str,
        kwargs: &FormatKwargs,
    ) -> Result<String> {
        let sql = match formatter {
            Formatter::Geometry => self.dialect.geometry_as_text(&self.mapped_or_null(value)),
            Formatter::SoortObject => self.soort_object(value)?,
            Formatter::Date => {
                format!("date_format({}, \"{DATE_PATTERN}\")", self.mapped_or_null(value))
            }
            Formatter::Timestamp => {
                let pattern = match kwargs.format.as_deref() {
                    None if kwargs.is_empty() => DEFAULT_TIMESTAMP_PATTERN,
                    None => {
                        return Err(Error::MalformedFormatString(
                            "Unknown format: kwargs without 'format'".to_string(),
                        ));
                    }
                    Some(source) => self.dialect.timestamp_pattern(source).ok_or_else(|| {
                        Error::MalformedFormatString(format!("Unknown format {source}"))
                    })?,
                };
                format!("date_format({}, \"{pattern}\")", self.mapped_or_null(value))
            }
            Formatter::Kadgrootte | Formatter::Koopsom | Formatter::Bedrag => {
                format!("ROUND({})", self.mapped_or_null(value))
            }
            Formatter::CommaConcatter => {
                format!("replace({}, '|', ',')", self.mapped_or_null(value))
            }
            Formatter::Rotation => format!("round({}, 3)", self.mapped_or_null(value)),
            Formatter::Guid => {
                format!("format_string('{{{{%s}}}}', {})", self.mapped_or_null(value))
            }
            Formatter::Unimplemented(name) => {
                return Err(Error::UnimplementedFormatter(name.clone()));
            }
        };
        Ok(sql)
    }

    /// JSON key of a column on a joined relation.
    ///
    /// The value always has the shape `<relation>.<field>.<jsonKey>`.
    fn soort_object(&self, value: &str) -> Result<String> {
        let parts: Vec<&str> = value.split('.').collect();
        let [relation, field, json_key] = parts.as_slice() else {
            return Err(Error::MalformedFormatString(format!(
                "expected <relation>.<field>.<key>, got {value}"
            )));
        };

        let alias = self
            .registry
            .relation_alias(relation)
            .ok_or_else(|| Error::UnknownRelation((*relation).to_string()))?;

        Ok(self
            .dialect
            .json_extract(&format!("{alias}.{}", to_snake(field)), &to_snake(json_key)))
    }

    /// Evaluate a spec, rendering an unresolved reference as NULL.
    fn evaluate_or_null(&self, spec: &FormatSpec) -> Result<String> {
        Ok(match self.evaluate(spec)? {
            Some(sql) => sql,
            None => self.unresolved(spec.as_reference().unwrap_or_default()),
        })
    }

    fn evaluate_branch(&self, branch: Option<&FormatSpec>) -> Result<String> {
        match branch {
            None => Ok(NULL.to_string()),
            Some(FormatSpec::Reference(path)) if path.is_empty() => Ok(NULL.to_string()),
            Some(spec) => self.evaluate_or_null(spec),
        }
    }

    fn mapped_or_null(&self, path: &str) -> String {
        self.resolve_reference(path)
            .unwrap_or_else(|| self.unresolved(path))
    }

    fn unresolved(&self, path: &str) -> String {
        tracing::warn!(reference = %path, "Unresolved reference, using NULL");
        NULL.to_string()
    }

    /// Assemble the select list for a field mapping.
    ///
    /// Each attribute is evaluated in mapping order. A dotted reference that
    /// does not resolve falls back to extracting the JSON key named by its
    /// second segment from its first segment; anything still unresolved
    /// becomes NULL. Shape exports get an
    /// extra `geometrie` column when it resolves and is not mapped.
    ///
    /// # Errors
    ///
    /// Returns evaluation errors wrapped in [`Error::Attribute`], and
    /// [`Error::MissingAttributes`] when a mapped attribute is absent from
    /// the result.
    pub fn assemble(&self, mapping: &FieldMapping, is_shape: bool) -> Result<CompiledSelectList> {
        let mut items = Vec::with_capacity(mapping.len() + usize::from(is_shape));

        for (attribute, spec) in mapping {
            let _span = tracing::debug_span!("export_attribute", attribute = %attribute).entered();

            let mut expression = self.evaluate(spec).map_err(|source| {
                tracing::error!(error = %source, "Attribute failed to compile");
                Error::Attribute {
                    attribute: attribute.clone(),
                    source: Box::new(source),
                }
            })?;

            // Only the second segment becomes the JSON key.
            if expression.is_none()
                && let Some(path) = spec.as_reference()
                && let Some((head, rest)) = path.split_once('.')
            {
                let json_key = rest.split('.').next().unwrap_or_default();
                expression = self
                    .resolve_reference(head)
                    .map(|sql| self.dialect.json_extract(&sql, json_key));
            }

            let expression = match expression {
                Some(sql) => sql,
                None => self.unresolved(spec.as_reference().unwrap_or_default()),
            };

            items.push(SelectItem {
                expression,
                attribute: attribute.clone(),
            });
        }

        if is_shape
            && !mapping.contains_key(GEOMETRY_ATTRIBUTE)
            && let Some(geometry) = self.resolve_reference(GEOMETRY_ATTRIBUTE)
        {
            items.push(SelectItem {
                expression: geometry,
                attribute: GEOMETRY_ATTRIBUTE.to_string(),
            });
        }

        let select = CompiledSelectList { items };
        select.check_complete(mapping)?;

        tracing::debug!(columns = select.len(), "Assembled select list");
        Ok(select)
    }

    /// Assemble and render the select list.
    ///
    /// # Errors
    ///
    /// See [`FormatCompiler::assemble`].
    pub fn compile(&self, mapping: &FieldMapping, is_shape: bool) -> Result<String> {
        Ok(self.assemble(mapping, is_shape)?.to_sql())
    }
}

/// A compiled select list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledSelectList {
    items: Vec<SelectItem>,
}

/// One `<expression> AS <attribute>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    /// SQL expression producing the value.
    pub expression: String,

    /// Export attribute name.
    pub attribute: String,
}

impl CompiledSelectList {
    /// The entries in output order.
    pub fn items(&self) -> &[SelectItem] {
        &self.items
    }

    /// Number of output columns.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no columns.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The expression of an attribute.
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.attribute == attribute)
            .map(|item| item.expression.as_str())
    }

    /// Attribute names in output order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.attribute.as_str())
    }

    /// Render as `<expr> AS \`<attr>\`` lines separated by commas.
    pub fn to_sql(&self) -> String {
        self.to_string()
    }

    fn check_complete(&self, mapping: &FieldMapping) -> Result<()> {
        let present: HashSet<&str> = self.attributes().collect();
        let missing: Vec<String> = mapping
            .keys()
            .filter(|attribute| !present.contains(attribute.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        for attribute in &missing {
            tracing::error!(attribute = %attribute, "Missing output attribute");
        }
        Err(Error::MissingAttributes(missing))
    }
}

impl fmt::Display for CompiledSelectList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(",\n")?;
            }
            write!(
                f,
                "{} AS {}",
                item.expression,
                crate::dialect::quote_identifier(&item.attribute)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> BaseExpressionRegistry {
        let mut registry = BaseExpressionRegistry::new();
        registry.add_select_expression("bag_0.identificatie", Some("identificatie"));
        registry.add_select_expression("bag_0.begin_geldigheid", Some("begin_geldigheid"));
        registry.add_select_expression("bag_0.eind_geldigheid", Some("eind_geldigheid"));
        registry.add_select_expression("bag_0.huisnummer", None);
        registry.add_select_expression("bag_0.status", Some("status"));
        registry.add_select_expression("bag_0.geometrie", Some("geometrie"));
        registry.add_select_expression("rel_1.code", Some("ligt_in_buurt_code"));
        registry.add_relation("invIsVerbondenMetBagLigplaatsWozDeelobjecten", "rel_2");
        registry
    }

    fn spec(value: serde_json::Value) -> FormatSpec {
        serde_json::from_value(value).unwrap()
    }

    fn mapping(value: serde_json::Value) -> FieldMapping {
        serde_json::from_value(value).unwrap()
    }

    fn eval(value: serde_json::Value) -> Result<Option<String>> {
        let registry = registry();
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());
        compiler.evaluate(&spec(value))
    }

    fn eval_ok(value: serde_json::Value) -> String {
        eval(value).unwrap().unwrap()
    }

    #[test]
    fn test_condition_polarity() {
        let mut registry = BaseExpressionRegistry::new();
        registry.add_select_expression("x", Some("x"));
        registry.add_select_expression("a", Some("a"));
        registry.add_select_expression("b", Some("b"));
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());

        let condition = spec(json!({
            "condition": "isempty",
            "reference": "x",
            "trueval": "a",
            "falseval": "b",
            "negate": false
        }));
        assert_eq!(
            compiler.evaluate(&condition).unwrap().unwrap(),
            "CASE WHEN x IS NULL THEN a ELSE b END"
        );

        let negated = spec(json!({
            "condition": "isnone",
            "reference": "x",
            "trueval": "a",
            "falseval": "b",
            "negate": true
        }));
        assert_eq!(
            compiler.evaluate(&negated).unwrap().unwrap(),
            "CASE WHEN x IS NULL THEN b ELSE a END"
        );
    }

    #[test]
    fn test_condition_missing_branches_are_null() {
        let sql = eval_ok(json!({
            "condition": "isempty",
            "reference": "eindGeldigheid",
            "trueval": {"action": "literal", "value": "J"}
        }));
        assert_eq!(
            sql,
            "CASE WHEN bag_0.eind_geldigheid IS NULL THEN \"J\" ELSE NULL END"
        );

        let sql = eval_ok(json!({
            "condition": "isempty",
            "reference": "eindGeldigheid",
            "trueval": ""
        }));
        assert_eq!(
            sql,
            "CASE WHEN bag_0.eind_geldigheid IS NULL THEN NULL ELSE NULL END"
        );
    }

    #[test]
    fn test_condition_with_nested_reference() {
        let sql = eval_ok(json!({
            "condition": "isnone",
            "reference": {"action": "format", "formatter": "format_date", "value": "eindGeldigheid"},
            "falseval": "identificatie"
        }));
        assert_eq!(
            sql,
            "CASE WHEN date_format(bag_0.eind_geldigheid, \"yyyy-MM-dd'T'HH:mm:ss\") IS NULL \
             THEN NULL ELSE bag_0.identificatie END"
        );
    }

    #[test]
    fn test_unimplemented_condition_is_fatal() {
        let err = eval(json!({"condition": "isnumber", "reference": "x"})).unwrap_err();
        assert!(matches!(err, Error::UnimplementedCondition(ref kind) if kind == "isnumber"));
    }

    #[test]
    fn test_fill_padding() {
        let mut registry = BaseExpressionRegistry::new();
        registry.add_select_expression("r", Some("r"));
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());

        let ljust = spec(json!({
            "action": "fill", "value": "r", "fill_type": "ljust", "length": 5, "character": "0"
        }));
        assert_eq!(
            compiler.evaluate(&ljust).unwrap().unwrap(),
            "RPAD(r, 5, '0')"
        );

        let rjust = spec(json!({
            "action": "fill", "value": "r", "fill_type": "center", "length": 5, "character": "0"
        }));
        assert_eq!(
            compiler.evaluate(&rjust).unwrap().unwrap(),
            "LPAD(r, 5, '0')"
        );
    }

    #[test]
    fn test_formatters() {
        let cases = [
            ("format_geometry", "geometrie", "bag_0.geometrie"),
            (
                "format_date",
                "beginGeldigheid",
                "date_format(bag_0.begin_geldigheid, \"yyyy-MM-dd'T'HH:mm:ss\")",
            ),
            (
                "format_timestamp",
                "beginGeldigheid",
                "date_format(bag_0.begin_geldigheid, \"yyyyMMddHHmmss\")",
            ),
            ("format_kadgrootte", "huisnummer", "ROUND(bag_0.huisnummer)"),
            ("format_koopsom", "huisnummer", "ROUND(bag_0.huisnummer)"),
            ("format_bedrag", "huisnummer", "ROUND(bag_0.huisnummer)"),
            ("comma_concatter", "status", "replace(bag_0.status, '|', ',')"),
            ("format_rotation", "huisnummer", "round(bag_0.huisnummer, 3)"),
            (
                "format_guid",
                "identificatie",
                "format_string('{{%s}}', bag_0.identificatie)",
            ),
        ];

        for (formatter, value, expected) in cases {
            let sql = eval_ok(json!({"action": "format", "formatter": formatter, "value": value}));
            assert_eq!(sql, expected, "formatter {formatter}");
        }
    }

    #[test]
    fn test_timestamp_with_mapped_pattern() {
        let sql = eval_ok(json!({
            "action": "format",
            "formatter": "format_timestamp",
            "value": "beginGeldigheid",
            "kwargs": {"format": "%Y-%m-%d"}
        }));
        assert_eq!(sql, "date_format(bag_0.begin_geldigheid, \"yyyy-MM-dd\")");
    }

    #[test]
    fn test_timestamp_with_unknown_pattern_is_fatal() {
        let err = eval(json!({
            "action": "format",
            "formatter": "format_timestamp",
            "value": "beginGeldigheid",
            "kwargs": {"format": "%d/%m/%Y"}
        }))
        .unwrap_err();
        assert!(
            matches!(err, Error::MalformedFormatString(ref msg) if msg.contains("%d/%m/%Y")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_timestamp_kwargs_without_format_is_fatal() {
        let err = eval(json!({
            "action": "format",
            "formatter": "format_timestamp",
            "value": "beginGeldigheid",
            "kwargs": {"fmt": "%Y"}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MalformedFormatString(_)), "unexpected error: {err}");

        let sql = eval_ok(json!({
            "action": "format",
            "formatter": "format_timestamp",
            "value": "beginGeldigheid",
            "kwargs": {}
        }));
        assert_eq!(sql, "date_format(bag_0.begin_geldigheid, \"yyyyMMddHHmmss\")");
    }

    #[test]
    fn test_soort_object() {
        let sql = eval_ok(json!({
            "action": "format",
            "formatter": "format_soort_object",
            "value": "invIsVerbondenMetBagLigplaatsWozDeelobjecten.soortObject.omschrijving"
        }));
        assert_eq!(sql, "get_json_object(rel_2.soort_object, '$.omschrijving')");
    }

    #[test]
    fn test_soort_object_errors() {
        let err = eval(json!({
            "action": "format", "formatter": "format_soort_object", "value": "a.b"
        }))
        .unwrap_err();
        assert!(matches!(err, Error::MalformedFormatString(_)));

        let err = eval(json!({
            "action": "format", "formatter": "format_soort_object", "value": "onbekend.b.c"
        }))
        .unwrap_err();
        assert!(matches!(err, Error::UnknownRelation(ref name) if name == "onbekend"));
    }

    #[test]
    fn test_unknown_formatter_is_fatal() {
        let err = eval(json!({
            "action": "format", "formatter": "format_cijfer", "value": "huisnummer"
        }))
        .unwrap_err();
        assert!(matches!(err, Error::UnimplementedFormatter(ref name) if name == "format_cijfer"));
        assert!(err.to_string().contains("format_cijfer"));
    }

    #[test]
    fn test_unknown_action_is_fatal() {
        let err = eval(json!({"action": "split", "value": "x"})).unwrap_err();
        assert!(matches!(err, Error::UnimplementedAction(ref kind) if kind == "split"));
    }

    #[test]
    fn test_literal_concat_case() {
        assert_eq!(
            eval_ok(json!({"action": "literal", "value": "Amsterdam"})),
            "\"Amsterdam\""
        );

        assert_eq!(
            eval_ok(json!({
                "action": "concat",
                "fields": [
                    "identificatie",
                    {"action": "literal", "value": "-"},
                    "huisnummer",
                    "onbekend"
                ]
            })),
            "CONCAT(bag_0.identificatie, \"-\", bag_0.huisnummer, NULL)"
        );

        assert_eq!(
            eval_ok(json!({
                "action": "case",
                "reference": "status",
                "values": {"1": "Actief", "2": "Historisch"}
            })),
            "CASE bag_0.status WHEN '1' THEN 'Actief' WHEN '2' THEN 'Historisch' END"
        );
    }

    #[test]
    fn test_case_without_values_is_rejected() {
        let err = eval(json!({"action": "case", "reference": "status", "values": {}})).unwrap_err();
        assert!(matches!(err, Error::MalformedFormatString(_)));
    }

    #[test]
    fn test_assemble_in_mapping_order() {
        let registry = registry();
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());
        let mapping = mapping(json!({
            "nummer": "huisnummer",
            "id": "identificatie",
            "buurt": "ligtInBuurt.code"
        }));

        let select = compiler.assemble(&mapping, false).unwrap();
        assert_eq!(
            select.attributes().collect::<Vec<_>>(),
            vec!["nummer", "id", "buurt"]
        );
        assert_eq!(
            select.to_sql(),
            "bag_0.huisnummer AS `nummer`,\nbag_0.identificatie AS `id`,\nrel_1.code AS `buurt`"
        );
    }

    #[test]
    fn test_assemble_null_fallback() {
        let registry = registry();
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());
        let select = compiler
            .assemble(&mapping(json!({"x": "bestaatNiet"})), false)
            .unwrap();
        assert_eq!(select.get("x"), Some("NULL"));
    }

    #[test]
    fn test_assemble_json_fallback() {
        let mut registry = BaseExpressionRegistry::new();
        registry.add_select_expression("bag_0.status", Some("status"));
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());

        let select = compiler
            .assemble(&mapping(json!({"status": "status.omschrijving"})), false)
            .unwrap();
        assert_eq!(
            select.get("status"),
            Some("get_json_object(bag_0.status, '$.omschrijving')")
        );
    }

    #[test]
    fn test_assemble_json_fallback_uses_second_segment() {
        let mut registry = BaseExpressionRegistry::new();
        registry.add_select_expression("bag_0.status", Some("status"));
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());

        let select = compiler
            .assemble(&mapping(json!({"x": "status.code.omschrijving"})), false)
            .unwrap();
        assert_eq!(select.get("x"), Some("get_json_object(bag_0.status, '$.code')"));
    }

    #[test]
    fn test_assemble_error_names_attribute() {
        let registry = registry();
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());
        let mapping = mapping(json!({
            "id": "identificatie",
            "bedrag": {"action": "format", "formatter": "format_cijfer", "value": "huisnummer"}
        }));

        let err = compiler.assemble(&mapping, false).unwrap_err();
        assert_eq!(err.attribute(), Some("bedrag"));
        assert!(matches!(
            err.root_cause(),
            Error::UnimplementedFormatter(name) if name == "format_cijfer"
        ));
        assert_eq!(
            err.to_string(),
            "attribute 'bedrag': Unimplemented formatter: format_cijfer"
        );
    }

    #[test]
    fn test_shape_augmentation() {
        let registry = registry();
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());
        let mapping = mapping(json!({"id": "identificatie"}));

        let select = compiler.assemble(&mapping, true).unwrap();
        assert_eq!(select.attributes().collect::<Vec<_>>(), vec!["id", "geometrie"]);
        assert_eq!(select.get("geometrie"), Some("bag_0.geometrie"));

        let select = compiler.assemble(&mapping, false).unwrap();
        assert_eq!(select.len(), 1);

        let empty = BaseExpressionRegistry::new();
        let compiler = FormatCompiler::new(&empty, DatabricksDialect::default());
        let select = compiler.assemble(&mapping, true).unwrap();
        assert_eq!(select.attributes().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn test_shape_with_explicit_geometry_is_not_duplicated() {
        let registry = registry();
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());
        let mapping = mapping(json!({
            "geometrie": {"action": "format", "formatter": "format_geometry", "value": "geometrie"},
            "id": "identificatie"
        }));

        let select = compiler.assemble(&mapping, true).unwrap();
        assert_eq!(select.attributes().collect::<Vec<_>>(), vec!["geometrie", "id"]);
    }

    // `assemble` pushes one item per mapping key and can never produce
    // `MissingAttributes`, so the check is exercised directly.
    #[test]
    fn test_completeness_check() {
        let select = CompiledSelectList {
            items: vec![SelectItem {
                expression: "a".to_string(),
                attribute: "a".to_string(),
            }],
        };
        let mapping = mapping(json!({"a": "a", "b": "b", "c": "c"}));
        let err = select.check_complete(&mapping).unwrap_err();
        match err {
            Error::MissingAttributes(missing) => assert_eq!(missing, vec!["b", "c"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_deterministic_output() {
        let registry = registry();
        let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());
        let mapping = mapping(json!({
            "id": "identificatie",
            "begin": {"action": "format", "formatter": "format_date", "value": "beginGeldigheid"},
            "nummer": {"action": "fill", "value": "huisnummer", "fill_type": "rjust", "length": 5, "character": "0"}
        }));

        let first = compiler.compile(&mapping, true).unwrap();
        let second = compiler.compile(&mapping, true).unwrap();
        assert_eq!(first, second);
    }
}
