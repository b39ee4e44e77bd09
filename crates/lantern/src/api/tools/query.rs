//! `query_model`: bounded, parameterized reads of a model's table.

use std::collections::HashSet;

use serde_json::Value;
use wick::{AdapterError, Arguments};

use super::{clamp_limit, document};
use crate::host::{HostContext, ModelDef, Row, RowQuery};
use crate::types::QueryPage;

#[tracing::instrument(
    name = "tool.query_model",
    skip_all,
    fields(query.app = tracing::field::Empty, query.model = tracing::field::Empty)
)]
pub fn query_model(host: &HostContext, args: &Arguments) -> Result<Value, AdapterError> {
    let app = args.str("app_label")?;
    let model_name = args.str("model_name")?;
    let span = tracing::Span::current();
    span.record("query.app", app);
    span.record("query.model", model_name);

    let model = find_model(host.models.models()?, app, model_name)?;
    let table = model.table_name();

    if !host.schema.tables()?.iter().any(|t| *t == table) {
        return Err(AdapterError::failed(format!(
            "table '{table}' for model {app}.{} does not exist in the database",
            model.name
        )));
    }
    let columns: HashSet<String> = host
        .schema
        .describe(&table)?
        .columns
        .into_iter()
        .map(|c| c.name)
        .collect();

    let resolve_column = |field: &str| -> Result<String, AdapterError> {
        let column = match model.field(field) {
            Some(def) => def.column_name(),
            None => field.to_string(),
        };
        if columns.contains(&column) {
            Ok(column)
        } else {
            Err(AdapterError::invalid_argument(format!(
                "unknown field '{field}' on model {app}.{}",
                model.name
            )))
        }
    };

    let filters = args.object("filters")?.cloned().unwrap_or_default();
    let mut filter_columns = Vec::with_capacity(filters.len());
    for (field, value) in &filters {
        filter_columns.push((resolve_column(field)?, value.clone()));
    }

    let order_by = args.string_list("order_by")?;
    let mut order_columns = Vec::with_capacity(order_by.len());
    for term in &order_by {
        let (field, desc) = match term.strip_prefix('-') {
            Some(field) => (field, true),
            None => (term.as_str(), false),
        };
        order_columns.push((resolve_column(field)?, desc));
    }

    let limit = clamp_limit(args.i64("limit")?, host.limits.query_max)?;

    let page = host.rows.query(&RowQuery {
        table,
        filters: filter_columns,
        order_by: order_columns,
        limit,
    })?;

    tracing::debug!(total = page.total_count, returned = page.rows.len(), "Query complete");

    document(&QueryPage {
        app: app.to_string(),
        model: model_name.to_string(),
        total_count: page.total_count,
        returned_count: page.rows.len(),
        limit,
        filters,
        order_by,
        results: page.rows.into_iter().map(|row| field_keyed(model, row)).collect(),
    })
}

/// Rekeys a row from column names to field names; unmapped columns keep theirs.
fn field_keyed(model: &ModelDef, row: Row) -> Row {
    row.into_iter()
        .map(|(column, value)| {
            let key = model
                .fields
                .iter()
                .find(|f| f.column_name() == column)
                .map_or(column, |f| f.name.clone());
            (key, value)
        })
        .collect()
}

/// Model names match case-insensitively, app labels exactly.
fn find_model<'a>(models: &'a [ModelDef], app: &str, name: &str) -> Result<&'a ModelDef, AdapterError> {
    if !models.iter().any(|m| m.app == app) {
        return Err(AdapterError::invalid_argument(format!("unknown app '{app}'")));
    }
    models
        .iter()
        .find(|m| m.app == app && m.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| AdapterError::invalid_argument(format!("unknown model '{name}' in app '{app}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Manifest;

    #[test]
    fn test_find_model() {
        let manifest = Manifest::parse(
            r#"
[[models]]
app = "blog"
name = "Post"
"#,
        )
        .unwrap();

        assert_eq!(find_model(&manifest.models, "blog", "post").unwrap().name, "Post");
        assert!(matches!(
            find_model(&manifest.models, "shop", "Post"),
            Err(AdapterError::InvalidArgument(m)) if m.contains("unknown app")
        ));
        assert!(matches!(
            find_model(&manifest.models, "blog", "Comment"),
            Err(AdapterError::InvalidArgument(m)) if m.contains("unknown model")
        ));
    }

    #[test]
    fn test_rows_keyed_by_field_name() {
        let manifest = Manifest::parse(
            r#"
[[models]]
app = "blog"
name = "Post"

[[models.fields]]
name = "author"
type = "ForeignKey"
related_model = "auth.User"
"#,
        )
        .unwrap();
        let mut row = Row::new();
        row.insert("id".into(), serde_json::json!(1));
        row.insert("author_id".into(), serde_json::json!(7));

        let keyed = field_keyed(&manifest.models[0], row);
        assert_eq!(keyed.get("author"), Some(&serde_json::json!(7)));
        assert!(!keyed.contains_key("author_id"));
        assert_eq!(keyed.get("id"), Some(&serde_json::json!(1)));
    }
}
