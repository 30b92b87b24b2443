//! Query Text Assembler
//!
//! Builds complete remote statements from a relation, the columns the local
//! side needs back, and the already-accepted remote conditions. Every
//! statement carries the ordered list of what each result column is, which
//! must match the remote result set column for column.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::SqlGenError;
use crate::expr::{AttrNumber, Expr};
use crate::relation::{ColumnDescriptor, PushdownContext, RelationDescriptor, RelationSource};
use crate::render::render;

/// Remote pseudo-column addressing a physical row.
pub const ROW_IDENTITY_COLUMN: &str = "rdb$db_key";

/// What one result column of a remote statement holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievedAttr {
    /// Local column ordinal
    Column(AttrNumber),
    /// Opaque remote row identifier
    RowIdentity,
    /// Constant `NULL` emitted when nothing else was requested
    Placeholder,
}

/// Remote statement text plus its result column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStatement {
    text: String,
    retrieved: Vec<RetrievedAttr>,
}

impl RemoteStatement {
    fn new(text: String, retrieved: Vec<RetrievedAttr>) -> Self {
        Self { text, retrieved }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn retrieved(&self) -> &[RetrievedAttr] {
        &self.retrieved
    }

    /// Whether the result set carries the row identity column.
    pub fn retrieves_row_identity(&self) -> bool {
        self.retrieved.contains(&RetrievedAttr::RowIdentity)
    }

    pub fn into_parts(self) -> (String, Vec<RetrievedAttr>) {
        (self.text, self.retrieved)
    }
}

impl fmt::Display for RemoteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Columns a scan or RETURNING clause has to produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    attrs: BTreeSet<AttrNumber>,
    whole_row: bool,
    row_identity: bool,
}

impl ColumnSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, attnum: AttrNumber) -> Self {
        self.attrs.insert(attnum);
        self
    }

    pub fn with_columns(mut self, attnums: impl IntoIterator<Item = AttrNumber>) -> Self {
        self.attrs.extend(attnums);
        self
    }

    /// Every live column, as for a whole-row reference.
    pub fn with_whole_row(mut self) -> Self {
        self.whole_row = true;
        self
    }

    /// Append the row identity column, needed before UPDATE or DELETE.
    pub fn with_row_identity(mut self) -> Self {
        self.row_identity = true;
        self
    }

    /// Columns of `relation` referenced anywhere in `exprs`. Ordinal 0 is a
    /// whole-row reference.
    pub fn referenced_by<'e>(
        exprs: impl IntoIterator<Item = &'e Expr>,
        relation: &RelationDescriptor,
    ) -> Self {
        let mut selection = Self::default();
        for expr in exprs {
            expr.visit_columns(&mut |column| {
                if column.relation != relation.id || column.levels_up != 0 {
                    return;
                }
                match column.attnum {
                    0 => selection.whole_row = true,
                    n if n > 0 => {
                        selection.attrs.insert(n);
                    }
                    _ => {}
                }
            });
        }
        selection
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && !self.whole_row && !self.row_identity
    }

    fn includes(&self, column: &ColumnDescriptor) -> bool {
        self.whole_row || self.attrs.contains(&column.attnum)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetKind {
    Select,
    Returning,
}

/// ` WHERE (cond1) AND (cond2)`, or an empty string for no conditions.
pub fn render_where(conditions: &[Expr], ctx: &PushdownContext<'_>) -> Result<String, SqlGenError> {
    if conditions.is_empty() {
        return Ok(String::new());
    }
    let rendered = conditions
        .iter()
        .map(|cond| render(cond, ctx).map(|sql| format!("({})", sql)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!(" WHERE {}", rendered.join(" AND ")))
}

/// `SELECT <targets> FROM <relation> [WHERE ...]`
pub fn build_select(
    ctx: &PushdownContext<'_>,
    selection: &ColumnSelection,
    remote_conditions: &[Expr],
) -> Result<RemoteStatement, SqlGenError> {
    let relation = ctx.relation;
    if selection.row_identity {
        require_table(relation)?;
    }

    let (targets, retrieved) = target_list(ctx, selection, TargetKind::Select);
    let text = format!(
        "SELECT {} FROM {}{}",
        targets,
        relation.relation_sql(),
        render_where(remote_conditions, ctx)?
    );

    tracing::debug!(target: "render", relation = %relation.local_name, sql = %text, "Built SELECT");
    Ok(RemoteStatement::new(text, retrieved))
}

/// `INSERT INTO <relation> (c1, ...)\n VALUES (?, ...) [RETURNING ...]`
pub fn build_insert(
    ctx: &PushdownContext<'_>,
    target_attrs: &[AttrNumber],
    returning: &ColumnSelection,
) -> Result<RemoteStatement, SqlGenError> {
    let relation = ctx.relation;
    require_updatable(relation)?;

    let mut text = format!("INSERT INTO {}", relation.relation_sql());
    if target_attrs.is_empty() {
        text.push_str(" DEFAULT VALUES");
    } else {
        let columns = target_columns(relation, target_attrs)?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        text.push_str(&format!(" ({})\n VALUES ({})", columns.join(", "), placeholders));
    }

    let retrieved = append_returning(&mut text, ctx, returning);
    tracing::debug!(target: "render", relation = %relation.local_name, sql = %text, "Built INSERT");
    Ok(RemoteStatement::new(text, retrieved))
}

/// `UPDATE <relation> SET c = ?, ... WHERE rdb$db_key = ? [RETURNING ...]`
pub fn build_update(
    ctx: &PushdownContext<'_>,
    target_attrs: &[AttrNumber],
    returning: &ColumnSelection,
) -> Result<RemoteStatement, SqlGenError> {
    let relation = ctx.relation;
    require_updatable(relation)?;
    if target_attrs.is_empty() {
        return Err(SqlGenError::UnsupportedExpr(
            "UPDATE without target columns".to_string(),
        ));
    }

    let assignments = target_columns(relation, target_attrs)?
        .into_iter()
        .map(|column| format!("{} = ?", column))
        .collect::<Vec<_>>();
    let mut text = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        relation.relation_sql(),
        assignments.join(", "),
        ROW_IDENTITY_COLUMN
    );

    let retrieved = append_returning(&mut text, ctx, returning);
    tracing::debug!(target: "render", relation = %relation.local_name, sql = %text, "Built UPDATE");
    Ok(RemoteStatement::new(text, retrieved))
}

/// `DELETE FROM <relation> WHERE rdb$db_key = ? [RETURNING ...]`
pub fn build_delete(
    ctx: &PushdownContext<'_>,
    returning: &ColumnSelection,
) -> Result<RemoteStatement, SqlGenError> {
    let relation = ctx.relation;
    require_updatable(relation)?;

    let mut text = format!(
        "DELETE FROM {} WHERE {} = ?",
        relation.relation_sql(),
        ROW_IDENTITY_COLUMN
    );

    let retrieved = append_returning(&mut text, ctx, returning);
    tracing::debug!(target: "render", relation = %relation.local_name, sql = %text, "Built DELETE");
    Ok(RemoteStatement::new(text, retrieved))
}

fn require_table(relation: &RelationDescriptor) -> Result<(), SqlGenError> {
    match relation.source {
        RelationSource::Table(_) => Ok(()),
        RelationSource::Query(_) => Err(SqlGenError::NotUpdatable(relation.local_name.clone())),
    }
}

fn require_updatable(relation: &RelationDescriptor) -> Result<(), SqlGenError> {
    require_table(relation)?;
    if relation.updatable {
        Ok(())
    } else {
        Err(SqlGenError::NotUpdatable(relation.local_name.clone()))
    }
}

fn target_columns(
    relation: &RelationDescriptor,
    attnums: &[AttrNumber],
) -> Result<Vec<String>, SqlGenError> {
    attnums
        .iter()
        .map(|&attnum| {
            relation
                .column(attnum)
                .map(|column| relation.column_sql(column))
                .ok_or_else(|| SqlGenError::ColumnNotFound {
                    relation: relation.id,
                    attnum,
                    available: relation
                        .columns()
                        .iter()
                        .filter(|c| !c.dropped)
                        .map(|c| c.local_name.clone())
                        .collect(),
                })
        })
        .collect()
}

fn append_returning(
    text: &mut String,
    ctx: &PushdownContext<'_>,
    returning: &ColumnSelection,
) -> Vec<RetrievedAttr> {
    if returning.is_empty() {
        return Vec::new();
    }
    let (targets, retrieved) = target_list(ctx, returning, TargetKind::Returning);
    text.push_str(" RETURNING ");
    text.push_str(&targets);
    retrieved
}

fn target_list(
    ctx: &PushdownContext<'_>,
    selection: &ColumnSelection,
    kind: TargetKind,
) -> (String, Vec<RetrievedAttr>) {
    let relation = ctx.relation;
    let mut targets = Vec::new();
    let mut retrieved = Vec::new();

    for column in relation.columns() {
        if column.dropped || !selection.includes(column) {
            continue;
        }
        let name = relation.column_sql(column);
        let target = if ctx.is_implicit_bool_target(column) {
            match (ctx.supports_native_bool(), kind) {
                (true, _) => format!("{} <> 0", name),
                (false, TargetKind::Select) => format!(
                    "CASE WHEN {} <> 0 THEN 1 ELSE {} END AS {}",
                    name, name, name
                ),
                (false, TargetKind::Returning) => name,
            }
        } else {
            name
        };
        targets.push(target);
        retrieved.push(RetrievedAttr::Column(column.attnum));
    }

    if selection.row_identity {
        targets.push(ROW_IDENTITY_COLUMN.to_string());
        retrieved.push(RetrievedAttr::RowIdentity);
    }

    if targets.is_empty() {
        targets.push("NULL".to_string());
        retrieved.push(RetrievedAttr::Placeholder);
    }

    (targets.join(", "), retrieved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{DataType, Expr};
    use crate::relation::ColumnDescriptor;

    fn country() -> RelationDescriptor {
        RelationDescriptor::new(3, "country")
            .with_column(ColumnDescriptor::new(1, "country", DataType::Varchar))
            .with_column(ColumnDescriptor::new(2, "currency", DataType::Varchar))
            .with_column(ColumnDescriptor::new(3, "gone", DataType::Int4).dropped())
    }

    #[test]
    fn test_empty_where() {
        let rel = country();
        let ctx = PushdownContext::new(&rel, 30000);
        assert_eq!(render_where(&[], &ctx).unwrap(), "");
    }

    #[test]
    fn test_where_parenthesizes_each_condition() {
        let rel = country();
        let ctx = PushdownContext::new(&rel, 30000);
        let conds = vec![
            Expr::binary("=", Expr::column(3, 1), Expr::text("Italy")),
            Expr::is_not_null(Expr::column(3, 2)),
        ];
        assert_eq!(
            render_where(&conds, &ctx).unwrap(),
            " WHERE ((country = 'Italy')) AND ((currency IS NOT NULL))"
        );
    }

    #[test]
    fn test_select_skips_dropped_columns() {
        let rel = country();
        let ctx = PushdownContext::new(&rel, 30000);
        let stmt = build_select(&ctx, &ColumnSelection::new().with_whole_row(), &[]).unwrap();
        assert_eq!(stmt.text(), "SELECT country, currency FROM country");
        assert_eq!(
            stmt.retrieved(),
            &[RetrievedAttr::Column(1), RetrievedAttr::Column(2)]
        );
    }

    #[test]
    fn test_select_placeholder() {
        let rel = country();
        let ctx = PushdownContext::new(&rel, 30000);
        let stmt = build_select(&ctx, &ColumnSelection::new(), &[]).unwrap();
        assert_eq!(stmt.text(), "SELECT NULL FROM country");
        assert_eq!(stmt.retrieved(), &[RetrievedAttr::Placeholder]);
    }

    #[test]
    fn test_referenced_by_ignores_other_relations() {
        let rel = country();
        let exprs = [
            Expr::binary("=", Expr::column(3, 2), Expr::column(9, 1)),
            Expr::is_null(Expr::column(3, 1)),
        ];
        let selection = ColumnSelection::referenced_by(&exprs, &rel);
        assert_eq!(selection, ColumnSelection::new().with_columns([1, 2]));
    }

    #[test]
    fn test_insert_without_columns() {
        let rel = country();
        let ctx = PushdownContext::new(&rel, 30000);
        let stmt = build_insert(&ctx, &[], &ColumnSelection::new()).unwrap();
        assert_eq!(stmt.text(), "INSERT INTO country DEFAULT VALUES");
        assert!(stmt.retrieved().is_empty());
    }

    #[test]
    fn test_update_requires_targets() {
        let rel = country();
        let ctx = PushdownContext::new(&rel, 30000);
        assert!(build_update(&ctx, &[], &ColumnSelection::new()).is_err());
    }
}
