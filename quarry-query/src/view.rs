//! FROM clause and column list rendering for views.
//!
//! | Join style            | Inner link                      | Optional link                         |
//! |-----------------------|---------------------------------|---------------------------------------|
//! | `ansi`                | `(a A INNER JOIN b B ON ...)`   | `(a A LEFT OUTER JOIN b B ON ...)`    |
//! | `ansi-no-parenthesis` | `a A INNER JOIN b B ON ...`     | `a A LEFT OUTER JOIN b B ON ...`      |
//! | `theta-oracle`        | `a A, b B` + `A.x = B.y`        | `a A, b B` + `A.x = B.y(+)`           |
//! | `theta-mssql`         | `a A, b B` + `A.x = B.y`        | `a A, b B` + `A.x *= B.y`             |
//!
//! Theta styles return their link predicates separately so the caller can
//! combine them with the compiled condition.

use std::collections::HashSet;

use smol_str::SmolStr;

use quarry_schema::model::default_column_name;
use quarry_schema::{DialectConfig, JoinStyle, ViewDescriptor, ViewLink, ViewMember};

use crate::error::{QueryError, QueryResult};
use crate::quarry_debug;

/// A rendered FROM clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FromClause {
    /// Table list or join expression, without the `FROM` keyword.
    pub sql: String,
    /// Link predicates for the WHERE clause (theta styles only).
    pub where_predicates: Vec<String>,
}

impl FromClause {
    /// The link predicates joined with `AND`, if any.
    pub fn where_sql(&self) -> Option<String> {
        if self.where_predicates.is_empty() {
            None
        } else {
            Some(self.where_predicates.join(" AND "))
        }
    }

    /// Combine the link predicates with a compiled condition.
    pub fn combine_where(&self, condition_sql: &str) -> String {
        match (self.where_sql(), condition_sql.is_empty()) {
            (None, _) => condition_sql.to_string(),
            (Some(links), true) => links,
            (Some(links), false) => format!("{} AND ({})", links, condition_sql),
        }
    }
}

/// Render the FROM clause of `view` in the dialect's join style.
pub fn from_clause(view: &ViewDescriptor, dialect: &DialectConfig) -> QueryResult<FromClause> {
    let style = dialect.join_style;
    let clause = if style.is_theta() {
        theta(view, style)
    } else {
        ansi(view, style == JoinStyle::Ansi)?
    };
    quarry_debug!(view = view.name(), from = %clause.sql, "Rendered view FROM clause");
    Ok(clause)
}

/// The view's columns for a SELECT list.
///
/// With `alias_view_columns` each column is renamed to the view field's
/// column name, as in `PER.first_name AS first_name`.
pub fn select_columns(view: &ViewDescriptor, dialect: &DialectConfig) -> String {
    view.aliases()
        .map(|alias| {
            let column = format!("{}.{}", alias.entity_alias, alias.field.column());
            if dialect.alias_view_columns {
                format!("{} AS {}", column, default_column_name(&alias.name))
            } else {
                column
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn table_ref(member: &ViewMember) -> String {
    format!("{} {}", member.entity.table_name(), member.alias)
}

fn key_predicates<'a>(view: &'a ViewDescriptor, link: &'a ViewLink) -> impl Iterator<Item = (String, String)> + 'a {
    let left = view.member(&link.entity_alias);
    let right = view.member(&link.rel_entity_alias);
    link.key_maps.iter().filter_map(move |key| {
        let l = left?.entity.field(&key.field_name)?;
        let r = right?.entity.field(&key.rel_field_name)?;
        Some((
            format!("{}.{}", link.entity_alias, l.column()),
            format!("{}.{}", link.rel_entity_alias, r.column()),
        ))
    })
}

fn ansi(view: &ViewDescriptor, parenthesize: bool) -> QueryResult<FromClause> {
    let Some(first) = view.members().next() else {
        return Err(QueryError::invalid_configuration(format!("view `{}` has no members", view.name())));
    };

    let mut joined: HashSet<&SmolStr> = HashSet::new();
    joined.insert(&first.alias);
    let mut sql = table_ref(first);

    for link in view.links() {
        if !joined.contains(&link.entity_alias) || joined.contains(&link.rel_entity_alias) {
            return Err(QueryError::invalid_configuration(format!(
                "view `{}` link `{}` -> `{}` is out of join order",
                view.name(),
                link.entity_alias,
                link.rel_entity_alias
            ))
            .with_help("declare links so each one joins a new member to members already joined"));
        }
        let Some(rel) = view.member(&link.rel_entity_alias) else {
            return Err(QueryError::internal(format!(
                "view `{}` links unknown member `{}`",
                view.name(),
                link.rel_entity_alias
            )));
        };
        joined.insert(&rel.alias);

        let on = key_predicates(view, link)
            .map(|(l, r)| format!("{} = {}", l, r))
            .collect::<Vec<_>>()
            .join(" AND ");
        let join = if link.optional { "LEFT OUTER JOIN" } else { "INNER JOIN" };
        let joined_sql = format!("{} {} {} ON {}", sql, join, table_ref(rel), on);
        sql = if parenthesize {
            format!("({})", joined_sql)
        } else {
            joined_sql
        };
    }

    Ok(FromClause {
        sql,
        where_predicates: Vec::new(),
    })
}

fn theta(view: &ViewDescriptor, style: JoinStyle) -> FromClause {
    let sql = view.members().map(table_ref).collect::<Vec<_>>().join(", ");
    let mut where_predicates = Vec::new();
    for link in view.links() {
        for (l, r) in key_predicates(view, link) {
            let predicate = match (link.optional, style) {
                (true, JoinStyle::ThetaOracle) => format!("{} = {}(+)", l, r),
                (true, JoinStyle::ThetaMssql) => format!("{} *= {}", l, r),
                _ => format!("{} = {}", l, r),
            };
            where_predicates.push(predicate);
        }
    }
    FromClause { sql, where_predicates }
}
