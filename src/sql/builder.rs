//! Builds parameterized statements for an [`Entity`]. Identifiers come from the
//! entity definition only; every value is a `$n` parameter bound by the caller.

use crate::entity::{Entity, AUDIT_COLUMNS};

/// Quote identifier (safe: only from entity definitions).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

const NOT_DELETED: &str = "\"deleted\" = 0";
const NEWEST_FIRST: &str = " ORDER BY \"create_time\" DESC, \"id\" DESC";

/// Audit columns followed by the entity's own columns.
pub fn select_column_list<E: Entity>() -> String {
    AUDIT_COLUMNS
        .iter()
        .chain(E::COLUMNS.iter())
        .map(|c| quoted(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn table<E: Entity>() -> String {
    quoted(E::TABLE)
}

fn placeholders(from: usize, count: usize) -> String {
    (from..from + count)
        .map(|n| format!("${}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT by id, ignoring the deleted flag. Param: `$1` id.
pub fn select_by_id<E: Entity>() -> String {
    format!(
        "SELECT {} FROM {} WHERE \"id\" = $1",
        select_column_list::<E>(),
        table::<E>()
    )
}

/// SELECT by id among live rows. Param: `$1` id.
pub fn select_by_id_not_deleted<E: Entity>() -> String {
    format!("{} AND {}", select_by_id::<E>(), NOT_DELETED)
}

/// All live rows, newest first, with optional LIMIT/OFFSET.
pub fn select_not_deleted<E: Entity>(limit: Option<u64>, offset: Option<u64>) -> String {
    let limit_clause = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    format!(
        "SELECT {} FROM {} WHERE {}{}{}{}",
        select_column_list::<E>(),
        table::<E>(),
        NOT_DELETED,
        NEWEST_FIRST,
        limit_clause,
        offset_clause
    )
}

pub fn count_all<E: Entity>() -> String {
    format!("SELECT COUNT(*) FROM {}", table::<E>())
}

pub fn count_not_deleted<E: Entity>() -> String {
    format!("{} WHERE {}", count_all::<E>(), NOT_DELETED)
}

/// Param: `$1` id.
pub fn count_by_id<E: Entity>() -> String {
    format!("{} WHERE \"id\" = $1", count_all::<E>())
}

/// Param: `$1` id.
pub fn count_by_id_not_deleted<E: Entity>() -> String {
    format!("{} AND {}", count_by_id::<E>(), NOT_DELETED)
}

/// INSERT without id. Params: create_time, update_time, deleted, create_by,
/// update_by, version, then the entity's columns.
pub fn insert<E: Entity>() -> String {
    let cols: Vec<String> = AUDIT_COLUMNS
        .iter()
        .skip(1)
        .chain(E::COLUMNS.iter())
        .map(|c| quoted(c))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table::<E>(),
        cols.join(", "),
        placeholders(1, cols.len()),
        select_column_list::<E>()
    )
}

/// Version-checked UPDATE. Params: update_time, deleted, update_by, the entity's
/// columns, then id and expected version. `create_time` and `create_by` never change.
pub fn update<E: Entity>() -> String {
    let mut sets: Vec<String> = ["update_time", "deleted", "update_by"]
        .iter()
        .chain(E::COLUMNS.iter())
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", quoted(c), i + 1))
        .collect();
    let id_param = sets.len() + 1;
    sets.push("\"version\" = \"version\" + 1".into());
    format!(
        "UPDATE {} SET {} WHERE \"id\" = ${} AND \"version\" = ${} RETURNING {}",
        table::<E>(),
        sets.join(", "),
        id_param,
        id_param + 1,
        select_column_list::<E>()
    )
}

/// Physical delete. Params: one per id.
pub fn delete_by_ids<E: Entity>(count: usize) -> String {
    format!(
        "DELETE FROM {} WHERE \"id\" IN ({})",
        table::<E>(),
        placeholders(1, count)
    )
}

/// Flip live rows to deleted. Params: `$1` update_time, then one per id.
pub fn logical_delete_by_ids<E: Entity>(count: usize) -> String {
    format!(
        "UPDATE {} SET \"deleted\" = 1, \"update_time\" = $1, \"version\" = \"version\" + 1 WHERE \"id\" IN ({}) AND {}",
        table::<E>(),
        placeholders(2, count),
        NOT_DELETED
    )
}
