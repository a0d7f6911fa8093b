//! Credential repository contract and SQLite implementation.
//!
//! # Invariants
//! - `create_credential` and `update_credential` return the row as persisted
//!   (`RETURNING`), never the caller's input.
//! - `update_credential` rewrites every mutable column; `id` and `created_at`
//!   are never part of the write set.
//! - Search ordering always ends with `email ASC`, which is unique, so pages
//!   never overlap or skip rows.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::credential::{
    Credential, CredentialFields, CredentialId, Role, SortDirection, SortKey,
};
use once_cell::sync::Lazy;
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CREDENTIAL_COLUMNS: &str = "id,
    email,
    role,
    email_validation_token_id,
    pending_email_validation_token_id,
    password_token_id,
    reset_password_token_id,
    created_at,
    updated_at";

const REQUIRED_COLUMNS: [&str; 9] = [
    "id",
    "email",
    "role",
    "email_validation_token_id",
    "pending_email_validation_token_id",
    "password_token_id",
    "reset_password_token_id",
    "created_at",
    "updated_at",
];

static ROLE_RANK_SQL: Lazy<String> = Lazy::new(|| {
    let arms = Role::ALL
        .iter()
        .map(|role| format!("WHEN '{}' THEN {}", role.as_str(), role.sort_rank()))
        .collect::<Vec<_>>()
        .join(" ");
    format!("CASE role {arms} END")
});

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for credential persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    /// No selector was given, or nothing matched it.
    NotFound,
    /// A uniqueness constraint rejected the insert.
    AlreadyExists,
    Db(DbError),
    /// Connection schema version does not match this binary.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be decoded.
    InvalidData(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::AlreadyExists => ErrorKind::AlreadyExists,
            Self::Db(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::InvalidData(_) => ErrorKind::Internal,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "credentials not found"),
            Self::AlreadyExists => write!(f, "credentials already exist"),
            Self::Db(err) => write!(f, "exec query: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "credentials repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "credentials repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "credentials repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted credentials: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Point-lookup selector; present selectors are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSelector {
    pub id: Option<CredentialId>,
    pub email: Option<String>,
}

impl CredentialSelector {
    pub fn by_id(id: CredentialId) -> Self {
        Self {
            id: Some(id),
            email: None,
        }
    }

    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: Some(email.into()),
        }
    }

    /// True when neither a non-nil id nor a non-empty email is set.
    pub fn is_empty(&self) -> bool {
        self.id.map_or(true, |id| id.is_nil())
            && self.email.as_deref().map_or(true, str::is_empty)
    }
}

/// Filtered, sorted, paginated id search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSearchQuery {
    pub limit: u32,
    pub offset: u32,
    pub sort: SortKey,
    /// `None` sorts ascending.
    pub direction: Option<SortDirection>,
    /// Empty: no constraint. One: equality. Several: membership.
    pub emails: Vec<String>,
    /// Empty: no constraint. One: equality. Several: membership.
    pub roles: Vec<Role>,
}

impl CredentialSearchQuery {
    /// First page of `limit` ids in default order, unfiltered.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            offset: 0,
            sort: SortKey::None,
            direction: None,
            emails: Vec::new(),
            roles: Vec::new(),
        }
    }
}

/// Data-access contract, one method per use case.
pub trait CredentialRepository {
    fn create_credential(
        &self,
        id: CredentialId,
        now: i64,
        fields: &CredentialFields,
    ) -> RepoResult<Credential>;
    fn get_credential(&self, selector: &CredentialSelector) -> RepoResult<Credential>;
    fn credential_exists(&self, selector: &CredentialSelector) -> RepoResult<bool>;
    fn list_credentials(&self, ids: &[CredentialId]) -> RepoResult<Vec<Credential>>;
    fn search_credentials(&self, query: &CredentialSearchQuery) -> RepoResult<Vec<CredentialId>>;
    fn update_credential(
        &self,
        id: CredentialId,
        now: i64,
        fields: &CredentialFields,
    ) -> RepoResult<Credential>;
}

impl<R: CredentialRepository + ?Sized> CredentialRepository for &R {
    fn create_credential(
        &self,
        id: CredentialId,
        now: i64,
        fields: &CredentialFields,
    ) -> RepoResult<Credential> {
        (**self).create_credential(id, now, fields)
    }

    fn get_credential(&self, selector: &CredentialSelector) -> RepoResult<Credential> {
        (**self).get_credential(selector)
    }

    fn credential_exists(&self, selector: &CredentialSelector) -> RepoResult<bool> {
        (**self).credential_exists(selector)
    }

    fn list_credentials(&self, ids: &[CredentialId]) -> RepoResult<Vec<Credential>> {
        (**self).list_credentials(ids)
    }

    fn search_credentials(&self, query: &CredentialSearchQuery) -> RepoResult<Vec<CredentialId>> {
        (**self).search_credentials(query)
    }

    fn update_credential(
        &self,
        id: CredentialId,
        now: i64,
        fields: &CredentialFields,
    ) -> RepoResult<Credential> {
        (**self).update_credential(id, now, fields)
    }
}

/// SQLite-backed credential repository borrowing one connection.
#[derive(Debug, Clone, Copy)]
pub struct SqliteCredentialRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCredentialRepository<'conn> {
    /// Wraps a connection whose schema is fully applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CredentialRepository for SqliteCredentialRepository<'_> {
    fn create_credential(
        &self,
        id: CredentialId,
        now: i64,
        fields: &CredentialFields,
    ) -> RepoResult<Credential> {
        let mut stmt = self.conn.prepare(&format!(
            "INSERT INTO credentials (
                id,
                email,
                role,
                email_validation_token_id,
                pending_email_validation_token_id,
                password_token_id,
                reset_password_token_id,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)
            RETURNING {CREDENTIAL_COLUMNS};"
        ))?;

        let mut rows = stmt
            .query(params![
                id.to_string(),
                fields.email.as_str(),
                fields.role,
                token_param(&fields.email_validation_token_id),
                token_param(&fields.pending_email_validation_token_id),
                token_param(&fields.password_token_id),
                token_param(&fields.reset_password_token_id),
                now,
            ])
            .map_err(classify_insert_error)?;

        match rows.next().map_err(classify_insert_error)? {
            Some(row) => parse_credential_row(row),
            None => Err(RepoError::InvalidData(
                "insert returned no row".to_string(),
            )),
        }
    }

    fn get_credential(&self, selector: &CredentialSelector) -> RepoResult<Credential> {
        let (condition, bind_values) = selector_condition(selector).ok_or(RepoError::NotFound)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE {condition} LIMIT 1;"
        ))?;

        let mut rows = stmt.query(params_from_iter(bind_values))?;
        match rows.next()? {
            Some(row) => parse_credential_row(row),
            None => Err(RepoError::NotFound),
        }
    }

    fn credential_exists(&self, selector: &CredentialSelector) -> RepoResult<bool> {
        let (condition, bind_values) = selector_condition(selector).ok_or(RepoError::NotFound)?;
        let exists: i64 = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM credentials WHERE {condition});"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_credentials(&self, ids: &[CredentialId]) -> RepoResult<Vec<Credential>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE id IN ({});",
            placeholders(ids.len())
        ))?;
        let mut rows = stmt.query(params_from_iter(ids.iter().map(|id| id.to_string())))?;

        let mut credentials = Vec::new();
        while let Some(row) = rows.next()? {
            credentials.push(parse_credential_row(row)?);
        }
        Ok(credentials)
    }

    fn search_credentials(&self, query: &CredentialSearchQuery) -> RepoResult<Vec<CredentialId>> {
        let mut sql = String::from("SELECT id FROM credentials WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        push_filter(
            &mut sql,
            &mut bind_values,
            "email",
            query.emails.iter().map(|email| Value::Text(email.clone())),
        );
        push_filter(
            &mut sql,
            &mut bind_values,
            "role",
            query
                .roles
                .iter()
                .map(|role| Value::Text(role.as_str().to_string())),
        );

        sql.push_str(" ORDER BY ");
        sql.push_str(&order_clause(query.sort, query.direction));
        sql.push_str(" LIMIT ? OFFSET ?;");
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get(0)?;
            ids.push(parse_id(&id_text)?);
        }
        Ok(ids)
    }

    fn update_credential(
        &self,
        id: CredentialId,
        now: i64,
        fields: &CredentialFields,
    ) -> RepoResult<Credential> {
        let mut stmt = self.conn.prepare(&format!(
            "UPDATE credentials
             SET
                email = ?2,
                role = ?3,
                email_validation_token_id = ?4,
                pending_email_validation_token_id = ?5,
                password_token_id = ?6,
                reset_password_token_id = ?7,
                updated_at = ?8
             WHERE id = ?1
             RETURNING {CREDENTIAL_COLUMNS};"
        ))?;

        let mut rows = stmt.query(params![
            id.to_string(),
            fields.email.as_str(),
            fields.role,
            token_param(&fields.email_validation_token_id),
            token_param(&fields.pending_email_validation_token_id),
            token_param(&fields.password_token_id),
            token_param(&fields.reset_password_token_id),
            now,
        ])?;

        match rows.next()? {
            Some(row) => parse_credential_row(row),
            None => Err(RepoError::NotFound),
        }
    }
}

/// Maps an insert failure: uniqueness violations become `AlreadyExists`,
/// anything else stays a store error.
fn classify_insert_error(err: rusqlite::Error) -> RepoError {
    if is_unique_violation(&err) {
        RepoError::AlreadyExists
    } else {
        RepoError::Db(DbError::Sqlite(err))
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

fn selector_condition(selector: &CredentialSelector) -> Option<(String, Vec<Value>)> {
    if selector.is_empty() {
        return None;
    }

    let mut conditions = Vec::new();
    let mut bind_values = Vec::new();
    if let Some(email) = selector.email.as_deref().filter(|email| !email.is_empty()) {
        conditions.push("email = ?");
        bind_values.push(Value::Text(email.to_string()));
    }
    if let Some(id) = selector.id.filter(|id| !id.is_nil()) {
        conditions.push("id = ?");
        bind_values.push(Value::Text(id.to_string()));
    }
    Some((conditions.join(" AND "), bind_values))
}

fn push_filter(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    column: &str,
    values: impl ExactSizeIterator<Item = Value>,
) {
    match values.len() {
        0 => {}
        1 => sql.push_str(&format!(" AND {column} = ?")),
        count => sql.push_str(&format!(" AND {column} IN ({})", placeholders(count))),
    }
    bind_values.extend(values);
}

fn order_clause(sort: SortKey, direction: Option<SortDirection>) -> String {
    let direction = direction.unwrap_or(SortDirection::Asc);
    let dir = direction.as_sql();
    match sort {
        SortKey::None => "email ASC".to_string(),
        SortKey::Email => format!("email {dir}"),
        SortKey::Role => format!("{} {dir}, email ASC", ROLE_RANK_SQL.as_str()),
        SortKey::CreatedAt => format!("created_at {dir}, email ASC"),
        // Absent updated_at ranks above every timestamp.
        SortKey::UpdatedAt => {
            let nulls = match direction {
                SortDirection::Asc => "NULLS LAST",
                SortDirection::Desc => "NULLS FIRST",
            };
            format!("updated_at {dir} {nulls}, email ASC")
        }
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn token_param(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.is_empty())
}

fn parse_credential_row(row: &Row<'_>) -> RepoResult<Credential> {
    let id_text: String = row.get("id")?;
    let role = row.get::<_, Role>("role").map_err(|err| {
        RepoError::InvalidData(format!("invalid role in credentials.role: {err}"))
    })?;

    Ok(Credential {
        id: parse_id(&id_text)?,
        email: row.get("email")?,
        role,
        email_validation_token_id: row.get("email_validation_token_id")?,
        pending_email_validation_token_id: row.get("pending_email_validation_token_id")?,
        password_token_id: row.get("password_token_id")?,
        reset_password_token_id: row.get("reset_password_token_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_id(value: &str) -> RepoResult<CredentialId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in credentials.id")))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "credentials")? {
        return Err(RepoError::MissingRequiredTable("credentials"));
    }
    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "credentials", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "credentials",
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{order_clause, placeholders, CredentialSelector};
    use crate::model::credential::{SortDirection, SortKey};
    use uuid::Uuid;

    #[test]
    fn role_sort_uses_rank_expression() {
        let clause = order_clause(SortKey::Role, Some(SortDirection::Desc));
        assert!(clause.starts_with("CASE role WHEN 'none' THEN 0"));
        assert!(clause.contains("WHEN 'core' THEN 3"));
        assert!(clause.ends_with("DESC, email ASC"));
    }

    #[test]
    fn default_sort_ignores_direction() {
        assert_eq!(
            order_clause(SortKey::None, Some(SortDirection::Desc)),
            "email ASC"
        );
        assert_eq!(order_clause(SortKey::Email, None), "email ASC");
    }

    #[test]
    fn placeholders_are_comma_separated() {
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn selector_is_empty_without_usable_values() {
        assert!(CredentialSelector::default().is_empty());
        assert!(CredentialSelector::by_email("").is_empty());
        assert!(CredentialSelector::by_id(Uuid::nil()).is_empty());
        assert!(!CredentialSelector::by_email("a@x.com").is_empty());
    }
}
