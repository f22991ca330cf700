//! Statements of a [`Connection`].
//!
//! A statement is routed by its sql text:
//!
//! - with `$n` placeholders and without `;`, it is an [`ExtendedStatement`], prepared once per
//!   connection and executed once per binding,
//! - without placeholders, it is a [`SimpleStatement`], sent as is and possibly containing
//!   multiple statements.
//!
//! Sql text with both placeholders and multiple statements cannot be executed.
use crate::{
    Result,
    client::{Client, PgClient},
    codec::{Encode, Parameter},
    connection::Connection,
    error::UsageError,
    postgres::{Oid, PgFormat},
    query::{self, Results},
};

mod binding;
mod cache;
mod name;

pub use binding::{Binding, Bindings, MAX_PARAMS};
pub use cache::StatementCache;
pub use name::{Id, PortalName, StatementName};

/// Returns `true` if `sql` contains a `$n` placeholder.
fn has_placeholder(sql: &str) -> bool {
    sql.as_bytes()
        .windows(2)
        .any(|pair| pair[0] == b'$' && pair[1].is_ascii_digit())
}

/// Index of a `$n` placeholder, `$1` is index zero.
fn placeholder_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('$')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<usize>().ok()?.checked_sub(1)
}

fn starts_with_keyword(sql: &str, keyword: &str) -> bool {
    sql.trim_start()
        .get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
}

fn contains_keyword(sql: &str, keyword: &str) -> bool {
    sql.to_ascii_uppercase().contains(keyword)
}

/// A statement routed by its sql text, see the [module docs][self].
pub enum Statement<'c, C: Client = PgClient> {
    Simple(SimpleStatement<'c, C>),
    Extended(ExtendedStatement<'c, C>),
}

impl<'c, C: Client> Statement<'c, C> {
    pub(crate) fn new(conn: &'c Connection<C>, sql: String) -> Result<Self> {
        if ExtendedStatement::<C>::supports(&sql) {
            return Ok(Self::Extended(ExtendedStatement::new(conn, sql)));
        }
        if SimpleStatement::<C>::supports(&sql) {
            return Ok(Self::Simple(SimpleStatement::new(conn, sql)));
        }
        Err(UsageError::new(format!(
            "Statement '{sql}' cannot be created. This is often due to the presence of both \
            multiple statements and parameters at the same time."
        ))
        .into())
    }

    pub fn sql(&self) -> &str {
        match self {
            Self::Simple(stmt) => stmt.sql(),
            Self::Extended(stmt) => stmt.sql(),
        }
    }

    /// Bind the parameter at zero based `index`.
    pub fn bind(&mut self, index: usize, value: impl Encode) -> Result<&mut Self> {
        match self {
            Self::Simple(stmt) => return Err(stmt.binding_unsupported()),
            Self::Extended(stmt) => stmt.bind(index, value)?,
        };
        Ok(self)
    }

    /// Bind the parameter of a `$n` placeholder.
    pub fn bind_named(&mut self, name: &str, value: impl Encode) -> Result<&mut Self> {
        match self {
            Self::Simple(stmt) => return Err(stmt.binding_unsupported()),
            Self::Extended(stmt) => stmt.bind_named(name, value)?,
        };
        Ok(self)
    }

    /// Bind NULL of type `oid` at zero based `index`.
    pub fn bind_null(&mut self, index: usize, oid: Oid) -> Result<&mut Self> {
        match self {
            Self::Simple(stmt) => return Err(stmt.binding_unsupported()),
            Self::Extended(stmt) => stmt.bind_null(index, oid)?,
        };
        Ok(self)
    }

    /// Seal the current binding, following binds fill the next execution.
    pub fn add(&mut self) -> Result<&mut Self> {
        match self {
            Self::Simple(stmt) => return Err(stmt.binding_unsupported()),
            Self::Extended(stmt) => stmt.add()?,
        };
        Ok(self)
    }

    pub async fn execute(self) -> Result<Results> {
        match self {
            Self::Simple(stmt) => Ok(stmt.execute()),
            Self::Extended(stmt) => stmt.execute().await,
        }
    }

    /// Execute, returning every column of inserted rows.
    pub async fn execute_returning_generated_keys(self) -> Result<Results> {
        match self {
            Self::Simple(stmt) => Err(stmt.generated_keys_unsupported()),
            Self::Extended(stmt) => stmt.execute_returning_generated_keys().await,
        }
    }
}

impl<C: Client> std::fmt::Debug for Statement<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple(stmt) => stmt.fmt(f),
            Self::Extended(stmt) => stmt.fmt(f),
        }
    }
}

/// Sql text executed through the simple query flow.
pub struct SimpleStatement<'c, C: Client> {
    conn: &'c Connection<C>,
    sql: String,
}

impl<'c, C: Client> SimpleStatement<'c, C> {
    pub fn supports(sql: &str) -> bool {
        sql.trim().is_empty() || !has_placeholder(sql)
    }

    pub(crate) fn new(conn: &'c Connection<C>, sql: String) -> Self {
        Self { conn, sql }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn execute(self) -> Results {
        query::simple::execute(self.conn.client(), self.conn.codecs_arc(), &self.sql)
    }

    fn binding_unsupported(&self) -> crate::Error {
        UsageError::new(format!(
            "Binding parameters is not supported for the statement '{}'",
            self.sql
        ))
        .into()
    }

    fn generated_keys_unsupported(&self) -> crate::Error {
        UsageError::new(format!(
            "Returning generated keys is not supported for the statement '{}'",
            self.sql
        ))
        .into()
    }
}

impl<C: Client> std::fmt::Debug for SimpleStatement<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleStatement").field("sql", &self.sql).finish()
    }
}

/// Parameterized sql text executed through the extended query flow.
pub struct ExtendedStatement<'c, C: Client> {
    conn: &'c Connection<C>,
    sql: String,
    bindings: Bindings,
}

impl<'c, C: Client> ExtendedStatement<'c, C> {
    pub fn supports(sql: &str) -> bool {
        !sql.trim().is_empty() && !sql.contains(';') && has_placeholder(sql)
    }

    pub(crate) fn new(conn: &'c Connection<C>, sql: String) -> Self {
        Self { conn, sql, bindings: Bindings::default() }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bind the parameter at zero based `index`.
    pub fn bind(&mut self, index: usize, value: impl Encode) -> Result<&mut Self> {
        let param = self.conn.codecs().encode(value)?;
        self.bindings.current().set(index, param)?;
        Ok(self)
    }

    /// Bind the parameter of a `$n` placeholder.
    pub fn bind_named(&mut self, name: &str, value: impl Encode) -> Result<&mut Self> {
        let Some(index) = placeholder_index(name) else {
            return Err(UsageError::new(format!(
                "Identifier '{name}' is not a valid identifier. Should be of the pattern '$n'"
            ))
            .into());
        };
        self.bind(index, value)
    }

    /// Bind NULL of type `oid` at zero based `index`.
    pub fn bind_null(&mut self, index: usize, oid: Oid) -> Result<&mut Self> {
        self.bindings.current().set(index, Parameter::null(PgFormat::Text, oid))?;
        Ok(self)
    }

    /// Seal the current binding, following binds fill the next execution.
    pub fn add(&mut self) -> Result<&mut Self> {
        self.bindings.add()?;
        Ok(self)
    }

    /// Execute once per binding.
    pub async fn execute(self) -> Result<Results> {
        let bindings = self.bindings.finish()?;
        self.conn.execute_extended(&self.sql, &bindings).await
    }

    /// Execute once per binding, an `INSERT` without `RETURNING` clause returns every column of
    /// the inserted rows.
    pub async fn execute_returning_generated_keys(mut self) -> Result<Results> {
        if starts_with_keyword(&self.sql, "INSERT") && !contains_keyword(&self.sql, "RETURNING") {
            let sql = self.sql.trim_end().to_owned();
            self.sql = format!("{sql} RETURNING *");
        }
        self.execute().await
    }
}

impl<C: Client> std::fmt::Debug for ExtendedStatement<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedStatement")
            .field("sql", &self.sql)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Statements joined with `; ` and sent as a single simple query.
pub struct Batch<'c, C: Client = PgClient> {
    conn: &'c Connection<C>,
    statements: Vec<String>,
}

impl<'c, C: Client> Batch<'c, C> {
    pub(crate) fn new(conn: &'c Connection<C>) -> Self {
        Self { conn, statements: vec![] }
    }

    pub fn add(&mut self, sql: impl Into<String>) -> &mut Self {
        self.statements.push(sql.into());
        self
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Execute every statement, one result each.
    pub fn execute(self) -> Results {
        let sql = self.statements.join("; ");
        query::simple::execute(self.conn.client(), self.conn.codecs_arc(), &sql)
    }
}

impl<C: Client> std::fmt::Debug for Batch<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.statements).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ErrorKind,
        mock::{TestClient, command_complete, data_row, row_description},
        postgres::{
            Request, TransactionStatus,
            backend::{BindComplete, CloseComplete, ParseComplete},
            frontend::{Bind, Close, Describe, Execute, Parse, Sync, Target},
            oid,
        },
    };

    fn usage(err: crate::Error) -> String {
        match err.into_kind() {
            ErrorKind::Usage(err) => err.message().to_owned(),
            kind => panic!("{kind}"),
        }
    }

    #[test]
    fn placeholders() {
        assert!(has_placeholder("SELECT $1"));
        assert!(!has_placeholder("SELECT $$text$$"));
        assert_eq!(placeholder_index("$1"), Some(0));
        assert_eq!(placeholder_index("$12"), Some(11));
        assert_eq!(placeholder_index("$0"), None);
        assert_eq!(placeholder_index("1"), None);
        assert_eq!(placeholder_index("$a"), None);
    }

    #[tokio::test]
    async fn routing() {
        let conn = Connection::new(TestClient::new());
        let route = |sql: &str| match conn.create_statement(sql).unwrap() {
            Statement::Simple(_) => "simple",
            Statement::Extended(_) => "extended",
        };
        assert_eq!(route("SELECT * FROM t WHERE id = $1"), "extended");
        assert_eq!(route("SELECT 1; SELECT 2"), "simple");
        assert_eq!(route(""), "simple");
        assert_eq!(route("   "), "simple");

        let err = conn.create_statement("SELECT $1; SELECT 2").unwrap_err();
        assert_eq!(
            usage(err),
            "Statement 'SELECT $1; SELECT 2' cannot be created. This is often due to the presence \
            of both multiple statements and parameters at the same time."
        );
    }

    #[tokio::test]
    async fn simple_statement_rejects_binding() {
        let conn = Connection::new(TestClient::new());
        let mut stmt = conn.create_statement("SELECT 1").unwrap();
        let err = stmt.bind(0, 1i32).unwrap_err();
        assert_eq!(usage(err), "Binding parameters is not supported for the statement 'SELECT 1'");

        let err = stmt.execute_returning_generated_keys().await.unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Usage(_)));
    }

    #[tokio::test]
    async fn binding_errors() {
        let conn = Connection::new(TestClient::new());
        let mut stmt = conn.create_statement("SELECT $1").unwrap();
        let err = stmt.bind_named("id", 1i32).unwrap_err();
        assert_eq!(
            usage(err),
            "Identifier 'id' is not a valid identifier. Should be of the pattern '$n'"
        );

        let err = stmt.bind(usize::MAX, 1i32).unwrap_err();
        assert!(usage(err).starts_with("Parameter index"));
        let err = stmt.bind_null(MAX_PARAMS, oid::INT4).unwrap_err();
        assert!(usage(err).starts_with("Parameter index"));

        let stmt = conn.create_statement("SELECT $1").unwrap();
        assert_eq!(usage(stmt.execute().await.unwrap_err()), "No parameters have been bound");
    }

    fn expect_insert(client: &TestClient, sql: &str, params: &[Vec<Parameter>]) {
        let types: Vec<Oid> = params[0].iter().map(|param| param.oid).collect();
        let mut parse = Request::new();
        parse.push(Parse { prepare_name: "S_0", sql, oids: &types }).push(Sync);
        client.expect(parse, [ParseComplete.into()], TransactionStatus::Idle);

        let mut request = Request::new();
        let mut responses = vec![];
        for (i, params) in params.iter().enumerate() {
            let portal = format!("B_{i}");
            request
                .push(Bind { portal_name: &portal, stmt_name: "S_0", params, result_formats: &[] })
                .push(Describe { target: Target::Portal, name: &portal })
                .push(Execute { portal_name: &portal, max_row: 0 })
                .push(Close { target: Target::Portal, name: &portal });
            responses.extend([
                BindComplete.into(),
                row_description(&[("id", oid::INT4)]),
                data_row(&[Some(&(i + 1).to_string())]),
                command_complete("INSERT 0 1"),
                CloseComplete.into(),
            ]);
        }
        request.push(Sync);
        client.expect(request, responses, TransactionStatus::Idle);
    }

    #[tokio::test]
    async fn returning_generated_keys() {
        let codecs = crate::codec::Codecs::default();
        let params = vec![
            vec![codecs.encode("ferris").unwrap(), Parameter::null(PgFormat::Text, oid::INT4)],
            vec![codecs.encode("corro").unwrap(), codecs.encode(3i32).unwrap()],
        ];
        let client = TestClient::new();
        expect_insert(&client, "INSERT INTO t(name, age) VALUES ($1, $2) RETURNING *", &params);

        let conn = Connection::new(client);
        let mut stmt = conn.create_statement("INSERT INTO t(name, age) VALUES ($1, $2)").unwrap();
        stmt.bind_named("$1", "ferris")
            .unwrap()
            .bind_null(1, oid::INT4)
            .unwrap()
            .add()
            .unwrap()
            .bind(1, 3i32)
            .unwrap()
            .bind(0, "corro")
            .unwrap();

        let results = stmt.execute_returning_generated_keys().await.unwrap().collect().await.unwrap();
        let ids: Vec<i32> = results
            .into_iter()
            .flat_map(|result| result.map(|row, _| Ok(row.get::<i32>("id")?)))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(ids, [1, 2]);
    }

    #[tokio::test]
    async fn batch_joins_statements() {
        let client = TestClient::new();
        client.expect(
            Request::query("DELETE FROM a; DELETE FROM b"),
            [command_complete("DELETE 1"), command_complete("DELETE 2")],
            TransactionStatus::Idle,
        );

        let conn = Connection::new(client);
        let mut batch = conn.create_batch();
        batch.add("DELETE FROM a").add("DELETE FROM b");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.execute().rows_updated().await.unwrap(), 3);
    }
}
