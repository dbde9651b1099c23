//! Hasura-style table verbs.
//!
//! Every verb is a pure document function turning a [`TableOp`] into a
//! [`TableDocument`], plus a [`HasuraClient`] method that executes it and
//! unwraps the result from under the root field.

use quill_builder::{Arguments, Field, Fields, OperationInput, Value, Variables};
use quill_config::Profile;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    client::{ClientConfig, GraphQLClient},
    error::{ClientError, Result},
};

pub const DEFAULT_DATA_FIELDS: &str = "id";
pub const DEFAULT_AGGREGATE_FIELDS: &str = "count";

/// Alias of the row list in a `find` document.
pub const LIST_ALIAS: &str = "list";
/// Alias of the `<table>_aggregate` root in `find` and `aggregate` documents.
pub const AGGREGATE_ALIAS: &str = "datas_aggregate";

const RETURNING: &str = "returning";
const AGGREGATE: &str = "aggregate";

/// A verb applied to one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableOp {
    pub table: String,
    pub args: Arguments,
    /// Selection of each returned row, or of the aggregate for the
    /// aggregate verbs.
    pub fields: Fields,
}

impl TableOp {
    /// Selects `id` by default.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            args: Arguments::new(),
            fields: Fields::from(DEFAULT_DATA_FIELDS),
        }
    }

    /// Selects `count` by default.
    pub fn aggregate(table: impl Into<String>) -> Self {
        Self::new(table).fields(DEFAULT_AGGREGATE_FIELDS)
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn args(mut self, args: Arguments) -> Self {
        self.args.extend(args);
        self
    }

    pub fn fields(mut self, fields: impl Into<Fields>) -> Self {
        self.fields = fields.into();
        self
    }
}

/// A paginated listing with an aggregate over the same filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOp {
    pub table: String,
    /// 1-based.
    pub page: u64,
    pub page_size: u64,
    pub args: Arguments,
    pub fields: Fields,
    pub aggregate_fields: Fields,
}

impl FindOp {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            page: 1,
            page_size: 10,
            args: Arguments::new(),
            fields: Fields::from(DEFAULT_DATA_FIELDS),
            aggregate_fields: Fields::from(DEFAULT_AGGREGATE_FIELDS),
        }
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn args(mut self, args: Arguments) -> Self {
        self.args.extend(args);
        self
    }

    pub fn fields(mut self, fields: impl Into<Fields>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn aggregate_fields(mut self, fields: impl Into<Fields>) -> Self {
        self.aggregate_fields = fields.into();
        self
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// An operation plus the response key its result sits under.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDocument {
    pub input: OperationInput,
    pub root: String,
}

/// Result of [`HasuraClient::find`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T, A> {
    pub list: Vec<T>,
    pub aggregate: A,
}

/// Moves `key` out of `args` and puts a `$key` reference first in its
/// place. Returns the rebuilt arguments and the caller's value, if any.
fn bind_variable(args: Arguments, key: &str) -> (Arguments, Option<JsonValue>) {
    let mut bound = Arguments::with_capacity(args.len() + 1);
    bound.insert(key.to_string(), Value::variable(key));

    let mut supplied = None;
    for (name, value) in args {
        if name == key {
            supplied = Some(value.to_json());
        } else {
            bound.insert(name, value);
        }
    }

    (bound, supplied)
}

fn bound_document(
    op: TableOp,
    name: String,
    root: String,
    key: &str,
    ty: String,
    returning: bool,
) -> TableDocument {
    let (args, supplied) = bind_variable(op.args, key);

    let selection = if returning {
        Fields::from(Field::new(RETURNING).fields(op.fields))
    } else {
        op.fields
    };

    let mut variables = Variables::new();
    if let Some(value) = supplied {
        variables.insert(key.to_string(), value);
    }

    TableDocument {
        input: OperationInput::new()
            .name(name)
            .fields(Field::new(&root).args(args).fields(selection))
            .declare(key, ty)
            .variables(variables),
        root,
    }
}

/// `Get<table>ById { <table>_by_pk(args) { fields } }`
pub fn by_pk_document(op: TableOp) -> TableDocument {
    let root = format!("{}_by_pk", op.table);
    TableDocument {
        input: OperationInput::new()
            .name(format!("Get{}ById", op.table))
            .fields(Field::new(&root).args(op.args).fields(op.fields)),
        root,
    }
}

/// `Get<table>s { <table>(args) { fields } }`
pub fn list_document(op: TableOp) -> TableDocument {
    TableDocument {
        input: OperationInput::new()
            .name(format!("Get{}s", op.table))
            .fields(Field::new(&op.table).args(op.args).fields(op.fields)),
        root: op.table,
    }
}

/// [`list_document`] with `limit: 1`, overriding any caller limit.
pub fn first_document(op: TableOp) -> TableDocument {
    list_document(op.arg("limit", 1))
}

/// `insert_<table>_one(object: $object, ...)`; the row goes in `object`.
pub fn insert_one_document(op: TableOp) -> TableDocument {
    let table = op.table.clone();
    bound_document(
        op,
        format!("Insert{table}One"),
        format!("insert_{table}_one"),
        "object",
        format!("{table}_insert_input!"),
        false,
    )
}

pub fn insert_document(op: TableOp) -> TableDocument {
    let table = op.table.clone();
    bound_document(
        op,
        format!("Insert{table}"),
        format!("insert_{table}"),
        "objects",
        format!("[{table}_insert_input!]!"),
        true,
    )
}

pub fn update_by_pk_document(op: TableOp) -> TableDocument {
    let table = op.table.clone();
    bound_document(
        op,
        format!("Update{table}ById"),
        format!("update_{table}_by_pk"),
        "_set",
        format!("{table}_set_input!"),
        false,
    )
}

pub fn update_document(op: TableOp) -> TableDocument {
    let table = op.table.clone();
    bound_document(
        op,
        format!("Update{table}"),
        format!("update_{table}"),
        "_set",
        format!("{table}_set_input!"),
        true,
    )
}

/// `update_<table>_many(updates: $updates)`. Arguments other than
/// `updates` are ignored.
pub fn update_many_document(mut op: TableOp) -> TableDocument {
    let table = op.table.clone();
    op.args.retain(|key, _| key == "updates");
    bound_document(
        op,
        format!("Update{table}Many"),
        format!("update_{table}_many"),
        "updates",
        format!("[{table}_updates!]!"),
        true,
    )
}

/// `Delete<table> { delete_<table>(args) { returning { fields } } }`
pub fn delete_document(op: TableOp) -> TableDocument {
    let root = format!("delete_{}", op.table);
    TableDocument {
        input: OperationInput::new()
            .name(format!("Delete{}", op.table))
            .fields(
                Field::new(&root)
                    .args(op.args)
                    .fields(Field::new(RETURNING).fields(op.fields)),
            ),
        root,
    }
}

pub fn delete_by_pk_document(op: TableOp) -> TableDocument {
    let root = format!("delete_{}_by_pk", op.table);
    TableDocument {
        input: OperationInput::new()
            .name(format!("Delete{}ById", op.table))
            .fields(Field::new(&root).args(op.args).fields(op.fields)),
        root,
    }
}

/// One page of rows plus an aggregate over the same `where`.
///
/// The aggregate root carries only `where`; ordering and paging
/// arguments apply to the list alone.
pub fn find_document(op: FindOp) -> Result<TableDocument> {
    if op.page < 1 || op.page_size < 1 {
        return Err(ClientError::InvalidPagination {
            page: op.page,
            page_size: op.page_size,
        });
    }

    let offset = op.offset();
    let mut aggregate_args = Arguments::new();
    if let Some(filter) = op.args.get("where") {
        aggregate_args.insert("where".into(), filter.clone());
    }

    let list = Field::new(&op.table)
        .alias(LIST_ALIAS)
        .args(op.args)
        .arg("limit", op.page_size)
        .arg("offset", offset)
        .fields(op.fields);

    let aggregate = Field::new(format!("{}_aggregate", op.table))
        .alias(AGGREGATE_ALIAS)
        .args(aggregate_args)
        .fields(Field::new(AGGREGATE).fields(op.aggregate_fields));

    Ok(TableDocument {
        input: OperationInput::new()
            .name(format!("Find{}", op.table))
            .fields(vec![Fields::from(list), Fields::from(aggregate)]),
        root: LIST_ALIAS.to_string(),
    })
}

/// `<table>Aggregate { datas_aggregate: <table>_aggregate(args) { aggregate { fields } } }`
pub fn aggregate_document(op: TableOp) -> TableDocument {
    TableDocument {
        input: OperationInput::new()
            .name(format!("{}Aggregate", op.table))
            .fields(
                Field::new(format!("{}_aggregate", op.table))
                    .alias(AGGREGATE_ALIAS)
                    .args(op.args)
                    .fields(Field::new(AGGREGATE).fields(op.fields)),
            ),
        root: AGGREGATE_ALIAS.to_string(),
    }
}

/// Removes `key` from a JSON object, yielding `null` for anything else.
fn take(value: JsonValue, key: &str) -> JsonValue {
    match value {
        JsonValue::Object(mut map) => map.remove(key).unwrap_or(JsonValue::Null),
        _ => JsonValue::Null,
    }
}

fn decode<T: DeserializeOwned>(value: JsonValue) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// A `null` list decodes as empty.
fn decode_list<T: DeserializeOwned>(value: JsonValue) -> Result<Vec<T>> {
    match value {
        JsonValue::Null => Ok(Vec::new()),
        value => decode(value),
    }
}

/// Table verbs over a [`GraphQLClient`].
pub struct HasuraClient {
    client: GraphQLClient,
}

impl HasuraClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_client(GraphQLClient::new(config)?))
    }

    pub fn from_client(client: GraphQLClient) -> Self {
        Self {
            client,
        }
    }

    pub fn from_profile(name: &str, profile: &Profile) -> Result<Self> {
        Ok(Self::from_client(GraphQLClient::from_profile(name, profile)?))
    }

    /// The underlying dispatcher, for headers, listeners and raw documents.
    pub fn graphql(&self) -> &GraphQLClient {
        &self.client
    }

    pub fn graphql_mut(&mut self) -> &mut GraphQLClient {
        &mut self.client
    }

    pub fn into_inner(self) -> GraphQLClient {
        self.client
    }

    fn query_root(&self, doc: TableDocument) -> Result<JsonValue> {
        let data: JsonValue = self.client.query(doc.input)?;
        Ok(take(data, &doc.root))
    }

    fn mutate_root(&self, doc: TableDocument) -> Result<JsonValue> {
        let data: JsonValue = self.client.mutate(doc.input)?;
        Ok(take(data, &doc.root))
    }

    /// `None` when no row has the key.
    pub fn by_pk<T: DeserializeOwned>(&self, op: TableOp) -> Result<Option<T>> {
        decode(self.query_root(by_pk_document(op))?)
    }

    pub fn list<T: DeserializeOwned>(&self, op: TableOp) -> Result<Vec<T>> {
        decode_list(self.query_root(list_document(op))?)
    }

    pub fn first<T: DeserializeOwned>(&self, op: TableOp) -> Result<Option<T>> {
        let rows: Vec<T> = decode_list(self.query_root(first_document(op))?)?;
        Ok(rows.into_iter().next())
    }

    /// Expects the row under the `object` argument.
    pub fn insert_one<T: DeserializeOwned>(&self, op: TableOp) -> Result<Option<T>> {
        decode(self.mutate_root(insert_one_document(op))?)
    }

    /// Expects the rows under the `objects` argument.
    pub fn insert<T: DeserializeOwned>(&self, op: TableOp) -> Result<Vec<T>> {
        decode_list(take(self.mutate_root(insert_document(op))?, RETURNING))
    }

    /// Expects the changes under `_set` and the key under `pk_columns`.
    pub fn update_by_pk<T: DeserializeOwned>(&self, op: TableOp) -> Result<Option<T>> {
        decode(self.mutate_root(update_by_pk_document(op))?)
    }

    pub fn update<T: DeserializeOwned>(&self, op: TableOp) -> Result<Vec<T>> {
        decode_list(take(self.mutate_root(update_document(op))?, RETURNING))
    }

    /// One `returning` list per entry of `updates`.
    pub fn update_many<T: DeserializeOwned>(&self, op: TableOp) -> Result<Vec<Vec<T>>> {
        match self.mutate_root(update_many_document(op))? {
            JsonValue::Array(results) => results
                .into_iter()
                .map(|result| decode_list(take(result, RETURNING)))
                .collect(),
            JsonValue::Null => Ok(Vec::new()),
            other => Err(ClientError::InvalidResponse {
                reason: format!("expected a list of update results, got {other}"),
            }),
        }
    }

    pub fn delete<T: DeserializeOwned>(&self, op: TableOp) -> Result<Vec<T>> {
        decode_list(take(self.mutate_root(delete_document(op))?, RETURNING))
    }

    pub fn delete_by_pk<T: DeserializeOwned>(&self, op: TableOp) -> Result<Option<T>> {
        decode(self.mutate_root(delete_by_pk_document(op))?)
    }

    pub fn find<T, A>(&self, op: FindOp) -> Result<Page<T, A>>
    where
        T: DeserializeOwned,
        A: DeserializeOwned,
    {
        let doc = find_document(op)?;
        let mut data = match self.client.query::<JsonValue>(doc.input)? {
            JsonValue::Object(map) => map,
            _ => Default::default(),
        };

        let list = decode_list(data.remove(LIST_ALIAS).unwrap_or(JsonValue::Null))?;
        let aggregate = decode(take(
            data.remove(AGGREGATE_ALIAS).unwrap_or(JsonValue::Null),
            AGGREGATE,
        ))?;

        Ok(Page {
            list,
            aggregate,
        })
    }

    pub fn aggregate<A: DeserializeOwned>(&self, op: TableOp) -> Result<A> {
        decode(take(self.query_root(aggregate_document(op))?, AGGREGATE))
    }
}
