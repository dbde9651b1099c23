//! Dispatching assembled GraphQL documents.
//!
//! [`GraphQLClient`] sends documents built by `quill-builder` over a
//! [`quill_http::Transport`], layering headers, auth and request listeners.
//! [`HasuraClient`] adds the Hasura table verbs on top.

pub mod client;
pub mod error;
pub mod hasura;

pub use client::{ClientConfig, GraphQLClient};
pub use error::{ClientError, GraphQLError, GraphQLFailure, Location, Result, GRAPHQL_ERRORS};
pub use hasura::{
    aggregate_document, by_pk_document, delete_by_pk_document, delete_document, find_document,
    first_document, insert_document, insert_one_document, list_document, update_by_pk_document,
    update_document, update_many_document, FindOp, HasuraClient, Page, TableDocument, TableOp,
};
