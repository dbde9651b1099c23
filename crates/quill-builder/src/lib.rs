//! Typed construction of GraphQL documents.
//!
//! A document is assembled from an [`OperationInput`]: the operation kind and
//! name, a [`Fields`] selection tree whose nodes carry inline [`Arguments`],
//! and a table of variable declarations. Assembly renders the document text
//! and projects the supplied runtime variables onto the declared ones.

pub mod encode;
pub mod error;
pub mod fields;
pub mod operation;
pub mod render;
pub mod value;
pub mod variables;

pub use encode::{encode_arguments, encode_value};
pub use error::{BuildError, Result};
pub use fields::{Directive, Field, Fields};
pub use operation::{
    assemble, build_mutation, build_query, build_subscription, render_header, OperationInput,
    OperationResult, OperationType, DEFAULT_OPERATION_NAME, SENTINEL_FIELD,
};
pub use render::{render_directive, render_fields, INDENT_STEP};
pub use value::{Arguments, Value, RAW_KEY};
pub use variables::{bare_name, declared_name, project_variables, VariableDefinitions, Variables};
