//! # graphql-type-kit
//!
//! Small helpers for building GraphQL schemas on top of async-graphql's
//! dynamic schema.
//!
//! ## Features
//!
//! - **Page Types** - `<Element>Page` object types with count/limit/offset and
//!   derived navigation fields (`current`, `hasNext`, `last`)
//! - **Types Matcher** - ordered, first-match-wins `resolveType` for Union and
//!   Interface types, built from sync or async matcher functions
//! - **Type Descriptors** - a kind-aware type model that lowers to dynamic
//!   schema `TypeRef`s
//!
//! ## Usage
//!
//! ```rust
//! use async_graphql::Value;
//! use graphql_type_kit::{
//!     create_page_type, create_types_matcher, when, GraphQLType, ObjectType, PageTypeConfig,
//! };
//!
//! # fn main() -> graphql_type_kit::Result<()> {
//! let user = ObjectType::new("User")?;
//!
//! let page = create_page_type(PageTypeConfig::new(GraphQLType::object(user.clone())))?;
//! assert_eq!(page.name(), "UserPage");
//!
//! let matcher = create_types_matcher::<Value, _>([
//!     when(|value: &Value| matches!(value, Value::Object(_)), user).into(),
//! ])?;
//! assert_eq!(matcher.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod matcher;
pub mod pagination;
pub mod types;

pub use context::ResolveInfo;
pub use matcher::{
    create_types_matcher, from_async_fn, from_fn, when, MatchResult, MatcherEntry,
    ResolveResult, TypeMatcher, TypesMatcher,
};
pub use pagination::{
    create_page_type, ElementType, ListFieldConfig, Page, PageRow, PageType, PageTypeConfig,
    PageTypeOptions,
};
pub use types::{ArgumentDef, FieldDef, GraphQLType, ObjectType};

use thiserror::Error;

/// GraphQL helper errors
#[derive(Error, Debug)]
pub enum GraphQLError {
    #[error("Expected a types matcher to be a function, got {0}")]
    InvalidMatcher(String),

    #[error("Invalid type name: {0:?}")]
    InvalidTypeName(String),

    #[error("Expected a nullable type, got {0}")]
    NullableTypeExpected(String),
}

/// Result type for GraphQL helper operations
pub type Result<T> = std::result::Result<T, GraphQLError>;
