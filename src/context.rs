//! Resolution context for type matchers
//!
//! Provides helpers for:
//! - Capturing where in a query a type is being resolved ([`ResolveInfo`])
//! - Turning a matched value into a dynamic [`FieldValue`] tagged with its
//!   concrete object type, for Union and Interface fields

use std::any::Any;

use async_graphql::dynamic::{FieldValue, ResolverContext};

use crate::matcher::TypesMatcher;

/// Where an abstract type is being resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveInfo {
    /// Name of the field being resolved
    pub field_name: String,
    /// Response path of the field, e.g. `["search", "0"]`
    pub path: Vec<String>,
    /// Name of the Union or Interface the field returns
    pub return_type: String,
}

impl ResolveInfo {
    pub fn new(field_name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            path: Vec::new(),
            return_type: return_type.into(),
        }
    }

    /// Extract resolution info from a dynamic field resolver context
    pub fn from_context(ctx: &ResolverContext<'_>, return_type: impl Into<String>) -> Self {
        Self {
            field_name: ctx.ctx.field().name().to_string(),
            path: ctx
                .ctx
                .path_node
                .map(|node| node.to_string_vec())
                .unwrap_or_default(),
            return_type: return_type.into(),
        }
    }
}

impl<V> TypesMatcher<V>
where
    V: Any + Send + Sync,
{
    /// Resolve the concrete type of `value` and wrap it for a Union or
    /// Interface field
    ///
    /// Yields `Ok(None)` when no matcher matched, leaving it to the executor
    /// to report a null in a non-null position.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use async_graphql::dynamic::{Field, FieldFuture, TypeRef};
    /// use async_graphql::Value;
    /// use graphql_type_kit::{ResolveInfo, TypesMatcher};
    ///
    /// fn search_field(matcher: TypesMatcher<Value>) -> Field {
    ///     Field::new("search", TypeRef::named("SearchResult"), move |ctx| {
    ///         let matcher = matcher.clone();
    ///         FieldFuture::new(async move {
    ///             let info = ResolveInfo::from_context(&ctx, "SearchResult");
    ///             matcher.resolve_field_value(Value::from("hit"), Some(&info)).await
    ///         })
    ///     })
    /// }
    /// ```
    pub async fn resolve_field_value<'a>(
        &self,
        value: V,
        info: Option<&ResolveInfo>,
    ) -> async_graphql::Result<Option<FieldValue<'a>>> {
        let resolved = self.resolve_type(&value, info).await?;

        Ok(resolved.map(|object| FieldValue::owned_any(value).with_type(object.name().to_owned())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{from_async_fn, from_fn, when};
    use crate::types::{GraphQLType, ObjectType};
    use async_graphql::dynamic::{Field, FieldFuture, Object, Schema, TypeRef, Union};
    use async_graphql::Value;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn lookup(value: &Value, key: &str) -> Value {
        match value {
            Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    fn has_key(value: &Value, key: &str) -> bool {
        matches!(value, Value::Object(map) if map.contains_key(key))
    }

    fn string_field(name: &'static str) -> Field {
        Field::new(name, TypeRef::named_nn(TypeRef::STRING), move |ctx| {
            FieldFuture::new(async move {
                let value = ctx.parent_value.try_downcast_ref::<Value>()?;
                Ok(Some(FieldValue::value(lookup(value, name))))
            })
        })
    }

    fn search_results() -> Vec<Value> {
        vec![
            Value::from_json(json!({ "name": "Ada" })).unwrap(),
            Value::from_json(json!({ "title": "Notes on the Analytical Engine" })).unwrap(),
        ]
    }

    fn schema(matcher: TypesMatcher<Value>) -> Schema {
        let search_matcher = matcher.clone();
        let missing_matcher = matcher.clone();
        let required_matcher = matcher;

        let query = Object::new("Query")
            .field(Field::new(
                "search",
                TypeRef::named_nn_list_nn("SearchResult"),
                move |ctx| {
                    let matcher = search_matcher.clone();
                    FieldFuture::new(async move {
                        let info = ResolveInfo::from_context(&ctx, "SearchResult");
                        let mut items = Vec::new();
                        for value in search_results() {
                            if let Some(item) = matcher.resolve_field_value(value, Some(&info)).await? {
                                items.push(item);
                            }
                        }
                        Ok(Some(FieldValue::list(items)))
                    })
                },
            ))
            .field(Field::new(
                "missing",
                TypeRef::named("SearchResult"),
                move |ctx| {
                    let matcher = missing_matcher.clone();
                    FieldFuture::new(async move {
                        let info = ResolveInfo::from_context(&ctx, "SearchResult");
                        matcher.resolve_field_value(Value::Null, Some(&info)).await
                    })
                },
            ))
            .field(Field::new(
                "required",
                TypeRef::named_nn("SearchResult"),
                move |ctx| {
                    let matcher = required_matcher.clone();
                    FieldFuture::new(async move {
                        let info = ResolveInfo::from_context(&ctx, "SearchResult");
                        matcher.resolve_field_value(Value::Null, Some(&info)).await
                    })
                },
            ));

        Schema::build("Query", None, None)
            .register(Object::new("User").field(string_field("name")))
            .register(Object::new("Post").field(string_field("title")))
            .register(Union::new("SearchResult").possible_type("User").possible_type("Post"))
            .register(query)
            .finish()
            .unwrap()
    }

    #[tokio::test]
    async fn test_union_members_resolve_through_matcher() {
        let user = Arc::new(ObjectType::new("User").unwrap());
        let post = Arc::new(ObjectType::new("Post").unwrap());

        let matcher = TypesMatcher::<Value>::new();
        matcher.use_matcher(when(|value: &Value| has_key(value, "name"), user));
        matcher.use_matcher(from_async_fn(move |value: &Value, _info| {
            let post = post.clone();
            let is_post = has_key(value, "title");
            async move { Ok(is_post.then(|| GraphQLType::Object(post))) }.boxed()
        }));

        let response = schema(matcher)
            .execute(
                "{ search { __typename ... on User { name } ... on Post { title } } missing { __typename } }",
            )
            .await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({
                "search": [
                    { "__typename": "User", "name": "Ada" },
                    { "__typename": "Post", "title": "Notes on the Analytical Engine" }
                ],
                "missing": null
            })
        );
    }

    #[tokio::test]
    async fn test_matchers_receive_resolve_info() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);

        let matcher = TypesMatcher::<Value>::new();
        matcher.use_matcher(from_fn(move |_value: &Value, info: Option<&ResolveInfo>| {
            record.lock().unwrap().push(info.cloned());
            Ok(None)
        }));

        let response = schema(matcher).execute("{ missing { __typename } }").await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let info = seen[0].as_ref().unwrap();
        assert_eq!(info.field_name, "missing");
        assert_eq!(info.path, ["missing"]);
        assert_eq!(info.return_type, "SearchResult");
    }

    #[tokio::test]
    async fn test_unmatched_value_in_non_null_position_is_an_error() {
        let matcher = TypesMatcher::<Value>::new();

        let response = schema(matcher.clone()).execute("{ missing { __typename } }").await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(response.data.into_json().unwrap(), json!({ "missing": null }));

        let response = schema(matcher).execute("{ required { __typename } }").await;
        assert_eq!(response.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_matcher_errors_surface_as_field_errors() {
        let matcher = TypesMatcher::<Value>::new();
        matcher.use_matcher(from_fn(|_value: &Value, _info: Option<&ResolveInfo>| {
            Err(async_graphql::Error::new("type lookup failed"))
        }));

        let response = schema(matcher).execute("{ missing { __typename } }").await;

        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "type lookup failed");
    }
}
