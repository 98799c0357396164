//! Types matcher: `resolveType` for Union and Interface types
//!
//! A [`TypesMatcher`] holds an ordered list of matcher functions. Resolving a
//! value runs them one after another, in registration order, and stops at the
//! first one that yields a concrete object type. Later matchers are never
//! invoked once an earlier one has matched.
//!
//! ```rust
//! use async_graphql::Value;
//! use graphql_type_kit::{from_fn, when, GraphQLType, ObjectType, TypesMatcher};
//!
//! # async fn example() -> async_graphql::Result<()> {
//! let user = ObjectType::new("User")?;
//! let post = ObjectType::new("Post")?;
//!
//! let matcher = TypesMatcher::<Value>::new();
//! matcher.use_matchers([
//!     from_fn(|_value: &Value, _info| Ok(None)).into(),
//!     when(|value: &Value| value == &Value::from("post"), post).into(),
//! ])?;
//! matcher.use_matcher(when(|_: &Value| true, user));
//!
//! let resolved = matcher.resolve_type(&Value::from("post"), None).await?;
//! assert_eq!(resolved.map(|ty| ty.name().to_owned()), Some("Post".to_owned()));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_graphql::Value;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, trace};

use crate::context::ResolveInfo;
use crate::types::{GraphQLType, ObjectType};
use crate::{GraphQLError, Result};

/// Outcome of a single matcher: a type, no match, or an error
pub type MatchResult = async_graphql::Result<Option<GraphQLType>>;

/// Outcome of a full resolution
pub type ResolveResult = async_graphql::Result<Option<Arc<ObjectType>>>;

/// A matcher function
///
/// Returning `Ok(None)`, or any type that is not an object type, means "no
/// match". Returning `Err` aborts the resolution.
#[async_trait]
pub trait TypeMatcher<V>: Send + Sync {
    async fn match_type(&self, value: &V, info: Option<&ResolveInfo>) -> MatchResult;
}

/// Matcher backed by a synchronous closure
pub struct FnMatcher<F>(F);

#[async_trait]
impl<V, F> TypeMatcher<V> for FnMatcher<F>
where
    V: Sync,
    F: Fn(&V, Option<&ResolveInfo>) -> MatchResult + Send + Sync,
{
    async fn match_type(&self, value: &V, info: Option<&ResolveInfo>) -> MatchResult {
        (self.0)(value, info)
    }
}

/// Wrap a synchronous closure as a matcher
pub fn from_fn<V, F>(f: F) -> FnMatcher<F>
where
    F: Fn(&V, Option<&ResolveInfo>) -> MatchResult + Send + Sync,
{
    FnMatcher(f)
}

/// Matcher backed by a closure returning a boxed future
pub struct AsyncFnMatcher<F>(F);

#[async_trait]
impl<V, F> TypeMatcher<V> for AsyncFnMatcher<F>
where
    V: Sync,
    F: for<'a> Fn(&'a V, Option<&'a ResolveInfo>) -> BoxFuture<'a, MatchResult> + Send + Sync,
{
    async fn match_type(&self, value: &V, info: Option<&ResolveInfo>) -> MatchResult {
        (self.0)(value, info).await
    }
}

/// Wrap an asynchronous closure as a matcher
///
/// ```rust
/// use async_graphql::Value;
/// use futures::FutureExt;
/// use graphql_type_kit::{from_async_fn, MatcherEntry};
///
/// let entry: MatcherEntry<Value> = from_async_fn(|_value: &Value, _info| {
///     async move { Ok(None) }.boxed()
/// })
/// .into();
/// ```
pub fn from_async_fn<V, F>(f: F) -> AsyncFnMatcher<F>
where
    F: for<'a> Fn(&'a V, Option<&'a ResolveInfo>) -> BoxFuture<'a, MatchResult> + Send + Sync,
{
    AsyncFnMatcher(f)
}

/// Matcher that yields a fixed object type whenever its predicate holds
pub struct When<P> {
    predicate: P,
    object: Arc<ObjectType>,
}

#[async_trait]
impl<V, P> TypeMatcher<V> for When<P>
where
    V: Sync,
    P: Fn(&V) -> bool + Send + Sync,
{
    async fn match_type(&self, value: &V, _info: Option<&ResolveInfo>) -> MatchResult {
        Ok((self.predicate)(value).then(|| GraphQLType::Object(self.object.clone())))
    }
}

/// Match `object` whenever `predicate` holds for the value
pub fn when<V, P>(predicate: P, object: impl Into<Arc<ObjectType>>) -> When<P>
where
    P: Fn(&V) -> bool + Send + Sync,
{
    When {
        predicate,
        object: object.into(),
    }
}

/// An entry passed to [`TypesMatcher::use_matchers`]
///
/// Lists are flattened exactly one level deep. Anything that is not a matcher
/// after flattening (a plain value, a list nested twice) is rejected.
pub enum MatcherEntry<V> {
    Matcher(Arc<dyn TypeMatcher<V>>),
    List(Vec<MatcherEntry<V>>),
    Value(Value),
}

impl<V> MatcherEntry<V> {
    /// Wrap any [`TypeMatcher`] as an entry
    pub fn matcher(matcher: impl TypeMatcher<V> + 'static) -> Self {
        Self::Matcher(Arc::new(matcher))
    }

    fn describe(&self) -> String {
        match self {
            Self::Matcher(_) => "a function".to_string(),
            Self::List(entries) => format!("a list of {} entries", entries.len()),
            Self::Value(value) => format!("value `{value}`"),
        }
    }
}

impl<V> fmt::Debug for MatcherEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matcher(_) => f.write_str("Matcher(..)"),
            Self::List(entries) => f.debug_tuple("List").field(entries).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl<V> From<Arc<dyn TypeMatcher<V>>> for MatcherEntry<V> {
    fn from(matcher: Arc<dyn TypeMatcher<V>>) -> Self {
        Self::Matcher(matcher)
    }
}

impl<V> From<Vec<MatcherEntry<V>>> for MatcherEntry<V> {
    fn from(entries: Vec<MatcherEntry<V>>) -> Self {
        Self::List(entries)
    }
}

impl<V> From<Value> for MatcherEntry<V> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl<V, F> From<FnMatcher<F>> for MatcherEntry<V>
where
    FnMatcher<F>: TypeMatcher<V> + 'static,
{
    fn from(matcher: FnMatcher<F>) -> Self {
        Self::matcher(matcher)
    }
}

impl<V, F> From<AsyncFnMatcher<F>> for MatcherEntry<V>
where
    AsyncFnMatcher<F>: TypeMatcher<V> + 'static,
{
    fn from(matcher: AsyncFnMatcher<F>) -> Self {
        Self::matcher(matcher)
    }
}

impl<V, P> From<When<P>> for MatcherEntry<V>
where
    When<P>: TypeMatcher<V> + 'static,
{
    fn from(matcher: When<P>) -> Self {
        Self::matcher(matcher)
    }
}

type Matchers<V> = Vec<Arc<dyn TypeMatcher<V>>>;

/// Ordered registry of matchers
///
/// Clones share the same registry. Registration swaps in a new list, so a
/// resolution already in flight keeps iterating the list it started with.
pub struct TypesMatcher<V = Value> {
    matchers: Arc<ArcSwap<Matchers<V>>>,
}

impl<V> TypesMatcher<V> {
    /// Create an empty matcher
    pub fn new() -> Self {
        Self {
            matchers: Arc::new(ArcSwap::from_pointee(Vec::new())),
        }
    }

    /// Create a matcher seeded with `entries`
    pub fn with_matchers<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = MatcherEntry<V>>,
    {
        let matcher = Self::new();
        matcher.use_matchers(entries)?;
        Ok(matcher)
    }

    /// Append matchers to the end of the list
    ///
    /// Entries are flattened one level and validated before anything is
    /// appended: if any entry is not a matcher, the call fails with
    /// [`GraphQLError::InvalidMatcher`] and the list is left untouched.
    pub fn use_matchers<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = MatcherEntry<V>>,
    {
        let batch = flatten(entries)
            .into_iter()
            .map(|entry| match entry {
                MatcherEntry::Matcher(matcher) => Ok(matcher),
                other => Err(GraphQLError::InvalidMatcher(other.describe())),
            })
            .collect::<Result<Matchers<V>>>()?;

        if batch.is_empty() {
            return Ok(());
        }

        self.append(&batch);
        Ok(())
    }

    /// Append a single matcher
    pub fn use_matcher(&self, matcher: impl TypeMatcher<V> + 'static) {
        let matcher: Arc<dyn TypeMatcher<V>> = Arc::new(matcher);
        self.append(&[matcher]);
    }

    fn append(&self, batch: &[Arc<dyn TypeMatcher<V>>]) {
        let previous = self.matchers.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + batch.len());
            next.extend(current.iter().cloned());
            next.extend(batch.iter().cloned());
            next
        });

        debug!(
            added = batch.len(),
            total = previous.len() + batch.len(),
            "registered type matchers"
        );
    }

    /// Number of registered matchers
    pub fn len(&self) -> usize {
        self.matchers.load().len()
    }

    /// Whether no matcher is registered
    pub fn is_empty(&self) -> bool {
        self.matchers.load().is_empty()
    }

    /// Resolve the concrete object type of `value`
    ///
    /// Matchers run sequentially in registration order; the first object type
    /// returned wins. Resolves to `None` when no matcher matched. A matcher
    /// error is returned as-is and stops the resolution.
    pub async fn resolve_type(&self, value: &V, info: Option<&ResolveInfo>) -> ResolveResult {
        let snapshot = self.matchers.load_full();

        for (index, matcher) in snapshot.iter().enumerate() {
            trace!(index, "invoking type matcher");

            if let Some(object) = matcher
                .match_type(value, info)
                .await?
                .and_then(GraphQLType::into_object)
            {
                debug!(index, type_name = object.name(), "type matcher matched");
                return Ok(Some(object));
            }
        }

        debug!(matchers = snapshot.len(), "no type matcher matched");
        Ok(None)
    }

    /// The resolver as a standalone function, for places that expect a
    /// `resolveType` hook rather than a [`TypesMatcher`]
    pub fn resolver(
        &self,
    ) -> impl for<'a> Fn(&'a V, Option<&'a ResolveInfo>) -> BoxFuture<'a, ResolveResult>
           + Clone
           + Send
           + Sync
           + 'static
    where
        V: Send + Sync + 'static,
    {
        let matcher = self.clone();
        resolve_type_hook::<V, _>(move |value, info| {
            let matcher = matcher.clone();
            async move { matcher.resolve_type(value, info).await }.boxed()
        })
    }
}

fn resolve_type_hook<V, F>(f: F) -> F
where
    F: for<'a> Fn(&'a V, Option<&'a ResolveInfo>) -> BoxFuture<'a, ResolveResult>,
{
    f
}

fn flatten<V, I>(entries: I) -> Vec<MatcherEntry<V>>
where
    I: IntoIterator<Item = MatcherEntry<V>>,
{
    entries
        .into_iter()
        .flat_map(|entry| match entry {
            MatcherEntry::List(nested) => nested,
            other => vec![other],
        })
        .collect()
}

impl<V> Clone for TypesMatcher<V> {
    fn clone(&self) -> Self {
        Self {
            matchers: self.matchers.clone(),
        }
    }
}

impl<V> Default for TypesMatcher<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for TypesMatcher<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypesMatcher")
            .field("matchers", &self.len())
            .finish()
    }
}

/// Create a types matcher from an initial list of matchers
pub fn create_types_matcher<V, I>(entries: I) -> Result<TypesMatcher<V>>
where
    I: IntoIterator<Item = MatcherEntry<V>>,
{
    TypesMatcher::with_matchers(entries)
}
