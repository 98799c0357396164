//! Offset pagination page types
//!
//! [`create_page_type`] wraps an element type into a `<Element>Page` object
//! type carrying the rows of the current page plus navigation fields. The
//! navigation values are derived from a [`Page`] descriptor on read.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, FieldValue, Object, ResolverContext};
use async_graphql::Value;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::types::{to_dynamic_object, ArgumentDef, FieldDef, GraphQLType, ObjectType};
use crate::Result;

/// Suffix appended to the element type name
pub const PAGE_SUFFIX: &str = "Page";

const PAGE_DESCRIPTION: &str = "Returns a page frame and navigation information.";

/// Page descriptor: rows of the current page and pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub rows: Vec<T>,
    /// 1-indexed page number
    #[serde(default)]
    pub page: Option<u32>,
    /// Rows per page, `None` means unbounded
    #[serde(default)]
    pub limit: Option<u32>,
    /// Total number of rows across all pages
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub offset: u64,
}

impl<T> Page<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows,
            page: None,
            limit: None,
            count: None,
            offset: 0,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Current page number, 1 when absent
    pub fn current(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// `count - limit * page > 0`, false unless limit, page and count are all set
    pub fn has_next(&self) -> bool {
        self.span().is_some_and(|(count, span)| count > span)
    }

    /// `ceil(count / (limit * page))`, 1 unless limit, page and count are all
    /// set and the divisor is non-zero
    pub fn last_page(&self) -> u64 {
        match self.span() {
            Some((count, span)) if span > 0 => count.div_ceil(span),
            _ => 1,
        }
    }

    fn span(&self) -> Option<(u64, u64)> {
        match (self.limit, self.page, self.count) {
            (Some(limit), Some(page), Some(count)) => {
                Some((count, u64::from(limit).saturating_mul(u64::from(page))))
            }
            _ => None,
        }
    }
}

/// Conversion of a page row into the value handed to the element type
pub trait PageRow: Send + Sync + 'static {
    fn to_field_value(&self) -> FieldValue<'_>;
}

impl PageRow for Value {
    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::value(self.clone())
    }
}

/// Element type of a page, either as a single (possibly wrapped) type or as
/// an already decomposed `(named type, non-null)` pair
#[derive(Debug, Clone)]
pub enum ElementType {
    Single(GraphQLType),
    Decomposed { named: GraphQLType, non_null: bool },
}

impl ElementType {
    fn decompose(self) -> (GraphQLType, bool) {
        match self {
            Self::Single(ty) => {
                let non_null = ty.is_non_null_type();
                (ty.named_type().clone(), non_null)
            }
            Self::Decomposed { named, non_null } => (named, non_null),
        }
    }
}

impl From<GraphQLType> for ElementType {
    fn from(ty: GraphQLType) -> Self {
        Self::Single(ty)
    }
}

impl From<(GraphQLType, bool)> for ElementType {
    fn from((named, non_null): (GraphQLType, bool)) -> Self {
        Self::Decomposed { named, non_null }
    }
}

/// Extra configuration copied onto the generated `list` field
///
/// The field type, resolver and description are always set by the factory.
#[derive(Debug, Clone, Default)]
pub struct ListFieldConfig {
    pub arguments: Vec<ArgumentDef>,
    pub deprecation: Option<String>,
    /// Descriptor-only metadata: kept on the `list` [`FieldDef`] for callers
    /// to read, not lowered by [`PageType::to_dynamic`]
    pub extensions: Map<String, JsonValue>,
}

/// Serializable page type options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageTypeOptions {
    pub required: bool,
    pub deprecation: Option<String>,
    pub extensions: Map<String, JsonValue>,
}

/// Input of [`create_page_type`]
#[derive(Debug, Clone)]
pub struct PageTypeConfig {
    pub element: ElementType,
    /// Whether the `list` field itself is non-null
    pub required: bool,
    pub list_field: ListFieldConfig,
}

impl PageTypeConfig {
    pub fn new(element: impl Into<ElementType>) -> Self {
        Self {
            element: element.into(),
            required: false,
            list_field: ListFieldConfig::default(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn list_field(mut self, list_field: ListFieldConfig) -> Self {
        self.list_field = list_field;
        self
    }

    pub fn argument(mut self, argument: ArgumentDef) -> Self {
        self.list_field.arguments.push(argument);
        self
    }

    pub fn with_options(mut self, options: PageTypeOptions) -> Self {
        self.required = options.required;
        self.list_field.deprecation = options.deprecation;
        self.list_field.extensions = options.extensions;
        self
    }
}

/// Generated page object type
#[derive(Debug, Clone)]
pub struct PageType {
    object: Arc<ObjectType>,
}

impl PageType {
    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn object(&self) -> &Arc<ObjectType> {
        &self.object
    }

    pub fn to_type(&self) -> GraphQLType {
        GraphQLType::Object(self.object.clone())
    }

    /// Build the dynamic schema object
    ///
    /// Every field resolves from a parent [`Page<T>`], so the field returning
    /// this type must yield `FieldValue::owned_any(page)` (or a borrowed page).
    pub fn to_dynamic<T: PageRow>(&self) -> Object {
        to_dynamic_object(&self.object, |field| {
            PageField::from_name(&field.name).map(page_field_resolver::<T>)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageField {
    Count,
    Limit,
    Offset,
    Current,
    HasNext,
    Last,
    List,
}

impl PageField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "count" => Some(Self::Count),
            "limit" => Some(Self::Limit),
            "offset" => Some(Self::Offset),
            "current" => Some(Self::Current),
            "hasNext" => Some(Self::HasNext),
            "last" => Some(Self::Last),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    fn resolve<T: PageRow>(self, page: &Page<T>) -> Option<FieldValue<'_>> {
        match self {
            Self::Count => page.count.map(|count| FieldValue::value(count)),
            Self::Limit => page.limit.map(|limit| FieldValue::value(limit)),
            Self::Offset => Some(FieldValue::value(page.offset)),
            Self::Current => Some(FieldValue::value(page.current())),
            Self::HasNext => Some(FieldValue::value(page.has_next())),
            Self::Last => Some(FieldValue::value(page.last_page())),
            Self::List => Some(FieldValue::list(
                page.rows.iter().map(|row| row.to_field_value()),
            )),
        }
    }
}

fn resolver<F>(f: F) -> F
where
    F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
{
    f
}

fn page_field_resolver<T: PageRow>(
    field: PageField,
) -> impl for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static {
    resolver(move |ctx| {
        FieldFuture::new(async move {
            let page = ctx.parent_value.try_downcast_ref::<Page<T>>()?;
            Ok(field.resolve(page))
        })
    })
}

/// Create a `<Element>Page` object type
///
/// The `Page` suffix is only appended when the element type name does not
/// already end with it. The `list` field is `[Element]`, with `Element!` items
/// when the element type was non-null, used as-is when the element type is
/// already a list, and wrapped non-null when `required` is set.
pub fn create_page_type(config: PageTypeConfig) -> Result<PageType> {
    let (element, non_null) = config.element.decompose();

    let element_name = element.type_name();
    let name = if element_name.ends_with(PAGE_SUFFIX) {
        element_name.to_owned()
    } else {
        format!("{element_name}{PAGE_SUFFIX}")
    };

    let list_type = if element.is_list_type() {
        element
    } else if non_null {
        GraphQLType::list(GraphQLType::non_null(element)?)
    } else {
        GraphQLType::list(element)
    };

    let list_type = if config.required {
        GraphQLType::non_null(list_type)?
    } else {
        list_type
    };

    let int = || GraphQLType::non_null(GraphQLType::int());

    let ListFieldConfig {
        arguments,
        deprecation,
        extensions,
    } = config.list_field;

    let list = FieldDef {
        arguments,
        deprecation,
        extensions,
        ..FieldDef::new("list", list_type.clone())
            .with_description("Returns the rows for the current page")
    };

    let object = ObjectType::new(name)?
        .with_description(PAGE_DESCRIPTION)
        .with_field(
            FieldDef::new("count", int()?).with_description("Returns the total number of rows"),
        )
        .with_field(
            FieldDef::new("limit", GraphQLType::int())
                .with_description("Returns the actual limit of per-page entities"),
        )
        .with_field(
            FieldDef::new("offset", int()?)
                .with_description("Returns the zero-indexed offset from the start"),
        )
        .with_field(
            FieldDef::new("current", int()?)
                .with_description("Returns the number of the current page"),
        )
        .with_field(
            FieldDef::new("hasNext", GraphQLType::non_null(GraphQLType::boolean())?)
                .with_description(
                    "Returns \"true\" when the next page exists, \"false\" for otherwise",
                ),
        )
        .with_field(
            FieldDef::new("last", int()?).with_description("Returns the number of the last page"),
        )
        .with_field(list);

    debug!(page_type = object.name(), list_type = %list_type, "created page type");

    Ok(PageType {
        object: Arc::new(object),
    })
}
