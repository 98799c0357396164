//! Type descriptors for schema construction
//!
//! async-graphql's dynamic [`TypeRef`] only records names and wrappers. The
//! helpers in this crate need to know what *kind* of type they are looking at
//! (is this an object? a list? non-null?), so they work on a small descriptor
//! model and lower it to dynamic schema types at the edge.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, InputValue, Object, ResolverContext, TypeRef};
use serde_json::{Map, Value as JsonValue};

use crate::{GraphQLError, Result};

/// Name of a named type
pub type TypeName = Cow<'static, str>;

/// A GraphQL type descriptor
#[derive(Debug, Clone)]
pub enum GraphQLType {
    Scalar(TypeName),
    Object(Arc<ObjectType>),
    Interface(TypeName),
    Union(TypeName),
    Enum(TypeName),
    InputObject(TypeName),
    List(Box<GraphQLType>),
    NonNull(Box<GraphQLType>),
}

impl GraphQLType {
    pub fn int() -> Self {
        Self::Scalar(Cow::Borrowed(TypeRef::INT))
    }

    pub fn float() -> Self {
        Self::Scalar(Cow::Borrowed(TypeRef::FLOAT))
    }

    pub fn string() -> Self {
        Self::Scalar(Cow::Borrowed(TypeRef::STRING))
    }

    pub fn boolean() -> Self {
        Self::Scalar(Cow::Borrowed(TypeRef::BOOLEAN))
    }

    pub fn id() -> Self {
        Self::Scalar(Cow::Borrowed(TypeRef::ID))
    }

    /// Custom scalar
    pub fn scalar(name: impl Into<TypeName>) -> Self {
        Self::Scalar(name.into())
    }

    pub fn object(object: impl Into<Arc<ObjectType>>) -> Self {
        Self::Object(object.into())
    }

    pub fn interface(name: impl Into<TypeName>) -> Self {
        Self::Interface(name.into())
    }

    pub fn union(name: impl Into<TypeName>) -> Self {
        Self::Union(name.into())
    }

    pub fn enumeration(name: impl Into<TypeName>) -> Self {
        Self::Enum(name.into())
    }

    pub fn input_object(name: impl Into<TypeName>) -> Self {
        Self::InputObject(name.into())
    }

    pub fn list(of: GraphQLType) -> Self {
        Self::List(Box::new(of))
    }

    /// Wrap a type as non-null
    ///
    /// Only nullable types can be wrapped: `NonNull(NonNull(T))` is not a valid
    /// GraphQL type and is rejected.
    pub fn non_null(of: GraphQLType) -> Result<Self> {
        if of.is_non_null_type() {
            return Err(GraphQLError::NullableTypeExpected(of.to_string()));
        }
        Ok(Self::NonNull(Box::new(of)))
    }

    /// Check if this is a concrete object type
    pub fn is_object_type(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn is_list_type(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn is_non_null_type(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Unwrap every list and non-null layer
    pub fn named_type(&self) -> &GraphQLType {
        match self {
            Self::List(of) | Self::NonNull(of) => of.named_type(),
            named => named,
        }
    }

    /// Name of a named type, `None` for list and non-null wrappers
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Object(object) => Some(object.name()),
            Self::Scalar(name)
            | Self::Interface(name)
            | Self::Union(name)
            | Self::Enum(name)
            | Self::InputObject(name) => Some(name.as_ref()),
            Self::List(_) | Self::NonNull(_) => None,
        }
    }

    /// Name of the innermost named type
    pub fn type_name(&self) -> &str {
        match self {
            Self::List(of) | Self::NonNull(of) => of.type_name(),
            Self::Object(object) => object.name(),
            Self::Scalar(name)
            | Self::Interface(name)
            | Self::Union(name)
            | Self::Enum(name)
            | Self::InputObject(name) => name.as_ref(),
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ObjectType>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Arc<ObjectType>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Lower to a dynamic schema type reference
    pub fn to_type_ref(&self) -> TypeRef {
        match self {
            Self::List(of) => TypeRef::List(Box::new(of.to_type_ref())),
            Self::NonNull(of) => TypeRef::NonNull(Box::new(of.to_type_ref())),
            named => TypeRef::named(named.type_name().to_owned()),
        }
    }
}

impl fmt::Display for GraphQLType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(of) => write!(f, "[{of}]"),
            Self::NonNull(of) => write!(f, "{of}!"),
            named => f.write_str(named.type_name()),
        }
    }
}

impl From<ObjectType> for GraphQLType {
    fn from(object: ObjectType) -> Self {
        Self::object(object)
    }
}

impl From<Arc<ObjectType>> for GraphQLType {
    fn from(object: Arc<ObjectType>) -> Self {
        Self::Object(object)
    }
}

/// Object type descriptor
#[derive(Debug, Clone)]
pub struct ObjectType {
    name: String,
    description: Option<String>,
    fields: Vec<FieldDef>,
}

impl ObjectType {
    /// Create an object type with no fields
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            description: None,
            fields: Vec::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Field of an object type
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: GraphQLType,
    pub description: Option<String>,
    pub deprecation: Option<String>,
    pub arguments: Vec<ArgumentDef>,
    /// Free-form metadata, never interpreted by this crate and not carried
    /// over by [`FieldDef::to_field`]
    pub extensions: Map<String, JsonValue>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: GraphQLType) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
            deprecation: None,
            arguments: Vec::new(),
            extensions: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Lower to a dynamic schema field with the given resolver
    pub fn to_field<F>(&self, resolver: F) -> Field
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        let mut field = Field::new(self.name.clone(), self.ty.to_type_ref(), resolver);

        if let Some(description) = &self.description {
            field = field.description(description.clone());
        }

        if let Some(reason) = &self.deprecation {
            field = field.deprecation(Some(reason.as_str()));
        }

        self.arguments
            .iter()
            .fold(field, |field, argument| field.argument(argument.to_input_value()))
    }
}

/// Argument of a field
#[derive(Debug, Clone)]
pub struct ArgumentDef {
    pub name: String,
    pub ty: GraphQLType,
    pub description: Option<String>,
}

impl ArgumentDef {
    pub fn new(name: impl Into<String>, ty: GraphQLType) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn to_input_value(&self) -> InputValue {
        let input = InputValue::new(self.name.clone(), self.ty.to_type_ref());
        match &self.description {
            Some(description) => input.description(description.clone()),
            None => input,
        }
    }
}

/// Lower an object descriptor to a dynamic object, resolving each field with
/// the resolver `resolver_for` returns for it
pub fn to_dynamic_object<F, R>(object: &ObjectType, mut resolver_for: F) -> Object
where
    F: FnMut(&FieldDef) -> Option<R>,
    R: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
{
    let mut dynamic = Object::new(object.name());

    if let Some(description) = object.description() {
        dynamic = dynamic.description(description);
    }

    for field in object.fields() {
        if let Some(resolver) = resolver_for(field) {
            dynamic = dynamic.field(field.to_field(resolver));
        }
    }

    dynamic
}

/// Validate a GraphQL name: `/^[_A-Za-z][_0-9A-Za-z]*$/`
pub fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(GraphQLError::InvalidTypeName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> GraphQLType {
        GraphQLType::object(ObjectType::new("User").unwrap())
    }

    #[test]
    fn test_named_type_unwraps_all_layers() {
        let ty = GraphQLType::non_null(GraphQLType::list(GraphQLType::non_null(user()).unwrap()))
            .unwrap();

        assert!(ty.is_non_null_type());
        assert!(!ty.is_list_type());
        assert!(ty.named_type().is_object_type());
        assert_eq!(ty.name(), None);
        assert_eq!(ty.type_name(), "User");
        assert_eq!(ty.to_string(), "[User!]!");
    }

    #[test]
    fn test_non_null_rejects_non_null() {
        let inner = GraphQLType::non_null(GraphQLType::int()).unwrap();
        let err = GraphQLType::non_null(inner).unwrap_err();
        assert!(matches!(err, GraphQLError::NullableTypeExpected(ref ty) if ty == "Int!"));
    }

    #[test]
    fn test_only_objects_are_object_types() {
        assert!(user().is_object_type());
        assert!(!GraphQLType::string().is_object_type());
        assert!(!GraphQLType::union("SearchResult").is_object_type());
        assert!(!GraphQLType::interface("Node").is_object_type());
        assert!(!GraphQLType::list(user()).is_object_type());
    }

    #[test]
    fn test_type_ref_lowering() {
        let ty = GraphQLType::list(GraphQLType::non_null(GraphQLType::id()).unwrap());
        assert_eq!(ty.to_type_ref().to_string(), "[ID!]");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("User").is_ok());
        assert!(validate_name("_private9").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("9Lives").is_err());
        assert!(matches!(
            ObjectType::new("User Page"),
            Err(GraphQLError::InvalidTypeName(_))
        ));
    }

    #[test]
    fn test_object_fields_keep_order() {
        let object = ObjectType::new("Post")
            .unwrap()
            .with_field(FieldDef::new("title", GraphQLType::string()))
            .with_field(FieldDef::new("id", GraphQLType::id()));

        let names: Vec<_> = object.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["title", "id"]);
        assert!(object.field("id").is_some());
        assert!(object.field("body").is_none());
    }
}
