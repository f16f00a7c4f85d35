//! Parsing of `#[bind(...)]` field attributes and field types.

use syn::{
    punctuated::Punctuated, spanned::Spanned, Expr, ExprLit, Field, GenericArgument, Lit, Meta,
    PathArguments, Token, Type,
};

/// Source annotation on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Path,
    Query,
    Header,
    Json,
    Dep,
}

impl SourceKind {
    fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "json" => Some(Self::Json),
            "dep" => Some(Self::Dep),
            _ => None,
        }
    }

    /// Constructor name on `hermes_core::Source`.
    pub fn constructor(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Json => "json",
            Self::Dep => "dependency",
        }
    }
}

/// Parsed `#[bind(...)]` attributes of one field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// The single declared source and its name.
    pub source: Option<(SourceKind, String)>,
    /// The validation rule string.
    pub validate: Option<String>,
}

impl FieldAttrs {
    /// Collects every `#[bind(...)]` attribute on `field`.
    pub fn parse(field: &Field) -> syn::Result<Self> {
        let mut attrs = Self::default();

        for attr in field.attrs.iter().filter(|a| a.path().is_ident("bind")) {
            let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
            for meta in metas {
                let Meta::NameValue(nv) = meta else {
                    return Err(syn::Error::new(meta.span(), "expected name = \"value\""));
                };
                let ident = nv
                    .path
                    .get_ident()
                    .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?
                    .to_string();
                let value = match &nv.value {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(s), ..
                    }) => s.value(),
                    _ => {
                        return Err(syn::Error::new(
                            nv.value.span(),
                            "expected string literal",
                        ))
                    }
                };

                if ident == "validate" {
                    if attrs.validate.is_some() {
                        return Err(syn::Error::new(nv.path.span(), "duplicate validate"));
                    }
                    attrs.validate = Some(value);
                    continue;
                }

                let kind = SourceKind::from_ident(&ident).ok_or_else(|| {
                    syn::Error::new(nv.path.span(), format!("unknown attribute: {ident}"))
                })?;
                if attrs.source.is_some() {
                    return Err(syn::Error::new(
                        nv.path.span(),
                        "a field can have only one source",
                    ));
                }
                attrs.source = Some((kind, value));
            }
        }

        Ok(attrs)
    }
}

/// Semantic shape of a Rust field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    String,
    Int(u8),
    Uint(u8),
    Float(u8),
    Bool,
    Seq(Box<Shape>),
    Optional(Box<Shape>),
    Struct,
}

impl Shape {
    /// Classifies a type by its last path segment.
    pub fn of(ty: &Type) -> Self {
        let Type::Path(path) = ty else {
            return Self::Struct;
        };
        let Some(segment) = path.path.segments.last() else {
            return Self::Struct;
        };

        match segment.ident.to_string().as_str() {
            "String" => Self::String,
            "i8" => Self::Int(8),
            "i16" => Self::Int(16),
            "i32" => Self::Int(32),
            "i64" | "isize" => Self::Int(64),
            "u8" => Self::Uint(8),
            "u16" => Self::Uint(16),
            "u32" => Self::Uint(32),
            "u64" | "usize" => Self::Uint(64),
            "f32" => Self::Float(32),
            "f64" => Self::Float(64),
            "bool" => Self::Bool,
            "Vec" => first_generic(&segment.arguments)
                .map_or(Self::Struct, |inner| Self::Seq(Box::new(Self::of(inner)))),
            "Option" => first_generic(&segment.arguments)
                .map_or(Self::Struct, |inner| Self::Optional(Box::new(Self::of(inner)))),
            _ => Self::Struct,
        }
    }
}

fn first_generic(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_shape_of_primitives() {
        assert_eq!(Shape::of(&parse_quote!(String)), Shape::String);
        assert_eq!(Shape::of(&parse_quote!(i32)), Shape::Int(32));
        assert_eq!(Shape::of(&parse_quote!(usize)), Shape::Uint(64));
        assert_eq!(Shape::of(&parse_quote!(f32)), Shape::Float(32));
        assert_eq!(Shape::of(&parse_quote!(bool)), Shape::Bool);
    }

    #[test]
    fn test_shape_of_containers() {
        assert_eq!(
            Shape::of(&parse_quote!(Vec<String>)),
            Shape::Seq(Box::new(Shape::String))
        );
        assert_eq!(
            Shape::of(&parse_quote!(std::option::Option<u16>)),
            Shape::Optional(Box::new(Shape::Uint(16)))
        );
        assert_eq!(Shape::of(&parse_quote!(AuthInfo)), Shape::Struct);
        assert_eq!(Shape::of(&parse_quote!((i32, i32))), Shape::Struct);
    }

    #[test]
    fn test_parse_field_attrs() {
        let field: Field = parse_quote! {
            #[bind(query = "tags", validate = "max=5")]
            tags: Vec<String>
        };
        let attrs = FieldAttrs::parse(&field).unwrap();
        assert_eq!(attrs.source, Some((SourceKind::Query, "tags".to_string())));
        assert_eq!(attrs.validate.as_deref(), Some("max=5"));
    }

    #[test]
    fn test_parse_rejects_two_sources() {
        let field: Field = parse_quote! {
            #[bind(path = "id")]
            #[bind(query = "id")]
            id: String
        };
        let err = FieldAttrs::parse(&field).unwrap_err();
        assert!(err.to_string().contains("only one source"));
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        let field: Field = parse_quote! {
            #[bind(cookie = "sid")]
            sid: String
        };
        assert!(FieldAttrs::parse(&field).is_err());
    }
}
