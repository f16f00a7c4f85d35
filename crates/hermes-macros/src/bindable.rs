//! Expansion of `#[derive(Bindable)]`.

use crate::parse::{FieldAttrs, Shape};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Fields, LitStr};

/// Generates the `Bindable` implementation for a struct with named fields.
pub fn expand_bindable(input: DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let type_name = LitStr::new(&ident.to_string(), ident.span());

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "Bindable can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "Bindable requires named fields",
        ));
    };

    let mut specs = Vec::new();
    let mut arms = Vec::new();
    let mut validated = Vec::new();

    for field in &fields.named {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let name = LitStr::new(&field_ident.to_string(), field_ident.span());
        let attrs = FieldAttrs::parse(field)?;
        let field_type = shape_tokens(&Shape::of(&field.ty));

        let mut spec = quote! { ::hermes_core::FieldSpec::new(#name, #field_type) };
        if let Some((kind, source)) = &attrs.source {
            let constructor = format_ident!("{}", kind.constructor());
            spec = quote! { #spec.source(::hermes_core::Source::#constructor(#source)) };
            // Only sourced fields are ever assigned.
            arms.push(quote! {
                #name => {
                    self.#field_ident = value
                        .decode()
                        .map_err(|e| ::hermes_core::AssignError::new(field, e))?;
                }
            });
        }
        if let Some(rule) = &attrs.validate {
            spec = quote! { #spec.validate(#rule) };
            // Keyed by the Rust name, whatever serde calls the field.
            validated.push(quote! {
                (#name, ::hermes_core::Value::from_serialize(&self.#field_ident)?)
            });
        }
        specs.push(spec);
    }

    let validated_count = validated.len();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::hermes_core::Bindable for #ident #ty_generics #where_clause {
            fn schema() -> ::hermes_core::Schema {
                ::hermes_core::Schema::new(#type_name)
                    #(.field(#specs))*
            }

            #[allow(unused_variables, unreachable_code)]
            fn assign(
                &mut self,
                field: &str,
                value: ::hermes_core::Value,
            ) -> ::core::result::Result<(), ::hermes_core::AssignError> {
                match field {
                    #(#arms)*
                    _ => return ::core::result::Result::Err(
                        ::hermes_core::AssignError::unknown_field(field),
                    ),
                }
                ::core::result::Result::Ok(())
            }

            fn field_values(
                &self,
            ) -> ::core::result::Result<::hermes_core::Value, ::hermes_core::ValueError> {
                let fields: [(&str, ::hermes_core::Value); #validated_count] = [
                    #(#validated),*
                ];
                ::core::result::Result::Ok(::hermes_core::Value::from_fields(fields))
            }
        }
    })
}

fn shape_tokens(shape: &Shape) -> TokenStream {
    match shape {
        Shape::String => quote! { ::hermes_core::FieldType::String },
        Shape::Int(bits) => quote! { ::hermes_core::FieldType::Int { bits: #bits } },
        Shape::Uint(bits) => quote! { ::hermes_core::FieldType::Uint { bits: #bits } },
        Shape::Float(bits) => quote! { ::hermes_core::FieldType::Float { bits: #bits } },
        Shape::Bool => quote! { ::hermes_core::FieldType::Bool },
        Shape::Seq(inner) => {
            let inner = shape_tokens(inner);
            quote! { ::hermes_core::FieldType::seq(#inner) }
        }
        Shape::Optional(inner) => {
            let inner = shape_tokens(inner);
            quote! { ::hermes_core::FieldType::optional(#inner) }
        }
        Shape::Struct => quote! { ::hermes_core::FieldType::Struct },
    }
}
