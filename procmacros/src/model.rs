//! Expansion of `#[derive(Model)]`.

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, LitStr};

/// Parsed `#[orm("...")]` tag for one field.
#[derive(Default)]
struct OrmTag {
    name: Option<String>,
    pk: bool,
    is_virtual: bool,
    embed: bool,
}

fn parse_tag(field: &Field) -> syn::Result<OrmTag> {
    let mut tag = OrmTag::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let lit: LitStr = attr.parse_args()?;
        for pair in lit.value().split_whitespace() {
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, v),
                None => (pair, "true"),
            };
            let flag = || match value {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(syn::Error::new(
                    lit.span(),
                    format!("orm tag {key} expects true or false, got {other}"),
                )),
            };
            match key {
                "name" => tag.name = Some(value.to_string()),
                "pk" => tag.pk = flag()?,
                "virtual" => tag.is_virtual = flag()?,
                "embed" => tag.embed = flag()?,
                other => {
                    return Err(syn::Error::new(
                        lit.span(),
                        format!("unknown orm tag key {other}"),
                    ));
                }
            }
        }
    }
    Ok(tag)
}

pub fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "Model can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new(
            input.span(),
            "Model requires named fields",
        ));
    };

    let name = &input.ident;
    let mut field_specs = Vec::new();
    let mut collects = Vec::new();
    let mut values = Vec::new();

    let mut tags = Vec::new();
    for field in &fields.named {
        let tag = parse_tag(field)?;
        if tag.embed && (tag.pk || tag.is_virtual || tag.name.is_some()) {
            return Err(syn::Error::new(
                field.span(),
                "embed cannot be combined with other orm tags",
            ));
        }
        tags.push(tag);
    }
    // The `id` naming convention only applies when no field is tagged pk.
    let explicit_pk = tags.iter().any(|t| t.pk);

    for (field, tag) in fields.named.iter().zip(tags) {
        let ident = field.ident.as_ref().expect("named field");
        let ident_str = ident.to_string();
        let column = tag.name.unwrap_or_else(|| ident_str.to_snake_case());
        let primary_key =
            tag.pk || (!explicit_pk && !tag.embed && !tag.is_virtual && ident_str == "id");
        let is_virtual = tag.is_virtual || tag.embed;
        let ty = &field.ty;
        let type_name = quote!(#ty).to_string();

        field_specs.push(quote! {
            out.push(::loam::FieldSpec {
                ident: #ident_str,
                column: #column,
                primary_key: #primary_key,
                is_virtual: #is_virtual,
                type_name: #type_name,
            });
        });

        if tag.embed {
            collects.push(quote! {
                ::loam::Model::collect(&mut self.#ident, slots);
            });
        } else if !tag.is_virtual {
            collects.push(quote! {
                slots.push(::loam::SlotEntry {
                    ident: #ident_str,
                    column: #column,
                    sink: &mut self.#ident,
                });
            });
            values.push(quote! {
                out.push((#ident_str, ::loam::ToValue::to_value(&self.#ident)));
            });
        }
    }

    Ok(quote! {
        impl ::loam::Model for #name {
            fn fields(out: &mut ::std::vec::Vec<::loam::FieldSpec>) {
                #(#field_specs)*
            }

            fn collect<'a>(&'a mut self, slots: &mut ::loam::Slots<'a>) {
                #(#collects)*
            }

            fn values(&self, out: &mut ::std::vec::Vec<(&'static str, ::loam::Value)>) {
                #(#values)*
            }
        }
    })
}
