//! Derive macro for sqlpatch entities.
//!
//! This crate provides the `#[derive(Entity)]` macro, which describes a
//! struct's table, columns and relationships to `sqlpatch-core` without any
//! runtime reflection.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta, Type,
};

/// Derives `sqlpatch_core::schema::Entity` for a struct.
///
/// # Attributes
///
/// - `#[entity(table = "table_name")]` - Specifies the SQL table name
///   (optional, defaults to snake_case of struct name)
///
/// # Field Attributes
///
/// - `#[column(primary_key)]` - Marks the column as part of the primary key
/// - `#[column(name = "column_name")]` - Specifies the SQL column name
///   (optional, defaults to snake_case of the field name)
/// - `#[column(omit_empty)]` - Leaves the column out of inserts and updates
///   while the field holds its zero value
/// - `#[column(ignore)]` - The field is not mapped
/// - `#[relation(foreign_key = "parent:child,...")]` - Marks a `HasMany<T>`
///   or `BelongsTo<T>` field as a relationship. `parent` columns belong to
///   this table, `child` columns to the target table; `child` defaults to
///   `parent`.
///
/// Mapped fields must implement `Clone` and `ToSqlValue`.
#[proc_macro_derive(Entity, attributes(entity, column, relation))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity derive only supports structs",
            ));
        }
    };

    let mut columns: Vec<ColumnInfo> = Vec::new();
    let mut relations: Vec<RelationInfo> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.clone() else {
            continue;
        };

        if let Some(foreign_key) = parse_relation_attrs(&field.attrs)? {
            relations.push(RelationInfo {
                field_name,
                field_type: field.ty.clone(),
                foreign_key,
            });
            continue;
        }

        let attrs = parse_column_attrs(&field.attrs)?;
        if attrs.ignore {
            continue;
        }
        if is_relation_type(&field.ty) {
            return Err(syn::Error::new_spanned(
                field,
                "relationship fields need #[relation(foreign_key = \"...\")] or #[column(ignore)]",
            ));
        }

        columns.push(ColumnInfo {
            column_name: attrs
                .name
                .unwrap_or_else(|| to_snake_case(&field_name.to_string())),
            field_name,
            primary_key: attrs.primary_key,
            omit_empty: attrs.omit_empty,
        });
    }

    let field_entries: Vec<TokenStream2> = columns
        .iter()
        .map(|info| {
            let field_name = info.field_name.to_string();
            let column_name = &info.column_name;
            let primary_key = info.primary_key.then(|| quote! { .primary_key() });
            let omit_empty = info.omit_empty.then(|| quote! { .omit_empty() });
            quote! {
                .field(
                    ::sqlpatch_core::schema::FieldDescriptor::new(#field_name, #column_name)
                        #primary_key
                        #omit_empty
                )
            }
        })
        .collect();

    let relation_entries: Vec<TokenStream2> = relations
        .iter()
        .map(|info| {
            let field_name = info.field_name.to_string();
            let field_type = &info.field_type;
            let foreign_key = &info.foreign_key;
            quote! {
                .relation(
                    ::sqlpatch_core::schema::RelationDescriptor::of::<#field_type>(
                        #field_name,
                        #foreign_key,
                    )
                )
            }
        })
        .collect();

    let value_arms: Vec<TokenStream2> = columns
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            let column_name = &info.column_name;
            quote! {
                #column_name => ::core::option::Option::Some(
                    ::sqlpatch_core::builder::ToSqlValue::to_sql_value(
                        ::core::clone::Clone::clone(&self.#field_name),
                    ),
                ),
            }
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::sqlpatch_core::schema::Entity
            for #struct_name #ty_generics #where_clause
        {
            fn descriptor() -> ::sqlpatch_core::schema::EntityDescriptor {
                ::sqlpatch_core::schema::EntityDescriptor::of::<Self>(#table_name)
                    #(#field_entries)*
                    #(#relation_entries)*
            }

            fn column_value(
                &self,
                column: &str,
            ) -> ::core::option::Option<::sqlpatch_core::builder::SqlValue> {
                match column {
                    #(#value_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    Ok(expanded)
}

struct ColumnInfo {
    field_name: Ident,
    column_name: String,
    primary_key: bool,
    omit_empty: bool,
}

struct RelationInfo {
    field_name: Ident,
    field_type: Type,
    foreign_key: String,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
    omit_empty: bool,
    ignore: bool,
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    match value {
        Expr::Lit(syn::ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("entity") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    table_name = Some(string_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unknown entity attribute"))
                }
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    // Default to snake_case of struct name
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    result.primary_key = true;
                } else if meta.path.is_ident("omit_empty") {
                    result.omit_empty = true;
                } else if meta.path.is_ident("ignore") {
                    result.ignore = true;
                } else if meta.path.is_ident("name") {
                    result.name = Some(string_value(&meta)?);
                } else {
                    return Err(meta.error("unknown column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

fn parse_relation_attrs(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("relation")) else {
        return Ok(None);
    };

    let mut foreign_key = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("foreign_key") {
            foreign_key = Some(string_value(&meta)?);
            Ok(())
        } else {
            Err(meta.error("unknown relation attribute"))
        }
    })?;

    foreign_key
        .map(Some)
        .ok_or_else(|| syn::Error::new_spanned(attr, "relation needs foreign_key = \"...\""))
}

fn is_relation_type(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "HasMany" || segment.ident == "BelongsTo"),
        _ => false,
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
