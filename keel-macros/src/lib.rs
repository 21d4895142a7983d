mod column_type;
mod decode_entity;
mod decode_field;
mod from_row;

use decode_entity::decode_entity;
use from_row::from_row;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implement `keel::Entity` for a struct with named fields.
///
/// Struct attribute: `#[keel(table = "users")]`, the table defaults to the struct name.
/// Field attributes, inside `#[keel(...)]`:
/// - `primary_key`: exactly one field must have it
/// - `name = "column"`: column name, defaults to the field name
/// - `column_type = "varchar(50)"`: type used in `CREATE TABLE`, inferred for the common types
/// - `default = expression`: value used on save when the field is NULL
/// - `default_with = function`: called on every save when the field is NULL
///
/// Only `Option<T>` fields (or `Box<Option<T>>`) can be NULL, a default on any other
/// field type is a compile error.
/// - `ignore`: not mapped, set to `Default::default()` when reading
#[proc_macro_derive(Entity, attributes(keel))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let entity = decode_entity(item);
    let ident = &entity.item.ident;
    let (impl_generics, ty_generics, where_clause) = entity.item.generics.split_for_impl();
    let entity_name = &entity.name;
    let table = &entity.table;
    let field_defs = entity.fields.iter().map(|f| {
        let name = &f.name;
        let column_type = &f.column_type;
        let primary_key = f.primary_key.then(|| quote!(.primary_key()));
        let default = f
            .default
            .as_ref()
            .map(|v| quote!(.default_value(#v)))
            .or_else(|| f.default_with.as_ref().map(|v| quote!(.default_with(#v))));
        quote! {
            ::keel::FieldDef::new(#name, #column_type) #primary_key #default
        }
    });
    let from_row = from_row(&entity);
    let names = entity.fields.iter().map(|f| &f.name).collect::<Vec<_>>();
    let idents = entity.fields.iter().map(|f| &f.ident).collect::<Vec<_>>();
    let types = entity.fields.iter().map(|f| &f.ty).collect::<Vec<_>>();
    quote! {
        impl #impl_generics ::keel::Entity for #ident #ty_generics #where_clause {
            fn schema() -> &'static ::keel::Schema {
                static SCHEMA: ::std::sync::LazyLock<::keel::Schema> =
                    ::std::sync::LazyLock::new(|| {
                        ::keel::Schema::builder(#entity_name)
                            .table(#table)
                            #(.field(#field_defs))*
                            .build()
                            .unwrap_or_else(|e| panic!("{:#}", e))
                    });
                &SCHEMA
            }

            fn from_row(__row__: ::keel::RowLabeled) -> ::keel::Result<Self> {
                #from_row
            }

            fn get_value(&self, name: &str) -> ::std::option::Option<::keel::Value> {
                match name {
                    #(#names => Some(::keel::AsValue::as_value(
                        ::std::clone::Clone::clone(&self.#idents)
                    )),)*
                    _ => None,
                }
            }

            fn set_value(&mut self, name: &str, value: ::keel::Value) -> ::keel::Result<()> {
                match name {
                    #(#names => {
                        self.#idents = <#types as ::keel::AsValue>::try_from_value(value)?;
                    })*
                    _ => {
                        return Err(::keel::SchemaError::UnknownAttribute {
                            entity: #entity_name.into(),
                            attribute: name.into(),
                        }
                        .into());
                    }
                }
                Ok(())
            }
        }
    }
    .into()
}
