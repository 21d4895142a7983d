use crate::decode_entity::EntityMetadata;
use proc_macro2::TokenStream;
use quote::quote;

/// Body of `Entity::from_row`: every mapped field must be present in the row, ignored
/// fields take their default.
pub(crate) fn from_row(entity: &EntityMetadata) -> TokenStream {
    let entity_name = &entity.name;
    let holders = entity.fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        quote!(let mut #ident: ::std::option::Option<#ty> = None;)
    });
    let assignments = entity.fields.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let name = &f.name;
        quote! {
            #name => {
                #ident = Some(::keel::Context::with_context(
                    <#ty as ::keel::AsValue>::try_from_value(__v__),
                    || format!("While decoding the column `{}` of `{}`", #name, #entity_name),
                )?);
            }
        }
    });
    let fields = entity.fields.iter().map(|f| {
        let ident = &f.ident;
        let name = &f.name;
        quote!(#ident: #ident.ok_or_else(|| __make_error__(#name))?)
    });
    let ignored = entity.ignored.iter();
    quote! {
        #(#holders)*
        let ::keel::RowLabeled { labels: __labels__, values: __values__ } = __row__;
        for (__n__, __v__) in ::std::iter::zip(__labels__.iter(), ::std::vec::Vec::from(__values__)) {
            match __n__.as_str() {
                #(#assignments)*
                _ => {}
            }
        }
        let __make_error__ = |name: &str| ::keel::Error::msg(format!(
            "Column `{}` does not exist in the row provided",
            name
        ));
        Ok(Self {
            #(#fields,)*
            #(#ignored: ::std::default::Default::default(),)*
        })
    }
}
