use crate::column_type::{accepts_default, infer_column_type};
use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::{Expr, Field, Ident, LitStr, Type, parse::ParseBuffer};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Attribute and column name.
    pub(crate) name: String,
    pub(crate) column_type: String,
    pub(crate) primary_key: bool,
    pub(crate) default: Option<TokenStream>,
    pub(crate) default_with: Option<TokenStream>,
    pub(crate) ignore: bool,
}

pub(crate) fn decode_field(field: &Field) -> FieldMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let name = ident.to_string().trim_start_matches("r#").to_string();
    let mut metadata = FieldMetadata {
        ident,
        ty: field.ty.clone(),
        name,
        column_type: String::new(),
        primary_key: false,
        default: None,
        default_with: None,
        ignore: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("keel") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `keel`, use it like: `#[keel(attribute = value, ...)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("primary_key") {
                let Err(..) = arg.value() else {
                    // value() is Err for Meta::Path
                    panic!("Error while parsing `primary_key`, use it like: `#[keel(primary_key)]`");
                };
                metadata.primary_key = true;
            } else if arg.path.is_ident("ignore") {
                let Err(..) = arg.value() else {
                    panic!("Error while parsing `ignore`, use it like: `#[keel(ignore)]`");
                };
                metadata.ignore = true;
            } else if arg.path.is_ident("name") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[keel(name = \"my_column\")]`");
                };
                metadata.name = v.value();
            } else if arg.path.is_ident("column_type") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `column_type`, use it like: `#[keel(column_type = \"varchar(50)\")]`"
                    );
                };
                metadata.column_type = v.value();
            } else if arg.path.is_ident("default") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                    panic!("Error while parsing `default`, use it like: `#[keel(default = some_expression)]`");
                };
                metadata.default = Some(v.to_token_stream());
            } else if arg.path.is_ident("default_with") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                    panic!(
                        "Error while parsing `default_with`, use it like: `#[keel(default_with = some_function)]`"
                    );
                };
                metadata.default_with = Some(v.to_token_stream());
            } else {
                panic!(
                    "Unknown attribute `{}` inside keel macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    if metadata.default.is_some() && metadata.default_with.is_some() {
        panic!(
            "Field `{}` cannot have both `default` and `default_with`",
            metadata.name
        );
    }
    if (metadata.default.is_some() || metadata.default_with.is_some())
        && !accepts_default(&metadata.ty)
    {
        panic!(
            "Field `{}` has a default but its type is not an `Option`, the default would never be used",
            metadata.name
        );
    }
    if metadata.column_type.is_empty() && !metadata.ignore {
        let Some(column_type) = infer_column_type(&metadata.ty) else {
            panic!(
                "Cannot infer the column type of `{}`, specify it with `#[keel(column_type = \"...\")]`",
                metadata.name
            );
        };
        metadata.column_type = column_type.into();
    }
    metadata
}
