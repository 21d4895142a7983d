use crate::decode_field::{FieldMetadata, decode_field};
use quote::ToTokens;
use syn::{Fields, ItemStruct, LitStr, parse::ParseBuffer};

pub(crate) struct EntityMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) name: String,
    pub(crate) table: String,
    /// Mapped fields, in declaration order.
    pub(crate) fields: Vec<FieldMetadata>,
    /// Fields marked `ignore`, filled with `Default::default()` when reading.
    pub(crate) ignored: Vec<syn::Ident>,
}

pub(crate) fn decode_entity(item: ItemStruct) -> EntityMetadata {
    let Fields::Named(..) = &item.fields else {
        panic!("Entity can only be derived for structs with named fields");
    };
    let name = item.ident.to_string();
    let mut table = name.clone();
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("keel") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `keel`, use it like: `#[keel(table = \"my_table\")]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `table`, use it like: `#[keel(table = \"my_table\")]`");
                };
                table = v.value();
            } else {
                panic!(
                    "Unknown attribute `{}` on the entity, expected `table`",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    let mut fields = Vec::new();
    let mut ignored = Vec::new();
    for field in &item.fields {
        let metadata = decode_field(field);
        if metadata.ignore {
            ignored.push(metadata.ident);
        } else {
            fields.push(metadata);
        }
    }
    let mut primary_keys = fields.iter().filter(|f| f.primary_key);
    match (primary_keys.next(), primary_keys.next()) {
        (None, _) => panic!(
            "Entity `{}` does not declare a primary key, mark one field with `#[keel(primary_key)]`",
            name
        ),
        (Some(first), Some(second)) => panic!(
            "Entity `{}` declares more than one primary key (`{}` and `{}`)",
            name, first.name, second.name
        ),
        _ => {}
    }
    EntityMetadata {
        item,
        name,
        table,
        fields,
        ignored,
    }
}
