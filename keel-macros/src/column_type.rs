use syn::{GenericArgument, PathArguments, Type, TypePath};

/// Default column type of a supported Rust type, looking through `Option` and `Box`.
pub(crate) fn infer_column_type(ty: &Type) -> Option<&'static str> {
    match ty {
        Type::Slice(slice) if is_u8(&slice.elem) => Some("blob"),
        Type::Path(TypePath { qself: None, path }) => {
            let last = path.segments.last()?;
            match last.ident.to_string().as_str() {
                "Option" | "Box" => infer_column_type(first_generic(&last.arguments)?),
                "Vec" if is_u8(first_generic(&last.arguments)?) => Some("blob"),
                "String" => Some("varchar(100)"),
                "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" => Some("bigint"),
                "bool" => Some("boolean"),
                "f32" | "f64" => Some("real"),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Whether a field of this type can be NULL, so that a default has a chance to apply.
pub(crate) fn accepts_default(ty: &Type) -> bool {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return false;
    };
    let Some(last) = path.segments.last() else {
        return false;
    };
    match last.ident.to_string().as_str() {
        "Option" => true,
        "Box" => first_generic(&last.arguments).is_some_and(accepts_default),
        _ => false,
    }
}

fn first_generic(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(arguments) = arguments else {
        return None;
    };
    arguments.args.iter().find_map(|v| match v {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

fn is_u8(ty: &Type) -> bool {
    matches!(ty, Type::Path(TypePath { qself: None, path }) if path.is_ident("u8"))
}
