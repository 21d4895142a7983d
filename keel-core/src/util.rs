use std::fmt::{self, Display};

/// Writes the values into `out` using `f`, putting `separator` between two consecutive
/// values that produced some output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Prefix of `value` of at most `max` bytes, cut on a char boundary.
pub fn truncated(value: &str, max: usize) -> Truncated<'_> {
    let mut end = value.len().min(max);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    Truncated {
        value: &value[..end],
        cut: end < value.len(),
    }
}

pub struct Truncated<'a> {
    value: &'a str,
    cut: bool,
}

impl Display for Truncated<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value.trim_end())?;
        if self.cut {
            f.write_str("...")?;
        }
        Ok(())
    }
}

/// Displayable version of a query or value, limited to 500 characters.
#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        $crate::truncated(::std::convert::AsRef::<str>::as_ref(&$query), 497)
    };
}
