//! Textual value rendering
//!
//! One polymorphic "value to bytes" operation backing the print/println
//! surface on handles: a closed set of variants (signed, unsigned, float,
//! text, single byte) parameterized by radix and float precision. The byte
//! sequences match the classic C formatting the callers expect: lowercase
//! hex/octal of the two's-complement pattern for signed values, magnitude
//! binary with leading zeros stripped, fixed-precision floats.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Radix {
    Dec,
    Hex,
    Oct,
    Bin,
}

/// Rendering parameters. `radix` applies to integer variants, `precision`
/// (decimal places) to floats.
#[derive(Clone, Copy, Debug)]
pub struct FormatSpec {
    pub radix: Radix,
    pub precision: usize,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            radix: Radix::Dec,
            precision: 2,
        }
    }
}

impl FormatSpec {
    pub fn radix(radix: Radix) -> Self {
        Self {
            radix,
            ..Self::default()
        }
    }

    pub fn precision(precision: usize) -> Self {
        Self {
            precision,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Value<'a> {
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(&'a str),
    Byte(u8),
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),+ $(,)?) => {
        $(impl From<$ty> for Value<'_> {
            fn from(v: $ty) -> Self {
                Value::$variant(v as _)
            }
        })+
    };
}

value_from!(Int: i8, i16, i32, i64, isize);
value_from!(Uint: u16, u32, u64, usize);
value_from!(Float: f32, f64);
value_from!(Byte: u8);

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Value::Text(v)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(v: &'a String) -> Self {
        Value::Text(v)
    }
}

/// Render `value` to the exact byte sequence a caller "prints" into a file.
pub fn render(value: Value<'_>, spec: &FormatSpec) -> Vec<u8> {
    match value {
        Value::Text(s) => s.as_bytes().to_vec(),
        Value::Byte(b) => vec![b],
        Value::Int(n) => match spec.radix {
            Radix::Dec => n.to_string().into_bytes(),
            Radix::Hex => format!("{n:x}").into_bytes(),
            Radix::Oct => format!("{n:o}").into_bytes(),
            // magnitude bits, leading zeros stripped down to a single "0"
            Radix::Bin => format!("{:b}", n.unsigned_abs()).into_bytes(),
        },
        Value::Uint(n) => match spec.radix {
            Radix::Dec => n.to_string().into_bytes(),
            Radix::Hex => format!("{n:x}").into_bytes(),
            Radix::Oct => format!("{n:o}").into_bytes(),
            Radix::Bin => format!("{n:b}").into_bytes(),
        },
        Value::Float(f) => format!("{:.*}", spec.precision, f).into_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: Value<'_>, spec: &FormatSpec) -> String {
        String::from_utf8(render(value, spec)).unwrap()
    }

    #[test]
    fn decimal_is_the_default() {
        let spec = FormatSpec::default();
        assert_eq!(text(42i32.into(), &spec), "42");
        assert_eq!(text((-7i32).into(), &spec), "-7");
        assert_eq!(text(42u32.into(), &spec), "42");
    }

    #[test]
    fn hex_and_octal_use_lowercase_twos_complement() {
        assert_eq!(text(255i32.into(), &FormatSpec::radix(Radix::Hex)), "ff");
        assert_eq!(text(8i32.into(), &FormatSpec::radix(Radix::Oct)), "10");
        // C's %lx prints the 64-bit pattern for negative values
        assert_eq!(
            text((-1i64).into(), &FormatSpec::radix(Radix::Hex)),
            "ffffffffffffffff"
        );
        assert_eq!(text(0xdeadu32.into(), &FormatSpec::radix(Radix::Hex)), "dead");
    }

    #[test]
    fn binary_prints_the_stripped_magnitude() {
        let spec = FormatSpec::radix(Radix::Bin);
        assert_eq!(text(5i32.into(), &spec), "101");
        assert_eq!(text((-5i32).into(), &spec), "101");
        assert_eq!(text(0i32.into(), &spec), "0");
        assert_eq!(text(6u32.into(), &spec), "110");
    }

    #[test]
    fn floats_render_with_fixed_precision() {
        assert_eq!(text(3.14159f64.into(), &FormatSpec::default()), "3.14");
        assert_eq!(text(3.14159f64.into(), &FormatSpec::precision(4)), "3.1416");
        assert_eq!(text(2.0f64.into(), &FormatSpec::precision(0)), "2");
        assert_eq!(text((-0.5f64).into(), &FormatSpec::default()), "-0.50");
    }

    #[test]
    fn text_and_bytes_pass_through() {
        let spec = FormatSpec::default();
        assert_eq!(render("host".into(), &spec), b"host");
        assert_eq!(render(b'\n'.into(), &spec), vec![b'\n']);
        let owned = String::from("kv");
        assert_eq!(render((&owned).into(), &spec), b"kv");
    }
}
