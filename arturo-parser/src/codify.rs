// arturo-parser - Source-form rendering for Arturo values
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Round-trippable source form for values.
//!
//! `codify` renders a value as Arturo source text: reparsing the output of a
//! codified block yields a structurally equal block. This is what backs the
//! `:block` to `:string` conversion.

use crate::value::{ArturoVal, FunctionVal};

/// Render a value as source text.
///
/// With `pretty`, nested blocks are indented one level per depth. With
/// `unwrapped`, the outermost block loses its brackets (the shape of a whole
/// source file). With `safe_strings`, strings containing double quotes are
/// emitted in `{...}` verbatim form instead of escaped quotes.
pub fn codify(value: &ArturoVal, pretty: bool, unwrapped: bool, safe_strings: bool) -> String {
    let mut out = String::new();
    match value {
        ArturoVal::Block(b) if unwrapped => {
            write_items(&mut out, &b.items(), pretty, 0, safe_strings);
        }
        _ => write_value(&mut out, value, pretty, 0, safe_strings),
    }
    out
}

fn write_items(
    out: &mut String,
    items: &[ArturoVal],
    pretty: bool,
    depth: usize,
    safe_strings: bool,
) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            if pretty {
                out.push('\n');
                for _ in 0..depth {
                    out.push_str("    ");
                }
            } else {
                out.push(' ');
            }
        }
        write_value(out, item, pretty, depth, safe_strings);
    }
}

fn write_value(
    out: &mut String,
    value: &ArturoVal,
    pretty: bool,
    depth: usize,
    safe_strings: bool,
) {
    match value {
        ArturoVal::String(s) => {
            if safe_strings && s.contains('"') {
                out.push('{');
                out.push_str(s);
                out.push('}');
            } else {
                out.push('"');
                for c in s.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        '\r' => out.push_str("\\r"),
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
        }
        ArturoVal::Char(c) => {
            out.push('`');
            match c {
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '`' => out.push_str("\\`"),
                '\\' => out.push_str("\\\\"),
                other => out.push(*other),
            }
            out.push('`');
        }
        ArturoVal::Literal(s) => {
            out.push('\'');
            out.push_str(s);
        }
        ArturoVal::SymbolLiteral(s) => {
            out.push('\'');
            out.push_str(s.as_str());
        }
        ArturoVal::PathLiteral(p) => {
            out.push('\'');
            write_segments(out, p, pretty, depth, safe_strings);
        }
        ArturoVal::Path(p) => {
            write_segments(out, p, pretty, depth, safe_strings);
        }
        ArturoVal::PathLabel(p) => {
            write_segments(out, p, pretty, depth, safe_strings);
            out.push(':');
        }
        ArturoVal::Block(b) => {
            out.push('[');
            if pretty && !b.is_empty() {
                out.push('\n');
                for _ in 0..(depth + 1) {
                    out.push_str("    ");
                }
                write_items(out, &b.items(), pretty, depth + 1, safe_strings);
                out.push('\n');
                for _ in 0..depth {
                    out.push_str("    ");
                }
            } else {
                write_items(out, &b.items(), false, depth, safe_strings);
            }
            out.push(']');
        }
        ArturoVal::Inline(b) => {
            out.push('(');
            write_items(out, &b.items(), false, depth, safe_strings);
            out.push(')');
        }
        ArturoVal::Dictionary(d) => {
            out.push_str("#[");
            for (i, (k, v)) in d.borrow().iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(k);
                out.push_str(": ");
                write_value(out, v, false, depth, safe_strings);
            }
            out.push(']');
        }
        ArturoVal::Function(f) => {
            if let FunctionVal::User(u) = &**f {
                out.push_str("$[");
                for (i, p) in u.params.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    out.push_str(p);
                }
                out.push(']');
                write_value(
                    out,
                    &ArturoVal::Block(u.body.clone()),
                    pretty,
                    depth,
                    safe_strings,
                );
            } else {
                out.push_str(&value.to_string());
            }
        }
        // The display form of the remaining variants is already their
        // source form.
        other => out.push_str(&other.to_string()),
    }
}

fn write_segments(
    out: &mut String,
    segments: &[ArturoVal],
    pretty: bool,
    depth: usize,
    safe_strings: bool,
) {
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            out.push('\\');
        }
        write_value(out, seg, pretty, depth, safe_strings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn roundtrip(src: &str) {
        let first = Parser::parse_str(src).expect("initial parse");
        let rendered = codify(
            &ArturoVal::Block(first.clone()),
            false,
            true,
            false,
        );
        let second = Parser::parse_str(&rendered).expect("reparse");
        assert_eq!(
            first.to_vec(),
            second.to_vec(),
            "codify output did not round-trip: {}",
            rendered
        );
    }

    #[test]
    fn test_roundtrip_simple() {
        roundtrip("print \"Hello world!\"");
        roundtrip("x: 10 print x");
        roundtrip("loop 1..3 'i [print i]");
    }

    #[test]
    fn test_roundtrip_function() {
        roundtrip("fib: $[x][if? x<2 [1] else [(fib x-1)+(fib x-2)]]");
    }

    #[test]
    fn test_roundtrip_sugar() {
        roundtrip("d: #[a: 1 b: \"two\"]");
        roundtrip("a: @[1 2 3]");
    }

    #[test]
    fn test_roundtrip_escapes() {
        roundtrip("print \"a\\nb\\\"c\\\"\"");
    }

    #[test]
    fn test_roundtrip_paths() {
        roundtrip("print user\\name");
        roundtrip("user\\name: \"Jane\"");
    }

    #[test]
    fn test_pretty_output_indents() {
        let block = Parser::parse_str("if x [print x]").unwrap();
        let rendered = codify(&ArturoVal::Block(block), true, true, false);
        assert!(rendered.contains('\n'));
    }
}
