//! Serialize a [`Sexp`] tree back to text.
//!
//! Grounded in the teacher's `sexp::writer` (`Sexp::write`/`SexpTree::write`):
//! one child list per line, indented by nesting depth, so the downstream
//! editor's own parser (whitespace-insensitive) accepts the result. Floats
//! keep their decimal point; integers never grow one.

use super::{Sexp, SexpAtom};

pub fn serialize(root: &Sexp) -> String {
    let mut out = String::new();
    write_node(root, 0, &mut out);
    out.push('\n');
    out
}

fn write_node(node: &Sexp, indent: usize, out: &mut String) {
    out.push('(');
    out.push_str(&node.name);

    let has_child_nodes = node
        .nodes
        .iter()
        .any(|n| matches!(n, SexpAtom::Node(_)));

    for atom in &node.nodes {
        match atom {
            SexpAtom::Node(child) => {
                out.push('\n');
                out.push_str(&"  ".repeat(indent + 1));
                write_node(child, indent + 1, out);
            }
            SexpAtom::Symbol(s) => {
                out.push(' ');
                out.push_str(s);
            }
            SexpAtom::Text(s) => {
                out.push_str(" \"");
                out.push_str(&escape(s));
                out.push('"');
            }
            SexpAtom::Int(i) => {
                out.push(' ');
                out.push_str(&i.to_string());
            }
            SexpAtom::Float(v) => {
                out.push(' ');
                out.push_str(&format_float(*v));
            }
        }
    }

    if has_child_nodes {
        out.push('\n');
        out.push_str(&"  ".repeat(indent));
    }
    out.push(')');
}

fn format_float(v: f32) -> String {
    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        let s = v.to_string();
        if s.contains('.') {
            s
        } else {
            format!("{s}.0")
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sx::Sexp;

    #[test]
    fn floats_keep_decimal_point() {
        let mut root = Sexp::new("at");
        root.push(SexpAtom::Float(50.0));
        let text = serialize(&root);
        assert!(text.contains("50.0"));
    }

    #[test]
    fn ints_never_grow_a_decimal_point() {
        let mut root = Sexp::new("unit");
        root.push(SexpAtom::Int(1));
        let text = serialize(&root);
        assert!(text.contains(" 1)"));
        assert!(!text.contains("1.0"));
    }
}
