//! Tree builder used by the schema/board writers.
//!
//! Grounded in the teacher's `sexp::builder::Builder`, inferred from its
//! call sites in `schema_writer.rs` (`builder.push(...)`,
//! `builder.value(...)`, `builder.text(...)`, `builder.end()`). Extended
//! with explicit `int`/`float` so callers can't accidentally hand a
//! numeric coordinate to a field that must stay a string (the historical
//! `lib_id -100` defect from spec §4.3).

use crate::error::Error;
use crate::sx::{Sexp, SexpAtom};

pub struct Builder {
    stack: Vec<Sexp>,
}

impl Builder {
    pub fn new() -> Self {
        Builder { stack: Vec::new() }
    }

    /// Open a new child list under the current node (or the root, if this
    /// is the first call).
    pub fn push(&mut self, name: &str) -> &mut Self {
        self.stack.push(Sexp::new(name));
        self
    }

    /// Append a bare, unquoted token (enum value, flag, pre-formatted
    /// number) to the node currently open.
    pub fn value(&mut self, v: &str) -> &mut Self {
        self.current().push(SexpAtom::Symbol(v.to_string()));
        self
    }

    /// Append a quoted string.
    pub fn text(&mut self, v: &str) -> &mut Self {
        self.current().push(SexpAtom::Text(v.to_string()));
        self
    }

    /// Append an integer literal.
    pub fn int(&mut self, v: i64) -> &mut Self {
        self.current().push(SexpAtom::Int(v));
        self
    }

    /// Append a float literal (always serialized with a decimal point).
    pub fn float(&mut self, v: f32) -> &mut Self {
        self.current().push(SexpAtom::Float(v));
        self
    }

    /// Close the currently open list, attaching it to its parent.
    pub fn end(&mut self) -> &mut Self {
        if let Some(done) = self.stack.pop() {
            if let Some(parent) = self.stack.last_mut() {
                parent.push(SexpAtom::Node(done));
            } else {
                // root closed; put it back so `sexp()` can take it.
                self.stack.push(done);
            }
        }
        self
    }

    fn current(&mut self) -> &mut Sexp {
        self.stack
            .last_mut()
            .expect("push must be called before value/text/int/float")
    }

    pub fn sexp(mut self) -> Result<Sexp, Error> {
        if self.stack.len() != 1 {
            return Err(Error::BadGrammar(
                "sx".into(),
                format!("builder left {} unclosed lists", self.stack.len()),
            ));
        }
        Ok(self.stack.pop().unwrap())
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree() {
        let mut b = Builder::new();
        b.push("at");
        b.float(50.8);
        b.float(50.8);
        b.int(0);
        b.end();
        let sexp = b.sexp().unwrap();
        assert_eq!("at", sexp.name);
        assert_eq!(3, sexp.nodes.len());
    }
}
