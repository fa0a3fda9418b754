//! Template resolution.
//!
//! Templates are plain strings holding `[token]` placeholders. A token is made
//! of ASCII alphanumerics, underscores and dots: `[name]` looks up a variable,
//! `[name.property]` walks into an object or map value. Anything else between
//! brackets is left alone, which keeps Xcode settings such as
//! `"CODE_SIGN_IDENTITY[sdk=iphoneos*]"` intact. `[[name]]` renders `[name]`.
//!
//! Variables live on a stack of scopes. `declare` pushes a binding and returns
//! a guard which pops it when dropped; the innermost binding of a name wins.
//!
//! Values which don't apply to a given output resolve to [`REMOVE_LINE_TAG`].
//! Once a whole file is assembled, [`remove_tagged_lines`] drops every line
//! holding the tag.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Error, Result};

pub const REMOVE_LINE_TAG: &str = "REMOVE_LINE_TAG";

/// Object values expose their fields through this accessor.
pub trait Properties<'a> {
  fn property(&self, name: &str) -> Option<Value<'a>>;
}

impl<'a, F> Properties<'a> for F where F: Fn(&str) -> Option<Value<'a>> {
  fn property(&self, name: &str) -> Option<Value<'a>> {
    self(name)
  }
}

#[derive(Clone)]
pub enum Value<'a> {
  Str(Cow<'a, str>),
  Map(&'a BTreeMap<String, String>),
  Object(Rc<dyn Properties<'a> + 'a>)
}

impl<'a> Value<'a> {
  pub fn object<P>(p: P) -> Self where P: Properties<'a> + 'a {
    Value::Object(Rc::new(p))
  }

  fn get(&self, name: &str) -> Option<Value<'a>> {
    match self {
      Value::Str(_)    => None,
      Value::Map(m)    => m.get(name).map(|s| Value::Str(Cow::Borrowed(s.as_str()))),
      Value::Object(o) => o.property(name)
    }
  }
}

impl<'a> From<&'a str> for Value<'a> {
  fn from(s: &'a str) -> Self { Value::Str(Cow::Borrowed(s)) }
}

impl<'a> From<&'a String> for Value<'a> {
  fn from(s: &'a String) -> Self { Value::Str(Cow::Borrowed(s.as_str())) }
}

impl From<String> for Value<'_> {
  fn from(s: String) -> Self { Value::Str(Cow::Owned(s)) }
}

impl<'a> From<Cow<'a, str>> for Value<'a> {
  fn from(s: Cow<'a, str>) -> Self { Value::Str(s) }
}

impl<'a> From<&'a BTreeMap<String, String>> for Value<'a> {
  fn from(m: &'a BTreeMap<String, String>) -> Self { Value::Map(m) }
}

#[derive(Default)]
pub struct Resolver<'a> {
  scopes: RefCell<Vec<(String, Value<'a>)>>
}

/// Pops its binding when dropped.
#[must_use = "the binding is removed as soon as the scope is dropped"]
pub struct Scope<'r, 'a> {
  resolver: &'r Resolver<'a>,
  depth:    usize
}

impl Drop for Scope<'_, '_> {
  fn drop(&mut self) {
    let mut scopes = self.resolver.scopes.borrow_mut();
    debug_assert_eq!(scopes.len(), self.depth + 1, "resolver scopes dropped out of order");
    scopes.pop();
  }
}

impl<'a> Resolver<'a> {
  pub fn new() -> Self {
    Resolver { scopes: RefCell::new(Vec::new()) }
  }

  pub fn declare<V>(&self, name: &str, value: V) -> Scope<'_, 'a> where V: Into<Value<'a>> {
    let mut scopes = self.scopes.borrow_mut();
    let depth = scopes.len();
    scopes.push((name.to_string(), value.into()));
    Scope { resolver: self, depth }
  }

  pub fn resolve(&self, template: &str) -> Result<String> {
    self.substitute(template)
  }

  fn lookup(&self, token: &str) -> Option<String> {
    let mut parts = token.split('.');
    let name      = parts.next()?;
    let mut value = {
      let scopes = self.scopes.borrow();
      scopes.iter().rev().find(|(n, _)| n == name)?.1.clone()
    };
    for part in parts {
      value = value.get(part)?;
    }
    match value {
      Value::Str(s) => Some(s.into_owned()),
      _             => None
    }
  }

  fn available(&self) -> Vec<String> {
    let mut names: Vec<String> = self.scopes.borrow().iter().map(|(n, _)| n.clone()).collect();
    names.sort_unstable();
    names.dedup();
    names
  }

  fn substitute(&self, template: &str) -> Result<String> {
    let bytes    = template.as_bytes();
    let mut out  = String::with_capacity(template.len());
    let mut last = 0;
    let mut i    = 0;

    while i < bytes.len() {
      if bytes[i] != b'[' {
        i += 1;
        continue;
      }

      if bytes.get(i + 1) == Some(&b'[') {
        let end = token_end(bytes, i + 2);
        if end > i + 2 && bytes[end..].starts_with(b"]]") {
          out.push_str(&template[last..i]);
          out.push_str(&template[i + 1..end + 1]);
          i    = end + 2;
          last = i;
        }
        else {
          i += 1;
        }
        continue;
      }

      let end = token_end(bytes, i + 1);
      if end == i + 1 || bytes.get(end) != Some(&b']') {
        i += 1;
        continue;
      }

      let token = &template[i + 1..end];
      out.push_str(&template[last..i]);
      match self.lookup(token) {
        Some(v) => out.push_str(&v),
        None    => return Err(Error::Template {
          token:     token.to_string(),
          line:      template[..i].matches('\n').count() + 1,
          available: self.available(),
          template:  template.to_string()
        })
      }
      i    = end + 1;
      last = i;
    }

    out.push_str(&template[last..]);
    Ok(out)
  }
}

fn token_end(bytes: &[u8], start: usize) -> usize {
  let mut end = start;
  while end < bytes.len() && is_token_byte(bytes[end]) {
    end += 1;
  }
  end
}

fn is_token_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Drops every line containing the removal tag. Line endings are preserved.
pub fn remove_tagged_lines(text: &str) -> String {
  text.split_inclusive('\n')
    .filter(|line| !line.contains(REMOVE_LINE_TAG))
    .collect()
}

/// Quotes a property list value when the format requires it.
///
/// Values holding quotes or whitespace are quoted with inner quotes escaped.
/// Otherwise only a `+` forces quotes, since Xcode would read it as a string
/// concatenation.
pub fn quote(item: &str, force: bool) -> Cow<'_, str> {
  if item.is_empty() || item.contains('"') || item.contains(char::is_whitespace) {
    Cow::Owned(["\"", item.replace('"', "\\\"").as_str(), "\""].concat())
  }
  else if force || item.contains('+') {
    Cow::Owned(["\"", item, "\""].concat())
  }
  else {
    Cow::Borrowed(item)
  }
}

/// Escapes text for an XML attribute or element.
pub fn xml_escape(s: &str) -> String {
  s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Formats a list as a property list value nested at `indent`.
pub fn format_list<S: AsRef<str>>(items: &[S], indent: &str, force_quotes: bool) -> String {
  match items {
    []     => match force_quotes {
      true  => "\"\"".to_string(),
      false => REMOVE_LINE_TAG.to_string()
    },
    [item] => quote(item.as_ref(), force_quotes).into_owned(),
    _      => {
      let mut s = String::from("(\n");
      for item in items {
        s.push_str(indent);
        s.push('\t');
        s.push_str(&quote(item.as_ref(), force_quotes));
        s.push_str(",\n");
      }
      s.push_str(indent);
      s.push(')');
      s
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn innermost_binding_wins() {
    let r = Resolver::new();
    let _a = r.declare("name", "outer");
    {
      let _b = r.declare("name", "inner");
      assert_eq!(r.resolve("[name]").unwrap(), "inner");
    }
    assert_eq!(r.resolve("[name]").unwrap(), "outer");
  }

  #[test]
  fn walks_object_properties() {
    let mut options = BTreeMap::new();
    options.insert("SDKRoot".to_string(), "macosx".to_string());

    let r = Resolver::new();
    let _item = r.declare("item", Value::object(|name: &str| match name {
      "uid"     => Some(Value::from("0123456789ABCDEF01234567")),
      "options" => Some(Value::Map(&options)),
      _         => None
    }));

    assert_eq!(r.resolve("[item.uid] = [item.options.SDKRoot];").unwrap(),
               "0123456789ABCDEF01234567 = macosx;");
  }

  #[test]
  fn leaves_non_tokens_alone() {
    let r = Resolver::new();
    let _v = r.declare("id", "X");
    assert_eq!(r.resolve("\"CODE_SIGN_IDENTITY[sdk=iphoneos*]\" = [id];").unwrap(),
               "\"CODE_SIGN_IDENTITY[sdk=iphoneos*]\" = X;");
    assert_eq!(r.resolve("[[id]] [] [ id ]").unwrap(), "[id] [] [ id ]");
  }

  #[test]
  fn unresolved_token_is_an_error() {
    let r = Resolver::new();
    let _v = r.declare("item", "x");
    match r.resolve("first\nsecond [item.missing]") {
      Err(Error::Template { token, line, available, .. }) => {
        assert_eq!(token, "item.missing");
        assert_eq!(line, 2);
        assert_eq!(available, vec!["item".to_string()]);
      },
      other => panic!("expected a template error, got {:?}", other.map(|_| ()))
    }
  }

  #[test]
  fn removes_tagged_lines_without_leaving_blanks() {
    let r = Resolver::new();
    let _v = r.declare("pch", REMOVE_LINE_TAG);
    let text = r.resolve("begin\n\tGCC_PREFIX_HEADER = \"[pch]\";\nend\n").unwrap();
    assert_eq!(remove_tagged_lines(&text), "begin\nend\n");
    assert_eq!(remove_tagged_lines("a\r\nREMOVE_LINE_TAG\r\nb\r\n"), "a\r\nb\r\n");
  }

  #[test]
  fn quoting_policy() {
    assert_eq!(quote("plain", false), "plain");
    assert_eq!(quote("has space", false), "\"has space\"");
    assert_eq!(quote("has\"quote", false), "\"has\\\"quote\"");
    assert_eq!(quote("a+b", false), "\"a+b\"");
    assert_eq!(quote("plain", true), "\"plain\"");
  }

  #[test]
  fn xml_escaping() {
    assert_eq!(xml_escape("R&D <\"a\">"), "R&amp;D &lt;&quot;a&quot;&gt;");
    assert_eq!(xml_escape("plain"), "plain");
  }

  #[test]
  fn list_formatting() {
    let none: &[&str] = &[];
    assert_eq!(format_list(none, "\t\t", false), REMOVE_LINE_TAG);
    assert_eq!(format_list(none, "\t\t", true), "\"\"");
    assert_eq!(format_list(&["-lz"], "\t\t", false), "-lz");
    assert_eq!(format_list(&["a b"], "\t\t", false), "\"a b\"");
    assert_eq!(format_list(&["DEBUG=1", "$(inherited)"], "\t\t\t\t", false),
               "(\n\t\t\t\t\tDEBUG=1,\n\t\t\t\t\t$(inherited),\n\t\t\t\t)");
  }
}
