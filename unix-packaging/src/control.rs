// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Control file style documents.

See <https://www.debian.org/doc/debian-policy/ch-controlfields.html>
for how control files work.
*/

use {
    crate::header::fold_header,
    std::{
        fmt::{Display, Formatter},
        io::Write,
    },
};

/// Column budget used when none is specified.
pub const DEFAULT_WIDTH: usize = 80;

/// The value of a header in a [ControlDocument].
///
/// *Folded* values are comma separated lists that are wrapped across lines as
/// needed. *Multiline* values have a first line following the header name and
/// verbatim continuation lines, as used by `Description`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeaderValue {
    Folded(Vec<String>),
    Multiline { first: String, rest: Vec<String> },
}

impl HeaderValue {
    fn is_empty(&self) -> bool {
        match self {
            Self::Folded(values) => values.is_empty(),
            Self::Multiline { first, rest } => first.is_empty() && rest.is_empty(),
        }
    }

    fn render(&self, width: usize, key: &str) -> Vec<String> {
        match self {
            Self::Folded(values) => fold_header(width, key, values),
            Self::Multiline { first, rest } => std::iter::once(format!("{}: {}", key, first))
                .chain(rest.iter().map(|line| {
                    if line.trim().is_empty() {
                        " .".to_string()
                    } else {
                        format!(" {}", line)
                    }
                }))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Header {
    name: String,
    value: HeaderValue,
}

/// An ordered series of headers rendered as control file text.
///
/// Header names are case insensitive on lookup and case preserving on set.
/// A header occurs at most once; setting an existing header replaces its
/// value while keeping its position.
///
/// Headers without any value are not rendered.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ControlDocument {
    width: usize,
    headers: Vec<Header>,
}

impl Default for ControlDocument {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH)
    }
}

impl ControlDocument {
    /// Construct an empty document folding lines at `width` columns.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            headers: vec![],
        }
    }

    /// The column budget of folded headers.
    pub fn width(&self) -> usize {
        self.width
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.name.eq_ignore_ascii_case(name))
    }

    /// Set the value of a header.
    pub fn set(&mut self, name: impl Into<String>, value: HeaderValue) {
        let name = name.into();

        match self.position(&name) {
            Some(pos) => {
                self.headers[pos] = Header { name, value };
            }
            None => {
                self.headers.push(Header { name, value });
            }
        }
    }

    /// Set a header holding a list of values.
    pub fn set_folded<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) {
        self.set(
            name,
            HeaderValue::Folded(values.into_iter().map(|v| v.into()).collect()),
        );
    }

    /// Set a header holding a single value.
    pub fn set_simple(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set_folded(name, [value.into()]);
    }

    /// Set a header whose value spans multiple verbatim lines.
    ///
    /// Empty continuation lines are rendered as ` .`.
    pub fn set_multiline<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        first: impl Into<String>,
        rest: impl IntoIterator<Item = S>,
    ) {
        self.set(
            name,
            HeaderValue::Multiline {
                first: first.into(),
                rest: rest.into_iter().map(|v| v.into()).collect(),
            },
        );
    }

    /// Append a value to a folded header, creating it if needed.
    ///
    /// A multiline header of the same name is replaced.
    pub fn append_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();

        match self.position(&name) {
            Some(pos) => match &mut self.headers[pos].value {
                HeaderValue::Folded(values) => values.push(value.into()),
                other => *other = HeaderValue::Folded(vec![value.into()]),
            },
            None => self.set_folded(name, [value.into()]),
        }
    }

    /// Remove a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.position(name)
            .map(|pos| self.headers.remove(pos).value)
    }

    /// Obtain the value of a header.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.position(name).map(|pos| &self.headers[pos].value)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterate over header names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|h| h.name.as_str())
    }

    /// Render the document to physical lines, without line terminators.
    pub fn to_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .filter(|h| !h.value.is_empty())
            .flat_map(|h| h.value.render(self.width, &h.name))
            .collect()
    }

    /// Write the document to a writer.
    ///
    /// Every line, including the last, is terminated by `\n`.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for line in self.to_lines() {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }

        Ok(())
    }
}

impl Display for ControlDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for line in self.to_lines() {
            writeln!(f, "{}", line)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_and_replacement() {
        let mut doc = ControlDocument::default();
        doc.set_simple("Package", "foo");
        doc.set_folded("Depends", ["a", "b"]);
        doc.set_simple("Section", "misc");

        // Replacement keeps the original position and takes the new name casing.
        doc.set_folded("depends", ["c"]);

        assert_eq!(doc.names().collect::<Vec<_>>(), vec!["Package", "depends", "Section"]);
        assert_eq!(
            doc.to_lines(),
            vec!["Package: foo", "depends: c", "Section: misc"]
        );
        assert!(doc.has_header("DEPENDS"));
    }

    #[test]
    fn empty_headers_omitted() {
        let mut doc = ControlDocument::default();
        doc.set_simple("Package", "foo");
        doc.set_folded("Depends", Vec::<String>::new());
        doc.set_multiline("Description", "", Vec::<String>::new());

        assert_eq!(doc.to_lines(), vec!["Package: foo"]);
        assert!(doc.has_header("Depends"));
    }

    #[test]
    fn append_and_remove() {
        let mut doc = ControlDocument::new(20);
        doc.append_value("Provides", "a");
        doc.append_value("Provides", "bbbbbbbb");
        doc.append_value("Provides", "cccccccc");

        assert_eq!(
            doc.get("provides"),
            Some(&HeaderValue::Folded(vec![
                "a".to_string(),
                "bbbbbbbb".to_string(),
                "cccccccc".to_string()
            ]))
        );
        assert_eq!(
            doc.to_lines(),
            vec!["Provides: a, bbbbbbbb, ", " cccccccc"]
        );

        assert!(doc.remove("Provides").is_some());
        assert!(doc.remove("Provides").is_none());
        assert!(doc.to_lines().is_empty());
    }

    #[test]
    fn render_text() -> std::io::Result<()> {
        let mut doc = ControlDocument::new(30);
        doc.set_simple("Package", "webapp");
        doc.set_folded("Depends", ["tomcat6", "sun-java6-jdk", "libfoo (>= 1.2)"]);
        doc.set_multiline(
            "Description",
            "A web application",
            ["Serves things.", "", "Really."],
        );

        // Folded lines keep their trailing separator.
        let expected = concat!(
            "Package: webapp\n",
            "Depends: tomcat6, sun-java6-jdk, \n",
            " libfoo (>= 1.2)\n",
            "Description: A web application\n",
            " Serves things.\n",
            " .\n",
            " Really.\n",
        );

        assert_eq!(doc.to_string(), expected);

        let mut buffer = vec![];
        doc.write(&mut buffer)?;
        assert_eq!(String::from_utf8_lossy(&buffer), expected);

        // Rendering has no side effects.
        assert_eq!(doc.to_string(), expected);

        Ok(())
    }
}
