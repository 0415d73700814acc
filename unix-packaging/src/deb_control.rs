// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian binary package control files. */

use {
    crate::{
        control::{ControlDocument, DEFAULT_WIDTH},
        version::PackageVersion,
    },
    std::io::Write,
};

/// A `DEBIAN/control` file of a binary package.
///
/// See <https://www.debian.org/doc/debian-policy/ch-controlfields.html#binary-package-control-files-debian-control>.
///
/// Instances are built by chaining setters onto [Self::new()]. Fields are
/// rendered in a fixed order regardless of the order they were set in and
/// unset fields are left out.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DebianControlFile {
    package: String,
    version: Option<String>,
    section: Option<String>,
    priority: Option<String>,
    architecture: Option<String>,
    essential: Option<bool>,
    maintainer: Option<String>,
    installed_size: Option<u64>,
    pre_depends: Vec<String>,
    depends: Vec<String>,
    recommends: Vec<String>,
    suggests: Vec<String>,
    conflicts: Vec<String>,
    breaks: Vec<String>,
    provides: Vec<String>,
    replaces: Vec<String>,
    description: Option<String>,
}

fn strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Vec<String> {
    values.into_iter().map(|v| v.into()).collect()
}

impl DebianControlFile {
    /// Construct an instance for the named package.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Self::default()
        }
    }

    /// The `Package` field value.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Set the `Version` field from a canonical version.
    #[must_use]
    pub fn version(self, version: &PackageVersion) -> Self {
        self.version_str(version.debian_version().into_string())
    }

    /// Set the `Version` field verbatim.
    #[must_use]
    pub fn version_str(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    #[must_use]
    pub fn architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architecture = Some(architecture.into());
        self
    }

    #[must_use]
    pub fn essential(mut self, essential: bool) -> Self {
        self.essential = Some(essential);
        self
    }

    #[must_use]
    pub fn maintainer(mut self, maintainer: impl Into<String>) -> Self {
        self.maintainer = Some(maintainer.into());
        self
    }

    /// Set the `Installed-Size` field, in KiB.
    #[must_use]
    pub fn installed_size(mut self, size: u64) -> Self {
        self.installed_size = Some(size);
        self
    }

    #[must_use]
    pub fn pre_depends<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.pre_depends = strings(values);
        self
    }

    #[must_use]
    pub fn depends<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.depends = strings(values);
        self
    }

    #[must_use]
    pub fn recommends<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.recommends = strings(values);
        self
    }

    #[must_use]
    pub fn suggests<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.suggests = strings(values);
        self
    }

    #[must_use]
    pub fn conflicts<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.conflicts = strings(values);
        self
    }

    #[must_use]
    pub fn breaks<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.breaks = strings(values);
        self
    }

    #[must_use]
    pub fn provides<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.provides = strings(values);
        self
    }

    #[must_use]
    pub fn replaces<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.replaces = strings(values);
        self
    }

    /// Set the `Description` field.
    ///
    /// The first line is the synopsis. Following lines form the extended
    /// description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Convert to a [ControlDocument] folding lines at `width` columns.
    pub fn to_document(&self, width: usize) -> ControlDocument {
        let mut doc = ControlDocument::new(width);

        doc.set_simple("Package", self.package.as_str());

        let simple = [
            ("Version", &self.version),
            ("Section", &self.section),
            ("Priority", &self.priority),
            ("Architecture", &self.architecture),
        ];
        for (name, value) in simple {
            if let Some(value) = value {
                doc.set_simple(name, value.as_str());
            }
        }

        if let Some(essential) = self.essential {
            doc.set_simple("Essential", if essential { "yes" } else { "no" });
        }
        if let Some(maintainer) = &self.maintainer {
            doc.set_simple("Maintainer", maintainer.as_str());
        }
        if let Some(size) = self.installed_size {
            doc.set_simple("Installed-Size", size.to_string());
        }

        let relationships = [
            ("Pre-Depends", &self.pre_depends),
            ("Depends", &self.depends),
            ("Recommends", &self.recommends),
            ("Suggests", &self.suggests),
            ("Conflicts", &self.conflicts),
            ("Breaks", &self.breaks),
            ("Provides", &self.provides),
            ("Replaces", &self.replaces),
        ];
        for (name, values) in relationships {
            doc.set_folded(name, values.iter().map(|v| v.as_str()));
        }

        if let Some(description) = &self.description {
            let mut lines = description.lines();
            let synopsis = lines.next().unwrap_or_default();
            doc.set_multiline("Description", synopsis, lines);
        }

        doc
    }

    /// Render to physical lines using the default column budget.
    pub fn to_lines(&self) -> Vec<String> {
        self.to_document(DEFAULT_WIDTH).to_lines()
    }

    /// Write the control file to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.to_document(DEFAULT_WIDTH).write(writer)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, indoc::indoc};

    #[test]
    fn basic() {
        let control = DebianControlFile::new("package-name").depends(["tomcat6", "sun-java6-jdk"]);

        assert_eq!(
            control.to_lines(),
            vec!["Package: package-name", "Depends: tomcat6, sun-java6-jdk"]
        );
    }

    #[test]
    fn full() -> std::io::Result<()> {
        let version = PackageVersion::new("1.2-rc1", "20090423095107", false, None);

        // Setter order does not affect field order.
        let control = DebianControlFile::new("webapp")
            .description("Web application\nServes pages.\n\nFor real.")
            .depends(["tomcat6", "sun-java6-jdk"])
            .maintainer("Jane Doe <jane@example.com>")
            .version(&version)
            .architecture("all")
            .priority("optional")
            .section("web")
            .installed_size(1024)
            .provides(["httpd-cgi"]);

        let mut buffer = vec![];
        control.write(&mut buffer)?;

        assert_eq!(
            String::from_utf8_lossy(&buffer),
            indoc! {"
                Package: webapp
                Version: 1.2~rc1-1
                Section: web
                Priority: optional
                Architecture: all
                Maintainer: Jane Doe <jane@example.com>
                Installed-Size: 1024
                Depends: tomcat6, sun-java6-jdk
                Provides: httpd-cgi
                Description: Web application
                 Serves pages.
                 .
                 For real.
            "}
        );

        Ok(())
    }

    #[test]
    fn long_depends_fold() {
        let depends = (0..12).map(|i| format!("libsomething{}", i)).collect::<Vec<_>>();
        let lines = DebianControlFile::new("p").depends(depends).to_lines();

        assert!(lines.len() > 2);
        assert!(lines[1].starts_with("Depends: libsomething0, "));
        assert!(lines[2..].iter().all(|l| l.starts_with(' ')));
    }
}
