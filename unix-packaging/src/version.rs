// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Canonical package versions and their native encodings.

A [PackageVersion] describes a release once. The Debian, RPM and SVR4 pkg
formats each have their own version grammar with incompatible ordering
rules, so the translation to each one is format specific:

* Debian uses `~`, which sorts before anything (even the end of a string),
  to make pre-releases and snapshots sort below the final release.
* RPM forbids `-` in the version field and sorts a release starting with
  `0.` below one starting with `1`, so pre-releases and snapshots move into
  a `0.1.` prefixed release.
* SVR4 pkg has no ordering rules at all, so components are simply joined
  with `-`.

Translation never fails. Version strings that don't follow the expected
shape degrade to "no pre-release" / "no embedded revision".
*/

use {
    crate::version_compare::{compare_debian_versions, compare_rpm_versions},
    chrono::{DateTime, Utc},
    std::{
        cmp::Ordering,
        fmt::{Display, Formatter},
    },
};

/// Suffix identifying a development version.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Revision used when none is configured.
pub const DEFAULT_REVISION: &str = "1";

/// `strftime` format of snapshot timestamps.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Prefix of RPM releases for pre-releases and snapshots.
///
/// Releases starting with `0.` sort below the `1` of the final release.
const RPM_PRE_RELEASE_PREFIX: &str = "0.1.";

/// Format a point in time as a snapshot timestamp (`YYYYMMDDHHMMSS`).
pub fn snapshot_timestamp(time: &DateTime<Utc>) -> String {
    time.format(SNAPSHOT_TIMESTAMP_FORMAT).to_string()
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
}

fn is_pre_release_tag(segment: &str) -> bool {
    !segment.is_empty() && !is_numeric(segment)
}

/// A parsed upstream version string.
///
/// The string is split on `-`. The part before the first `-` is the *base*.
/// The first non-numeric segment after it is the *pre-release tag* (`rc1` in
/// `1.2-rc1-3`). A trailing numeric segment is the *embedded revision*
/// (`3` in `1.2-3` and `1.2-rc1-3`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UpstreamVersion<'a> {
    value: &'a str,
    /// Offset of the `-` preceding the pre-release tag.
    tag_dash: Option<usize>,
}

impl<'a> UpstreamVersion<'a> {
    /// Parse an upstream version string.
    ///
    /// This never fails.
    pub fn parse(value: &'a str) -> Self {
        let mut tag_dash = None;

        if let Some(first_dash) = value.find('-') {
            let mut offset = first_dash;

            for segment in value[first_dash + 1..].split('-') {
                if is_pre_release_tag(segment) {
                    tag_dash = Some(offset);
                    break;
                }

                offset += 1 + segment.len();
            }
        }

        Self { value, tag_dash }
    }

    /// The full upstream version string.
    pub fn as_str(&self) -> &'a str {
        self.value
    }

    /// The part before the first `-`.
    pub fn base(&self) -> &'a str {
        match self.value.find('-') {
            Some(pos) => &self.value[..pos],
            None => self.value,
        }
    }

    /// Everything after the first `-`, if anything.
    pub fn qualifier(&self) -> Option<&'a str> {
        self.value
            .find('-')
            .map(|pos| &self.value[pos + 1..])
            .filter(|q| !q.is_empty())
    }

    /// The pre-release tag, if present.
    pub fn pre_release(&self) -> Option<&'a str> {
        self.pre_release_part()
            .map(|part| part.split('-').next().unwrap_or(part))
    }

    /// The embedded revision, if present.
    pub fn embedded_revision(&self) -> Option<&'a str> {
        self.qualifier()
            .and_then(|q| q.rsplit('-').next())
            .filter(|segment| is_numeric(segment))
    }

    /// The part of the version preceding the pre-release tag.
    ///
    /// This is the whole string when there is no pre-release tag.
    pub fn release_part(&self) -> &'a str {
        match self.tag_dash {
            Some(pos) => &self.value[..pos],
            None => self.value,
        }
    }

    /// The pre-release tag and everything following it.
    pub fn pre_release_part(&self) -> Option<&'a str> {
        self.tag_dash.map(|pos| &self.value[pos + 1..])
    }
}

/// A canonical description of a release.
///
/// Instances are built once from the project's version metadata and then
/// translated into each native format via [Self::debian_version()],
/// [Self::rpm_version()] and [Self::pkg_version()].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PackageVersion {
    upstream_version: String,
    timestamp: String,
    snapshot: bool,
    revision: Option<String>,
}

impl PackageVersion {
    /// Construct an instance.
    ///
    /// A trailing `-SNAPSHOT` is removed from `version`. Whether the version
    /// is treated as a snapshot is governed by `snapshot` alone. An empty
    /// `revision` is treated as absent.
    pub fn new(
        version: impl Into<String>,
        timestamp: impl Into<String>,
        snapshot: bool,
        revision: Option<String>,
    ) -> Self {
        let mut upstream_version = version.into();
        if upstream_version.ends_with(SNAPSHOT_SUFFIX) {
            upstream_version.truncate(upstream_version.len() - SNAPSHOT_SUFFIX.len());
        }

        Self {
            upstream_version,
            timestamp: timestamp.into(),
            snapshot,
            revision: revision.filter(|r| !r.trim().is_empty()),
        }
    }

    /// Construct an instance from a project version like `1.2-SNAPSHOT`.
    ///
    /// The version is a snapshot iff it carries the `-SNAPSHOT` suffix.
    pub fn from_project_version(
        version: &str,
        timestamp: impl Into<String>,
        revision: Option<String>,
    ) -> Self {
        let snapshot = version.ends_with(SNAPSHOT_SUFFIX);

        Self::new(version, timestamp, snapshot, revision)
    }

    /// The upstream version, without any `-SNAPSHOT` suffix.
    pub fn upstream_version(&self) -> &str {
        &self.upstream_version
    }

    /// The parsed upstream version.
    pub fn upstream(&self) -> UpstreamVersion<'_> {
        UpstreamVersion::parse(&self.upstream_version)
    }

    /// The snapshot timestamp.
    ///
    /// Only meaningful when [Self::is_snapshot()].
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn is_snapshot(&self) -> bool {
        self.snapshot
    }

    /// The explicitly configured revision.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// The revision to use for the revision slot of a native version.
    ///
    /// This is the configured revision or [DEFAULT_REVISION]. An embedded
    /// revision is part of the version, not of the revision slot.
    pub fn effective_revision(&self) -> &str {
        self.revision().unwrap_or(DEFAULT_REVISION)
    }

    /// The configured revision, if it differs from the default.
    fn explicit_revision(&self) -> Option<&str> {
        self.revision().filter(|r| *r != DEFAULT_REVISION)
    }

    /// Obtain the Debian version string.
    ///
    /// Format: `<release>[~<pre-release>][~<timestamp>]-<revision>`.
    pub fn debian_version(&self) -> DebianVersion {
        let upstream = self.upstream();

        let mut s = match upstream.pre_release_part() {
            Some(pre) => format!("{}~{}", upstream.release_part(), pre),
            None => upstream.as_str().to_string(),
        };

        if self.snapshot {
            s.push('~');
            s.push_str(&self.timestamp);
        }

        s.push('-');
        s.push_str(self.effective_revision());

        DebianVersion(s)
    }

    /// Obtain the RPM version and release.
    pub fn rpm_version(&self) -> RpmVersion {
        let upstream = self.upstream();

        let version = upstream.release_part().replace('-', "_");

        // A snapshot of a pre-release is identified by its tag alone.
        let marker = match upstream.pre_release_part() {
            Some(pre) => Some(pre.replace('-', "_")),
            None if self.snapshot => Some(self.timestamp.clone()),
            None => None,
        };

        let release = match marker {
            Some(marker) => {
                let mut release = format!("{}{}", RPM_PRE_RELEASE_PREFIX, marker);
                if let Some(revision) = self.explicit_revision() {
                    release.push('.');
                    release.push_str(revision);
                }
                release
            }
            None => self.effective_revision().to_string(),
        };

        RpmVersion { version, release }
    }

    /// Obtain the SVR4 pkg version string.
    ///
    /// Format: `<upstream>[-<timestamp>][-<revision>]`.
    pub fn pkg_version(&self) -> PkgVersion {
        let mut s = self.upstream_version.clone();

        if self.snapshot {
            s.push('-');
            s.push_str(&self.timestamp);
        }

        if let Some(revision) = self.explicit_revision() {
            s.push('-');
            s.push_str(revision);
        }

        PkgVersion(s)
    }
}

/// A Debian package version string.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DebianVersion(String);

impl DebianVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Compare against another version using `dpkg` ordering rules.
    pub fn compare(&self, other: &Self) -> Ordering {
        compare_debian_versions(&self.0, &other.0)
    }
}

impl AsRef<str> for DebianVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for DebianVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An RPM `Version` and `Release` pair.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RpmVersion {
    version: String,
    release: String,
}

impl RpmVersion {
    /// The `Version` tag value.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The `Release` tag value.
    pub fn release(&self) -> &str {
        &self.release
    }

    /// Compare against another version using `rpm` ordering rules.
    pub fn compare(&self, other: &Self) -> Ordering {
        compare_rpm_versions(
            (&self.version, &self.release),
            (&other.version, &other.release),
        )
    }
}

impl Display for RpmVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.version, self.release)
    }
}

/// An SVR4 pkg `VERSION` string.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PkgVersion(String);

impl PkgVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for PkgVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PkgVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
