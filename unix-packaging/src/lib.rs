// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Primitives for producing native Unix packages.

This crate holds the pieces shared by tools producing Debian (`.deb`), RPM
(`.rpm`) and SVR4 (`pkg`) packages from a single project description.

# A Tour of Functionality

Projects carry one canonical version, like `1.2-rc1` or `1.2-SNAPSHOT`. Each
package format has its own version syntax and ordering rules. The [version]
module translates a canonical [version::PackageVersion] into
[version::DebianVersion], [version::RpmVersion] and [version::PkgVersion] so
pre-releases and snapshots sort before the final release in every format.
The [version_compare] module implements the native comparison rules of
`dpkg` and `rpm` so these guarantees can be checked without the native
tools.

Control files consist of `Name: value` headers. The [header] module folds
long comma separated values across physical lines. [control::ControlDocument]
is an ordered collection of headers rendered to control file text and
[deb_control::DebianControlFile] builds the `DEBIAN/control` file of a
binary package.

Packages are ultimately assembled by native tools like `dpkg-deb` and
`rpmbuild`. The [process] module runs such tools: [process::SystemCommand]
describes an invocation and [process::ProcessRunner] runs it, draining its
output streams concurrently so a chatty tool cannot block. The [tool] module
wraps invocations of the individual tools.

# Crate Features

This crate has no optional features.
*/

pub mod control;
pub mod deb_control;
pub mod error;
pub mod header;
pub mod process;
pub mod tool;
pub mod version;
pub mod version_compare;
