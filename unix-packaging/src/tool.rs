// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Invocations of native packaging tools.

Output of the tools is returned as unparsed lines. A non-zero exit of a tool
is an error.
*/

use {
    crate::{
        error::Result,
        process::{available, available_with, OutputSink, ProcessRunner, SystemCommand},
    },
    std::path::Path,
};

/// A native tool used to build or inspect packages.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NativeTool {
    DpkgDeb,
    Rpm,
    Rpmbuild,
    Pkgmk,
    Pkgtrans,
    Pkgchk,
}

impl NativeTool {
    pub const ALL: [NativeTool; 6] = [
        Self::DpkgDeb,
        Self::Rpm,
        Self::Rpmbuild,
        Self::Pkgmk,
        Self::Pkgtrans,
        Self::Pkgchk,
    ];

    /// Name of the executable.
    pub fn executable(&self) -> &'static str {
        match self {
            Self::DpkgDeb => "dpkg-deb",
            Self::Rpm => "rpm",
            Self::Rpmbuild => "rpmbuild",
            Self::Pkgmk => "pkgmk",
            Self::Pkgtrans => "pkgtrans",
            Self::Pkgchk => "pkgchk",
        }
    }

    /// Whether the executable is found on `PATH`.
    pub fn is_available(&self) -> bool {
        available(self.executable())
    }

    /// Whether the executable is found on `PATH`, probing with `runner`.
    pub fn is_available_with(&self, runner: &ProcessRunner) -> bool {
        available_with(runner, self.executable())
    }

    fn command<'a>(&self) -> SystemCommand<'a> {
        SystemCommand::new(self.executable())
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn run_collecting(runner: &ProcessRunner, command: SystemCommand<'_>) -> Result<Vec<String>> {
    let mut lines = vec![];

    command
        .stdout(OutputSink::collect_lines(&mut lines))?
        .execute_with(runner)?
        .assert_success()?;

    Ok(lines)
}

/// Build a `.deb` from a directory holding a `DEBIAN/control` file.
pub fn dpkg_deb_build(runner: &ProcessRunner, package_dir: &Path, deb_file: &Path) -> Result<()> {
    NativeTool::DpkgDeb
        .command()
        .arg("-b")
        .arg(path_arg(package_dir))
        .arg(path_arg(deb_file))
        .execute_with(runner)?
        .assert_success()?;

    Ok(())
}

/// List the contents of a `.deb`.
pub fn dpkg_deb_contents(runner: &ProcessRunner, deb_file: &Path) -> Result<Vec<String>> {
    run_collecting(
        runner,
        NativeTool::DpkgDeb
            .command()
            .arg("--contents")
            .arg(path_arg(deb_file)),
    )
}

/// List the files in an `.rpm`.
pub fn rpm_query_files(runner: &ProcessRunner, rpm_file: &Path) -> Result<Vec<String>> {
    run_collecting(
        runner,
        NativeTool::Rpm
            .command()
            .args(["-q", "--queryformat", "[%{FILENAMES}\\n]", "-p"])
            .arg(path_arg(rpm_file)),
    )
}

/// Build a binary RPM from a `.spec` file.
///
/// Files are taken from `build_root` and the package is written under
/// `rpm_dir`.
pub fn rpmbuild(
    runner: &ProcessRunner,
    spec_file: &Path,
    build_root: &Path,
    rpm_dir: &Path,
) -> Result<()> {
    NativeTool::Rpmbuild
        .command()
        .arg("-bb")
        .arg("--buildroot")
        .arg(path_arg(build_root))
        .arg("--define")
        .arg(format!("_rpmdir {}", rpm_dir.display()))
        .arg(path_arg(spec_file))
        .execute_with(runner)?
        .assert_success()?;

    Ok(())
}

/// Create a package in directory format from a `prototype` file.
pub fn pkgmk(runner: &ProcessRunner, prototype: &Path, pkg_dir: &Path) -> Result<()> {
    NativeTool::Pkgmk
        .command()
        .arg("-o")
        .arg("-f")
        .arg(path_arg(prototype))
        .arg("-d")
        .arg(path_arg(pkg_dir))
        .execute_with(runner)?
        .assert_success()?;

    Ok(())
}

/// Convert a package in directory format to a datastream file.
pub fn pkgtrans(runner: &ProcessRunner, pkg_dir: &Path, pkg_file: &Path, package: &str) -> Result<()> {
    NativeTool::Pkgtrans
        .command()
        .arg("-s")
        .arg(path_arg(pkg_dir))
        .arg(path_arg(pkg_file))
        .arg(package)
        .execute_with(runner)?
        .assert_success()?;

    Ok(())
}

/// List the contents of a datastream package.
pub fn pkgchk_device(runner: &ProcessRunner, pkg_file: &Path) -> Result<Vec<String>> {
    run_collecting(
        runner,
        NativeTool::Pkgchk
            .command()
            .arg("-l")
            .arg("-d")
            .arg(path_arg(pkg_file))
            .arg("all"),
    )
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            deb_control::DebianControlFile,
            error::UnixPackagingError,
            process::{DefaultSink, RunnerConfig},
            version::PackageVersion,
        },
    };

    fn quiet_runner() -> ProcessRunner {
        ProcessRunner::new(RunnerConfig {
            stdout: DefaultSink::Ignore,
            stderr: DefaultSink::Ignore,
            dump_commands: false,
        })
    }

    #[test]
    fn executables() {
        assert_eq!(NativeTool::DpkgDeb.executable(), "dpkg-deb");
        assert_eq!(NativeTool::ALL.len(), 6);
    }

    #[test]
    fn dpkg_deb_round_trip() -> Result<()> {
        if !NativeTool::DpkgDeb.is_available() {
            eprintln!("dpkg-deb not available; skipping");
            return Ok(());
        }

        let temp_dir = tempfile::tempdir()?;
        let package_dir = temp_dir.path().join("pkg");
        std::fs::create_dir_all(package_dir.join("DEBIAN"))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(
                package_dir.join("DEBIAN"),
                std::fs::Permissions::from_mode(0o755),
            )?;
        }
        std::fs::create_dir_all(package_dir.join("usr/share/hello"))?;
        std::fs::write(package_dir.join("usr/share/hello/README"), b"hello")?;

        let version = PackageVersion::new("1.0-rc1", "20090423095107", true, None);
        let control = DebianControlFile::new("hello")
            .version(&version)
            .architecture("all")
            .maintainer("Jane Doe <jane@example.com>")
            .description("Greeting\nSays hello.");
        let mut fh = std::fs::File::create(package_dir.join("DEBIAN/control"))?;
        control.write(&mut fh)?;
        drop(fh);

        let runner = quiet_runner();
        let deb_file = temp_dir.path().join("hello.deb");
        dpkg_deb_build(&runner, &package_dir, &deb_file)?;

        let contents = dpkg_deb_contents(&runner, &deb_file)?;
        assert!(contents
            .iter()
            .any(|l| l.ends_with("./usr/share/hello/README")));

        Ok(())
    }

    #[test]
    fn failure_is_error() -> Result<()> {
        if !NativeTool::DpkgDeb.is_available() {
            eprintln!("dpkg-deb not available; skipping");
            return Ok(());
        }

        let temp_dir = tempfile::tempdir()?;
        let res = dpkg_deb_contents(&quiet_runner(), &temp_dir.path().join("missing.deb"));

        assert!(matches!(res, Err(UnixPackagingError::CommandFailed { .. })));

        Ok(())
    }
}
