// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    chrono::Utc,
    clap::{Arg, ArgMatches, Command},
    log::{debug, LevelFilter},
    serde::{Deserialize, Serialize},
    std::str::FromStr,
    thiserror::Error,
    unix_packaging::{
        deb_control::DebianControlFile,
        error::UnixPackagingError,
        process::{ProcessRunner, RunnerConfig},
        tool::NativeTool,
        version::{snapshot_timestamp, PackageVersion, SNAPSHOT_SUFFIX},
    },
};

const VERSION_ABOUT: &str = "\
Print the native package versions of a project version.

A project version like `1.2`, `1.2-rc1` or `1.2-SNAPSHOT` is translated into
the version syntax of each package format such that pre-releases and
snapshots sort before the final release:

deb
   `1.2-rc1` becomes `1.2~rc1-1`. Snapshots gain a `~<timestamp>` suffix.

rpm
   Printed as `<version>-<release>`. `1.2-rc1` becomes `1.2-0.1.rc1`.

pkg
   Components are joined with `-`. SVR4 packages have no ordering rules.

Versions ending in `-SNAPSHOT` are snapshots. The snapshot timestamp
defaults to the current UTC time.
";

const CONTROL_ABOUT: &str = "\
Render the DEBIAN/control file of a binary package.

The package is described by a YAML file with the following keys:

package (required) (string)
   Name of the package.

version (required) (string)
   Project version. A `-SNAPSHOT` suffix denotes a snapshot.

timestamp (optional) (string)
   Snapshot timestamp. Defaults to the current UTC time.

snapshot (optional) (bool)
   Whether the version is a snapshot. Defaults to the presence of the
   `-SNAPSHOT` suffix.

revision (optional) (string)
   Package revision. Defaults to `1`.

section, priority, architecture, maintainer (optional) (string)
essential (optional) (bool)
installed_size (optional) (integer)
   Values of the fields of the same name.

pre_depends, depends, recommends, suggests, conflicts, breaks, provides,
replaces (optional) (list[string])
   Package relationships.

description (optional) (string)
   First line is the synopsis. Following lines are the extended description.
";

#[derive(Debug, Error)]
pub enum UptError {
    #[error("argument parsing error: {0:?}")]
    Clap(#[from] clap::Error),

    #[error("{0}")]
    Packaging(#[from] UnixPackagingError),

    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0:?}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("invalid version format: {0}")]
    InvalidFormat(String),

    #[error("invalid sub-command: {0}")]
    InvalidSubCommand(String),
}

pub type Result<T> = std::result::Result<T, UptError>;

/// Which native versions to print.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VersionFormat {
    All,
    Deb,
    Rpm,
    Pkg,
}

impl FromStr for VersionFormat {
    type Err = UptError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "deb" => Ok(Self::Deb),
            "rpm" => Ok(Self::Rpm),
            "pkg" => Ok(Self::Pkg),
            _ => Err(UptError::InvalidFormat(s.to_string())),
        }
    }
}

fn version_lines(version: &PackageVersion, format: VersionFormat) -> Vec<String> {
    match format {
        VersionFormat::All => vec![
            format!("deb: {}", version.debian_version()),
            format!("rpm: {}", version.rpm_version()),
            format!("pkg: {}", version.pkg_version()),
        ],
        VersionFormat::Deb => vec![version.debian_version().into_string()],
        VersionFormat::Rpm => vec![version.rpm_version().to_string()],
        VersionFormat::Pkg => vec![version.pkg_version().into_string()],
    }
}

/// YAML description of a binary package.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    pub package: String,
    pub version: String,
    pub timestamp: Option<String>,
    pub snapshot: Option<bool>,
    pub revision: Option<String>,
    pub section: Option<String>,
    pub priority: Option<String>,
    pub architecture: Option<String>,
    pub essential: Option<bool>,
    pub maintainer: Option<String>,
    pub installed_size: Option<u64>,
    #[serde(default)]
    pub pre_depends: Vec<String>,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub recommends: Vec<String>,
    #[serde(default)]
    pub suggests: Vec<String>,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub breaks: Vec<String>,
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub replaces: Vec<String>,
    pub description: Option<String>,
}

impl PackageConfig {
    /// Resolve the canonical version, using `now` when no timestamp is set.
    pub fn package_version(&self, now: &str) -> PackageVersion {
        PackageVersion::new(
            self.version.as_str(),
            self.timestamp.as_deref().unwrap_or(now),
            self.snapshot
                .unwrap_or_else(|| self.version.ends_with(SNAPSHOT_SUFFIX)),
            self.revision.clone(),
        )
    }

    pub fn control_file(&self, now: &str) -> DebianControlFile {
        let mut control = DebianControlFile::new(self.package.as_str())
            .version(&self.package_version(now))
            .pre_depends(&self.pre_depends)
            .depends(&self.depends)
            .recommends(&self.recommends)
            .suggests(&self.suggests)
            .conflicts(&self.conflicts)
            .breaks(&self.breaks)
            .provides(&self.provides)
            .replaces(&self.replaces);

        if let Some(v) = &self.section {
            control = control.section(v);
        }
        if let Some(v) = &self.priority {
            control = control.priority(v);
        }
        if let Some(v) = &self.architecture {
            control = control.architecture(v);
        }
        if let Some(v) = self.essential {
            control = control.essential(v);
        }
        if let Some(v) = &self.maintainer {
            control = control.maintainer(v);
        }
        if let Some(v) = self.installed_size {
            control = control.installed_size(v);
        }
        if let Some(v) = &self.description {
            control = control.description(v);
        }

        control
    }
}

fn init_logging(matches: &ArgMatches) {
    let log_level = match matches.occurrences_of("verbose") {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Disable log context except at higher log levels.
    if log_level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    builder.init();
}

pub fn run_cli() -> Result<()> {
    let app = Command::new("Unix Package Tool")
        .version("0.1")
        .author("Gregory Szorc <gregory.szorc@gmail.com>")
        .about("Compute native versions and control files of Unix packages")
        .arg_required_else_help(true);

    let app = app
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .multiple_occurrences(true)
                .help("Increase logging verbosity. Can be specified multiple times."),
        )
        .arg(
            Arg::new("dump-commands")
                .long("dump-commands")
                .global(true)
                .help("Log every external command before running it"),
        );

    let app = app.subcommand(
        Command::new("version")
            .about("Print native package versions of a project version")
            .long_about(VERSION_ABOUT)
            .arg(
                Arg::new("project-version")
                    .long("project-version")
                    .takes_value(true)
                    .required(true)
                    .help("Project version, like 1.2-rc1 or 1.2-SNAPSHOT"),
            )
            .arg(
                Arg::new("timestamp")
                    .long("timestamp")
                    .takes_value(true)
                    .help("Snapshot timestamp (YYYYMMDDHHMMSS)"),
            )
            .arg(
                Arg::new("snapshot")
                    .long("snapshot")
                    .help("Treat the version as a snapshot"),
            )
            .arg(
                Arg::new("revision")
                    .long("revision")
                    .takes_value(true)
                    .help("Package revision"),
            )
            .arg(
                Arg::new("format")
                    .long("format")
                    .takes_value(true)
                    .possible_values(&["all", "deb", "rpm", "pkg"])
                    .default_value("all")
                    .help("Which native versions to print"),
            ),
    );

    let app = app.subcommand(
        Command::new("control")
            .about("Render the DEBIAN/control file of a package")
            .long_about(CONTROL_ABOUT)
            .arg(
                Arg::new("yaml-config")
                    .long("yaml-config")
                    .takes_value(true)
                    .required(true)
                    .allow_invalid_utf8(true)
                    .help("Path to a YAML file describing the package"),
            ),
    );

    let mut app =
        app.subcommand(Command::new("tools").about("Print availability of native packaging tools"));

    let matches = app.clone().get_matches();

    init_logging(&matches);

    let runner = ProcessRunner::new(RunnerConfig {
        dump_commands: matches.is_present("dump-commands"),
        ..RunnerConfig::default()
    });

    match matches.subcommand() {
        Some(("version", args)) => command_version(args),
        Some(("control", args)) => command_control(args),
        Some(("tools", _)) => command_tools(&runner),
        Some((command, _)) => Err(UptError::InvalidSubCommand(command.to_string())),
        None => {
            app.print_help()?;
            Ok(())
        }
    }
}

fn now_timestamp() -> String {
    snapshot_timestamp(&Utc::now())
}

fn command_version(args: &ArgMatches) -> Result<()> {
    let project_version = args
        .value_of("project-version")
        .expect("project-version argument is required");
    let format = VersionFormat::from_str(args.value_of("format").unwrap_or("all"))?;

    let timestamp = args
        .value_of("timestamp")
        .map(|s| s.to_string())
        .unwrap_or_else(now_timestamp);

    let version = PackageVersion::new(
        project_version,
        timestamp,
        args.is_present("snapshot") || project_version.ends_with(SNAPSHOT_SUFFIX),
        args.value_of("revision").map(|s| s.to_string()),
    );
    debug!("resolved {:?}", version);

    for line in version_lines(&version, format) {
        println!("{}", line);
    }

    Ok(())
}

fn command_control(args: &ArgMatches) -> Result<()> {
    let yaml_path = args
        .value_of_os("yaml-config")
        .expect("yaml-config argument is required");

    let f = std::fs::File::open(yaml_path)?;
    let config: PackageConfig = serde_yaml::from_reader(f)?;

    config
        .control_file(&now_timestamp())
        .write(&mut std::io::stdout().lock())?;

    Ok(())
}

fn command_tools(runner: &ProcessRunner) -> Result<()> {
    for tool in NativeTool::ALL {
        println!(
            "{}: {}",
            tool.executable(),
            if tool.is_available_with(runner) {
                "available"
            } else {
                "missing"
            }
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, indoc::indoc};

    #[test]
    fn version_formats() -> Result<()> {
        let version = PackageVersion::new("1.2-rc1", "20090423095107", true, None);

        assert_eq!(
            version_lines(&version, VersionFormat::All),
            vec![
                "deb: 1.2~rc1~20090423095107-1",
                "rpm: 1.2-0.1.rc1",
                "pkg: 1.2-rc1-20090423095107"
            ]
        );
        assert_eq!(
            version_lines(&version, VersionFormat::from_str("deb")?),
            vec!["1.2~rc1~20090423095107-1"]
        );
        assert!(matches!(
            VersionFormat::from_str("msi"),
            Err(UptError::InvalidFormat(_))
        ));

        Ok(())
    }

    #[test]
    fn control_from_yaml() -> Result<()> {
        let config: PackageConfig = serde_yaml::from_str(indoc! {"
            package: webapp
            version: 1.2-rc1
            revision: '2'
            architecture: all
            maintainer: Jane Doe <jane@example.com>
            depends:
              - tomcat6
              - sun-java6-jdk
            description: |
              Web application
              Serves pages.
        "})?;

        let mut buffer = vec![];
        config.control_file("20090423095107").write(&mut buffer)?;

        assert_eq!(
            String::from_utf8_lossy(&buffer),
            indoc! {"
                Package: webapp
                Version: 1.2~rc1-2
                Architecture: all
                Maintainer: Jane Doe <jane@example.com>
                Depends: tomcat6, sun-java6-jdk
                Description: Web application
                 Serves pages.
            "}
        );

        Ok(())
    }

    #[test]
    fn snapshot_from_suffix() -> Result<()> {
        let config: PackageConfig = serde_yaml::from_str(indoc! {"
            package: p
            version: 1.2-SNAPSHOT
        "})?;

        let version = config.package_version("20090423095107");
        assert!(version.is_snapshot());
        assert_eq!(version.debian_version().as_str(), "1.2~20090423095107-1");

        let config = PackageConfig {
            snapshot: Some(false),
            timestamp: Some("20100101000000".to_string()),
            ..config
        };
        assert_eq!(config.package_version("ignored").debian_version().as_str(), "1.2-1");

        Ok(())
    }

    #[test]
    fn unknown_keys_rejected() {
        let res = serde_yaml::from_str::<PackageConfig>(indoc! {"
            package: p
            version: '1.0'
            colour: blue
        "});

        assert!(res.is_err());
    }
}
