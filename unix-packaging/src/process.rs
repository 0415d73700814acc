// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Running native packaging tools.

A [SystemCommand] is a builder for an immutable [ProcessSpec]. A
[ProcessRunner] launches it, drains the standard output and error of the
process into their [OutputSink]s on dedicated threads and waits for the
process to exit.

```no_run
use unix_packaging::process::{OutputSink, SystemCommand};

let mut lines = vec![];

SystemCommand::new("dpkg-deb")
    .arg("--contents")
    .arg("foo.deb")
    .stdout(OutputSink::collect_lines(&mut lines))?
    .execute()?
    .assert_success()?;
# Ok::<(), unix_packaging::error::UnixPackagingError>(())
```
*/

use {
    crate::error::{Result, UnixPackagingError},
    log::{debug, info},
    std::{
        collections::BTreeMap,
        fmt::{Debug, Formatter},
        io::{BufRead, BufReader, Read, Write},
        path::{Path, PathBuf},
        process::{Command, ExitStatus, Stdio},
    },
};

/// Where the output of a process stream goes.
pub enum OutputSink<'a> {
    /// The stream is not connected. Output is discarded without being read.
    Closed,

    /// The stream is read to the end and its content discarded.
    Ignore,

    /// Bytes are copied to a writer, which is flushed at end of stream.
    Writer(Box<dyn Write + Send + 'a>),

    /// A callback receives each line.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped. Invalid UTF-8 is
    /// replaced.
    Lines(Box<dyn FnMut(&str) + Send + 'a>),
}

impl<'a> Debug for OutputSink<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Closed => "Closed",
            Self::Ignore => "Ignore",
            Self::Writer(_) => "Writer",
            Self::Lines(_) => "Lines",
        })
    }
}

impl<'a> OutputSink<'a> {
    /// Copy output to a writer.
    pub fn forward(writer: impl Write + Send + 'a) -> Self {
        Self::Writer(Box::new(writer))
    }

    /// Call a function for every line of output.
    pub fn lines(f: impl FnMut(&str) + Send + 'a) -> Self {
        Self::Lines(Box::new(f))
    }

    /// Append every line of output to a vector.
    pub fn collect_lines(dest: &'a mut Vec<String>) -> Self {
        Self::lines(move |line| dest.push(line.to_string()))
    }

    /// Append every line of output to a string, each followed by `\n`.
    pub fn collect_string(dest: &'a mut String) -> Self {
        Self::lines(move |line| {
            dest.push_str(line);
            dest.push('\n');
        })
    }

    fn stdio(&self) -> Stdio {
        match self {
            Self::Closed => Stdio::null(),
            _ => Stdio::piped(),
        }
    }
}

/// The sink used for a stream without one in its [ProcessSpec].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DefaultSink {
    /// Copy to the same stream of the current process.
    Forward,
    Ignore,
    Closed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn name(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl DefaultSink {
    fn resolve(self, stream: Stream) -> OutputSink<'static> {
        match (self, stream) {
            (Self::Forward, Stream::Stdout) => OutputSink::forward(std::io::stdout()),
            (Self::Forward, Stream::Stderr) => OutputSink::forward(std::io::stderr()),
            (Self::Ignore, _) => OutputSink::Ignore,
            (Self::Closed, _) => OutputSink::Closed,
        }
    }
}

/// Settings applying to every process launched by a [ProcessRunner].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunnerConfig {
    pub stdout: DefaultSink,
    pub stderr: DefaultSink,

    /// Log every command before launching it.
    pub dump_commands: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            stdout: DefaultSink::Forward,
            stderr: DefaultSink::Forward,
            dump_commands: false,
        }
    }
}

/// Builder for a [ProcessSpec].
#[derive(Debug)]
pub struct SystemCommand<'a> {
    command: String,
    args: Vec<String>,
    env: Option<BTreeMap<String, String>>,
    working_directory: Option<PathBuf>,
    stdout: Option<OutputSink<'a>>,
    stderr: Option<OutputSink<'a>>,
    dump_command: bool,
}

impl<'a> SystemCommand<'a> {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: vec![],
            env: None,
            working_directory: None,
            stdout: None,
            stderr: None,
            dump_command: false,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add an argument when `condition` holds.
    #[must_use]
    pub fn arg_if(self, condition: bool, arg: impl Into<String>) -> Self {
        if condition {
            self.arg(arg)
        } else {
            self
        }
    }

    /// Add an argument unless it is empty.
    #[must_use]
    pub fn arg_if_not_empty(self, arg: impl Into<String>) -> Self {
        let arg = arg.into();
        self.arg_if(!arg.is_empty(), arg)
    }

    /// Define an environment variable.
    ///
    /// Once any variable is defined, the process environment consists of the
    /// defined variables only. It is not merged with the environment of the
    /// current process.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the working directory. Defaults to `/`.
    #[must_use]
    pub fn current_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.working_directory = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the sink for standard output.
    pub fn stdout(mut self, sink: OutputSink<'a>) -> Result<Self> {
        if self.stdout.is_some() {
            return Err(UnixPackagingError::DuplicateSink(Stream::Stdout.name()));
        }
        self.stdout = Some(sink);
        Ok(self)
    }

    /// Set the sink for standard error.
    pub fn stderr(mut self, sink: OutputSink<'a>) -> Result<Self> {
        if self.stderr.is_some() {
            return Err(UnixPackagingError::DuplicateSink(Stream::Stderr.name()));
        }
        self.stderr = Some(sink);
        Ok(self)
    }

    /// Log the command line before launching when `condition` holds.
    #[must_use]
    pub fn dump_command_if(mut self, condition: bool) -> Self {
        self.dump_command |= condition;
        self
    }

    /// Finish building.
    pub fn build(self) -> Result<ProcessSpec<'a>> {
        if self.command.is_empty() {
            return Err(UnixPackagingError::MissingCommand);
        }

        Ok(ProcessSpec {
            command: self.command,
            args: self.args,
            env: self.env,
            working_directory: self
                .working_directory
                .unwrap_or_else(|| PathBuf::from("/")),
            stdout: self.stdout,
            stderr: self.stderr,
            dump_command: self.dump_command,
        })
    }

    /// Build and run with a default [ProcessRunner].
    pub fn execute(self) -> Result<ExecutionResult> {
        ProcessRunner::default().run(self.build()?)
    }

    /// Build and run with the given [ProcessRunner].
    pub fn execute_with(self, runner: &ProcessRunner) -> Result<ExecutionResult> {
        runner.run(self.build()?)
    }
}

/// A fully described process invocation.
#[derive(Debug)]
pub struct ProcessSpec<'a> {
    command: String,
    args: Vec<String>,
    env: Option<BTreeMap<String, String>>,
    working_directory: PathBuf,
    stdout: Option<OutputSink<'a>>,
    stderr: Option<OutputSink<'a>>,
    dump_command: bool,
}

impl<'a> ProcessSpec<'a> {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The replacement environment, if any.
    pub fn env(&self) -> Option<&BTreeMap<String, String>> {
        self.env.as_ref()
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// The command line as a single string, for messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(|a| a.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn dump(&self) {
        info!("executing command: {}", self.command);
        for arg in &self.args {
            info!("  {}", arg);
        }
        info!("in directory: {}", self.working_directory.display());
        match &self.env {
            Some(env) => {
                info!("with environment:");
                for (key, value) in env {
                    info!("  {}={}", key, value);
                }
            }
            None => {
                info!("with inherited environment ({} entries)", std::env::vars_os().count());
            }
        }
    }
}

/// The outcome of running a process to completion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecutionResult {
    /// Exit code. `128 + signal` when the process was killed by a signal.
    pub exit_code: i32,

    /// The command line that was run.
    pub command: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit code into an error.
    pub fn assert_success(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(UnixPackagingError::CommandFailed {
                command: self.command,
                exit_code: self.exit_code,
            })
        }
    }

    /// Turn a non-zero exit code into an error carrying `message`.
    pub fn assert_success_with(self, message: impl Into<String>) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(UnixPackagingError::CommandFailedMessage(message.into()))
        }
    }
}

fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

fn drain(mut stream: impl Read, sink: OutputSink<'_>) -> std::io::Result<()> {
    match sink {
        OutputSink::Closed => Ok(()),
        OutputSink::Ignore => {
            std::io::copy(&mut stream, &mut std::io::sink())?;
            Ok(())
        }
        OutputSink::Writer(mut writer) => {
            std::io::copy(&mut stream, &mut writer)?;
            writer.flush()
        }
        OutputSink::Lines(mut f) => {
            let mut reader = BufReader::new(stream);
            let mut buffer = vec![];

            loop {
                buffer.clear();
                if reader.read_until(b'\n', &mut buffer)? == 0 {
                    return Ok(());
                }

                if buffer.last() == Some(&b'\n') {
                    buffer.pop();
                    if buffer.last() == Some(&b'\r') {
                        buffer.pop();
                    }
                }

                f(&String::from_utf8_lossy(&buffer));
            }
        }
    }
}

fn join_drain(
    stream: Stream,
    handle: Option<std::thread::ScopedJoinHandle<'_, std::io::Result<()>>>,
) {
    match handle.map(|h| h.join()) {
        None | Some(Ok(Ok(()))) => {}
        Some(Ok(Err(e))) => {
            debug!("error draining {}: {}", stream.name(), e);
        }
        Some(Err(_)) => {
            debug!("thread draining {} panicked", stream.name());
        }
    }
}

/// Launches processes described by [ProcessSpec].
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner {
    config: RunnerConfig,
}

impl ProcessRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run a process to completion.
    ///
    /// Standard input is connected to nothing. Both output streams are
    /// drained concurrently with the wait for exit, so a process writing
    /// more than a pipe buffer's worth to either stream cannot block. This
    /// returns after the process exited and both streams reached their end.
    pub fn run(&self, spec: ProcessSpec<'_>) -> Result<ExecutionResult> {
        if !spec.working_directory.is_dir() {
            return Err(UnixPackagingError::NotADirectory(spec.working_directory));
        }

        if spec.dump_command || self.config.dump_commands {
            spec.dump();
        }

        let command_line = spec.command_line();

        let ProcessSpec {
            command,
            args,
            env,
            working_directory,
            stdout,
            stderr,
            ..
        } = spec;

        let stdout_sink = stdout.unwrap_or_else(|| self.config.stdout.resolve(Stream::Stdout));
        let stderr_sink = stderr.unwrap_or_else(|| self.config.stderr.resolve(Stream::Stderr));

        let mut cmd = Command::new(&command);
        cmd.args(&args)
            .current_dir(&working_directory)
            .stdin(Stdio::null())
            .stdout(stdout_sink.stdio())
            .stderr(stderr_sink.stdio());

        if let Some(env) = &env {
            cmd.env_clear().envs(env);
        }

        debug!("launching {}", command_line);

        let mut child = cmd.spawn().map_err(|e| UnixPackagingError::Spawn {
            command: command_line.clone(),
            source: e,
        })?;

        let child_stdout = child.stdout.take();
        let child_stderr = child.stderr.take();

        let status = std::thread::scope(|s| {
            let stdout_handle = child_stdout.map(|stream| s.spawn(move || drain(stream, stdout_sink)));
            let stderr_handle = child_stderr.map(|stream| s.spawn(move || drain(stream, stderr_sink)));

            let status = child.wait();

            join_drain(Stream::Stdout, stdout_handle);
            join_drain(Stream::Stderr, stderr_handle);

            status
        })
        .map_err(|e| UnixPackagingError::Wait {
            command: command_line.clone(),
            source: e,
        })?;

        let exit_code = exit_code(&status);
        debug!("{} exited with {}", command_line, exit_code);

        Ok(ExecutionResult {
            exit_code,
            command: command_line,
        })
    }
}

/// Whether a tool can be found on `PATH`.
///
/// Every failure to locate the tool results in `false`.
pub fn available(tool: &str) -> bool {
    available_with(&ProcessRunner::default(), tool)
}

/// Like [available()] but probing with the given runner.
pub fn available_with(runner: &ProcessRunner, tool: &str) -> bool {
    let mut lines = vec![];

    let res = SystemCommand::new("which")
        .arg(tool)
        .stdout(OutputSink::collect_lines(&mut lines))
        .and_then(|c| c.stderr(OutputSink::Ignore))
        .and_then(|c| c.execute_with(runner))
        .and_then(|r| r.assert_success());

    if let Err(e) = res {
        debug!("{} is not available: {}", tool, e);
        return false;
    }

    let path = match lines.first().map(|l| l.trim()) {
        Some(path) if !path.is_empty() => path,
        _ => return false,
    };

    match std::fs::canonicalize(path) {
        Ok(path) => std::fs::File::open(path).is_ok(),
        Err(_) => false,
    }
}
