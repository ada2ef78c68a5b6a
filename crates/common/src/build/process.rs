use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// How an external command ended.
#[derive(Debug)]
pub(crate) enum Exit {
    Code(Option<i32>),
    TimedOut,
    SpawnFailed(std::io::Error),
}

#[derive(Debug)]
pub(crate) struct CommandRun {
    pub exit: Exit,
    /// Combined stdout and stderr
    pub output: String,
}

/// Run `argv` in `cwd`, killing it if it outlives `timeout`.
pub(crate) async fn run(
    argv: &[String],
    cwd: &Path,
    envs: &[(&str, &str)],
    timeout: Duration,
) -> CommandRun {
    let Some((program, args)) = argv.split_first() else {
        return CommandRun {
            exit: Exit::SpawnFailed(std::io::Error::other("empty command")),
            output: String::new(),
        };
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in envs {
        command.env(key, value);
    }

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return CommandRun {
                exit: Exit::SpawnFailed(e),
                output: String::new(),
            }
        }
    };

    // dropping the future drops the child, which kills it
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(out)) => {
            let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
            output.push_str(&String::from_utf8_lossy(&out.stderr));
            CommandRun {
                exit: Exit::Code(out.status.code()),
                output,
            }
        }
        Ok(Err(e)) => CommandRun {
            exit: Exit::SpawnFailed(e),
            output: String::new(),
        },
        Err(_) => CommandRun {
            exit: Exit::TimedOut,
            output: String::new(),
        },
    }
}

/// Output lines worth keeping in the audit log.
pub(crate) fn diagnostic_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.contains("WARN") || line.contains("ERR"))
        .map(str::to_string)
        .collect()
}
