//! ExternalCheckRunner (§4.9): drive the sibling command-line tool.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: String,
    pub location: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Idle,
    Running,
    Success,
    Failure,
}

#[derive(Debug)]
pub struct CheckReport {
    pub violations: Vec<Violation>,
    pub stdout: String,
    pub stderr: String,
}

pub struct ExternalCheckRunner {
    tool: std::path::PathBuf,
    timeout: Duration,
    state: CheckState,
}

impl ExternalCheckRunner {
    pub fn new(tool: std::path::PathBuf) -> Self {
        ExternalCheckRunner { tool, timeout: DEFAULT_TIMEOUT, state: CheckState::Idle }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn run_check(&mut self, document: &Path, args: &[&str]) -> Result<CheckReport> {
        self.state = CheckState::Running;
        let mut child = Command::new(&self.tool)
            .arg(document)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let output = self.wait_with_timeout(&mut child)?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            self.state = CheckState::Failure;
            let code = output.status.code().unwrap_or(-1);
            return Err(Error::CheckFailed(code, stderr));
        }

        self.state = CheckState::Success;
        Ok(CheckReport { violations: parse_violations(&stdout), stdout, stderr })
    }

    fn wait_with_timeout(&mut self, child: &mut Child) -> Result<std::process::Output> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                let mut stdout = Vec::new();
                let mut stderr = Vec::new();
                if let Some(mut out) = child.stdout.take() {
                    std::io::Read::read_to_end(&mut out, &mut stdout)?;
                }
                if let Some(mut err) = child.stderr.take() {
                    std::io::Read::read_to_end(&mut err, &mut stderr)?;
                }
                return Ok(std::process::Output { status, stdout, stderr });
            }
            if start.elapsed() > self.timeout {
                child.kill()?;
                child.wait()?;
                self.state = CheckState::Failure;
                return Err(Error::CheckFailed(-1, "external check timed out".to_string()));
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}

/// Parses lines of the form `kind: location: message`, the report
/// format the sibling tool is expected to emit on standard output.
fn parse_violations(stdout: &str) -> Vec<Violation> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, ':');
            let kind = parts.next()?.trim();
            let location = parts.next()?.trim();
            let message = parts.next()?.trim();
            if kind.is_empty() {
                return None;
            }
            Some(Violation {
                kind: kind.to_string(),
                location: location.to_string(),
                message: message.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_violation_report_lines() {
        let report = "drc: F.Cu@10,10: clearance violation\nerc: R1.1: unconnected pin";
        let violations = parse_violations(report);
        assert_eq!(2, violations.len());
        assert_eq!("drc", violations[0].kind);
        assert_eq!("unconnected pin", violations[1].message);
    }

    #[test]
    fn nonzero_exit_reports_check_failed() {
        let mut runner = ExternalCheckRunner::new(std::path::PathBuf::from("false"));
        let err = runner.run_check(Path::new("/tmp/nonexistent.kicad_sch"), &[]).unwrap_err();
        assert!(matches!(err, Error::CheckFailed(_, _)));
    }
}
