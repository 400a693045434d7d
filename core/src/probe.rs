use std::sync::Arc;

use tracing::debug;

use crate::process::{CommandRunner, Environment, Invocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub fn is_present(&self) -> bool {
        matches!(self, Presence::Present)
    }
}

/// Checks whether a tool can be run, by asking it for its version.
#[derive(Debug, Clone)]
pub struct Prober {
    runner: Arc<dyn CommandRunner>,
}

impl Prober {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// `Present` only when `<tool> --version` exits with status zero.
    ///
    /// A tool that cannot be spawned is simply absent; this never fails.
    pub async fn probe(&self, tool: &str, env: &Environment) -> Presence {
        let invocation = Invocation::new(tool).arg("--version").env(env);
        match self.runner.run(&invocation).await {
            Ok(out) if out.success => {
                let version = out.stdout.lines().next().unwrap_or_default();
                debug!(tool, version, "tool present");
                Presence::Present
            }
            Ok(out) => {
                debug!(tool, code = ?out.code, "version query failed");
                Presence::Absent
            }
            Err(e) => {
                debug!(tool, error = %e, "could not spawn");
                Presence::Absent
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandOutput;
    use crate::testing::{FakeRunner, Reply};

    #[tokio::test]
    async fn zero_exit_is_present() {
        let runner = FakeRunner::new()
            .on("nmap", |_| Reply::Output(CommandOutput::ok("Nmap version 7.94")));
        let prober = Prober::new(Arc::new(runner));
        assert_eq!(prober.probe("nmap", &Environment::inherited()).await, Presence::Present);
    }

    #[tokio::test]
    async fn non_zero_exit_is_absent() {
        let runner =
            FakeRunner::new().on("nmap", |_| Reply::Output(CommandOutput::failed(127, "")));
        let prober = Prober::new(Arc::new(runner));
        assert_eq!(prober.probe("nmap", &Environment::inherited()).await, Presence::Absent);
    }

    #[tokio::test]
    async fn spawn_error_is_absent() {
        let prober = Prober::new(Arc::new(FakeRunner::new()));
        assert_eq!(prober.probe("nmap", &Environment::inherited()).await, Presence::Absent);
    }

    #[tokio::test]
    async fn probe_asks_for_version() {
        let runner = Arc::new(
            FakeRunner::new().on("choco", |_| Reply::Output(CommandOutput::ok("2.2.2"))),
        );
        let prober = Prober::new(runner.clone());
        prober.probe("choco", &Environment::inherited()).await;

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].display(), "choco --version");
    }
}
