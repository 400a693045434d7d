//! Test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use scanmap_common::reporter::Reporter;
use scanmap_common::stage::Stage;

use crate::process::{CommandOutput, CommandRunner, Invocation};

pub enum Reply {
    Output(CommandOutput),
    SpawnError(io::ErrorKind),
    /// Never completes.
    Hang,
}

type Handler = Box<dyn Fn(&Invocation) -> Reply + Send + Sync>;

/// Answers invocations by program file stem (`/usr/bin/nmap` -> `nmap`).
/// Unknown programs fail to spawn with `NotFound`.
#[derive(Default)]
pub struct FakeRunner {
    handlers: HashMap<String, Handler>,
    calls: Mutex<Vec<Invocation>>,
}

impl fmt::Debug for FakeRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeRunner")
            .field("programs", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, program: &str, handler: F) -> Self
    where
        F: Fn(&Invocation) -> Reply + Send + Sync + 'static,
    {
        self.handlers.insert(program.to_string(), Box::new(handler));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls()
            .iter()
            .filter(|inv| program_key(&inv.program) == program)
            .count()
    }
}

fn program_key(program: &std::ffi::OsStr) -> String {
    Path::new(program)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        let reply = match self.handlers.get(&program_key(&invocation.program)) {
            Some(handler) => handler(invocation),
            None => Reply::SpawnError(io::ErrorKind::NotFound),
        };
        match reply {
            Reply::Output(out) => Ok(out),
            Reply::SpawnError(kind) => Err(io::Error::from(kind)),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// The path following `-oX` in a scanner invocation.
pub fn report_arg(invocation: &Invocation) -> Option<PathBuf> {
    let idx = invocation.args.iter().position(|a| a == "-oX")?;
    invocation.args.get(idx + 1).map(PathBuf::from)
}

/// Records everything it is told.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub stages: Mutex<Vec<Stage>>,
    pub warnings: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn stage(&self, stage: Stage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn info(&self, _msg: &str) {}

    fn success(&self, _msg: &str) {}

    fn warn(&self, msg: &str) {
        self.warnings.lock().unwrap().push(msg.to_string());
    }

    fn error(&self, msg: &str) {
        self.errors.lock().unwrap().push(msg.to_string());
    }
}

pub const TWO_HOST_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<?xml-stylesheet href="file:///usr/share/nmap/nmap.xsl" type="text/xsl"?>
<nmaprun scanner="nmap" args="nmap -oX out.xml 10.0.0.0/30" version="7.94">
<host starttime="1" endtime="2"><status state="up" reason="arp-response"/>
<address addr="10.0.0.1" addrtype="ipv4"/>
<address addr="AA:BB:CC:DD:EE:FF" addrtype="mac" vendor="Acme"/>
<hostnames>
<hostname name="router" type="PTR"/>
</hostnames>
</host>
<host starttime="1" endtime="2"><status state="up" reason="arp-response"/>
<address addr="10.0.0.2" addrtype="ipv4"/>
<hostnames>
</hostnames>
</host>
<runstats><finished time="2" exit="success"/><hosts up="2" down="2" total="4"/></runstats>
</nmaprun>
"#;
