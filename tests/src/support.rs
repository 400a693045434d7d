use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scanmap_common::config::Config;
use scanmap_common::platform::Platform;
use scanmap_core::locator::{Locator, PathLookup};
use scanmap_core::pipeline::PipelineController;
use scanmap_core::process::{CommandOutput, CommandRunner, Environment, Invocation};
use tempfile::TempDir;

pub const TWO_HOST_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" args="nmap -oX scan.xml 10.0.0.0/30" start="1700000000"
 version="7.94" xmloutputversion="1.05">
<host starttime="1700000001" endtime="1700000002">
<status state="up" reason="arp-response" reason_ttl="0"/>
<address addr="10.0.0.1" addrtype="ipv4"/>
<address addr="52:54:00:12:34:56" addrtype="mac" vendor="QEMU virtual NIC"/>
<hostnames>
<hostname name="router" type="PTR"/>
</hostnames>
</host>
<host starttime="1700000001" endtime="1700000002">
<status state="up" reason="arp-response" reason_ttl="0"/>
<address addr="10.0.0.2" addrtype="ipv4"/>
<hostnames>
</hostnames>
</host>
<runstats>
<finished time="1700000003" timestr="Tue Nov 14 22:13:23 2023" elapsed="2.10" exit="success"/>
<hosts up="2" down="2" total="4"/>
</runstats>
</nmaprun>
"#;

/// Plays the part of nmap and the package managers.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    pub scanner_present: bool,
    pub install_succeeds: bool,
    pub report: Option<&'static str>,
    pub(crate) calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn scans(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|inv| inv.args.iter().any(|a| a == "-oX"))
            .collect()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls()
            .iter()
            .filter(|inv| stem(&inv.program) == program)
            .count()
    }
}

fn stem(program: &OsStr) -> String {
    Path::new(program)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        match stem(&invocation.program).as_str() {
            "nmap" => {
                let args = &invocation.args;
                match args.iter().position(|a| a == "-oX") {
                    Some(idx) => {
                        if let (Some(report), Some(path)) = (self.report, args.get(idx + 1)) {
                            std::fs::write(path, report)?;
                        }
                        Ok(CommandOutput::ok("Nmap done: 4 IP addresses (2 hosts up)"))
                    }
                    None if self.scanner_present => Ok(CommandOutput::ok("Nmap version 7.94")),
                    None => Err(io::ErrorKind::NotFound.into()),
                }
            }
            "sudo" | "apt-get" if self.install_succeeds => {
                Ok(CommandOutput::ok("Setting up nmap (7.94)"))
            }
            "sudo" | "apt-get" => {
                Ok(CommandOutput::failed(100, "E: Unable to locate package nmap"))
            }
            _ => Err(io::ErrorKind::NotFound.into()),
        }
    }
}

#[derive(Debug)]
struct EmptyPath;

impl PathLookup for EmptyPath {
    fn lookup(&self, _tool: &str, _env: &Environment) -> Option<PathBuf> {
        None
    }
}

/// A workspace with a fake `nmap` at a well-known location.
pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
    pub scanner: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let scanner = dir.path().join("bin").join("nmap");
        std::fs::create_dir_all(scanner.parent().unwrap()).unwrap();
        std::fs::write(&scanner, b"").unwrap();

        let mut config = Config::default();
        config.report.dir = dir.path().join("reports");
        config.output.path = dir.path().join("network_visualization.html");

        Self { dir, config, scanner }
    }

    pub fn artifact(&self) -> &Path {
        &self.config.output.path
    }

    pub fn controller(&self, runner: Arc<ScriptedRunner>) -> PipelineController {
        PipelineController::builder(self.config.clone())
            .platform(Platform::Unix)
            .runner(runner)
            .locator(Locator::new(vec![self.scanner.clone()], Box::new(EmptyPath)))
            .build()
    }
}
