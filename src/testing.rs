//! Fakes for the external collaborators, shared by unit tests

use crate::context::BuildContext;
use crate::error::{NodepackError, NodepackResult};
use crate::process::{CommandOutput, CommandRunner, Invocation};
use crate::toolchain::{ArchiveFetcher, ToolchainLocations};
use crate::version::{Target, VersionSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// npm version reported when a test does not override it
pub const DEFAULT_NPM_VERSION: &str = "1.4.3";

/// Ruby version reported when a test does not override it
pub const DEFAULT_RUBY_VERSION: &str = "2.0.0";

/// A temporary build dir, cache dir and export file
pub struct Fixture {
    pub temp: TempDir,
    pub ctx: BuildContext,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build");
        std::fs::create_dir(&build).unwrap();
        let ctx = BuildContext::new(
            build,
            temp.path().join("cache"),
            None,
            temp.path().join("buildpack").join("export"),
        )
        .unwrap();
        Self { temp, ctx }
    }

    /// Locations as if node had been installed
    pub fn toolchain(&self) -> ToolchainLocations {
        ToolchainLocations::new(self.ctx.toolchain_home(), &self.ctx.build_dir)
    }

    pub fn write_manifest(&self, json: &str) {
        self.write_build_file("package.json", json);
    }

    pub fn write_build_file(&self, name: &str, content: &str) {
        let path = self.ctx.build_dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Create `node_modules/<name>` in the build tree
    pub fn install_module(&self, name: &str) {
        write_module(&self.ctx.modules_dir(), name);
    }

    /// Create `node/node_modules/<name>` in the cache
    pub fn cache_module(&self, name: &str) {
        write_module(&self.ctx.node_cache().join("node_modules"), name);
    }
}

fn write_module(modules: &Path, name: &str) {
    let dir = modules.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("package.json"),
        format!("{{\"name\": \"{}\"}}", name),
    )
    .unwrap();
}

/// Names of the top-level modules in a `node_modules` dir
pub fn module_names(modules: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(modules) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| !n.starts_with('.'))
        .collect();
    names.sort();
    names
}

/// Version source answering from a fixed table
#[derive(Default)]
pub struct FakeVersions {
    answers: HashMap<(Target, String), String>,
    queries: Mutex<Vec<(Target, String)>>,
}

impl FakeVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: Target, spec: &str, answer: &str) -> Self {
        self.answers
            .insert((target, spec.to_string()), answer.to_string());
        self
    }

    pub fn queries(&self) -> Vec<(Target, String)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VersionSource for FakeVersions {
    async fn resolve(&self, target: Target, spec: &str) -> NodepackResult<String> {
        self.queries
            .lock()
            .unwrap()
            .push((target, spec.to_string()));
        self.answers
            .get(&(target, spec.to_string()))
            .cloned()
            .ok_or_else(|| NodepackError::resolution(target.to_string(), spec, "no fake answer"))
    }
}

/// Archive fetcher that lays out a fake node distribution
pub struct FakeArchives {
    fail: bool,
    urls: Mutex<Vec<String>>,
}

impl FakeArchives {
    pub fn node() -> Self {
        Self {
            fail: false,
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveFetcher for FakeArchives {
    async fn fetch_and_extract(&self, url: &str, dest: &Path) -> NodepackResult<()> {
        self.urls.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(NodepackError::Fetch {
                url: url.to_string(),
                reason: "HTTP 404".to_string(),
            });
        }

        let stem = url
            .rsplit('/')
            .next()
            .and_then(|name| name.strip_suffix(".tar.gz"))
            .unwrap_or("node");
        let bin = dest.join(stem).join("bin");
        std::fs::create_dir_all(&bin).map_err(|e| NodepackError::io("fake archive", e))?;
        for tool in ["node", "npm"] {
            std::fs::write(bin.join(tool), "#!/bin/sh\n")
                .map_err(|e| NodepackError::io("fake archive", e))?;
        }
        Ok(())
    }
}

/// Command runner that records invocations and emulates the side effects
/// of npm and gem on the filesystem
#[derive(Default)]
pub struct RecordingRunner {
    stdout: Vec<(String, String)>,
    failures: Vec<(String, i32)>,
    calls: Mutex<Vec<Invocation>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer invocations matching `key` (program name or any argument)
    pub fn with_stdout(mut self, key: &str, stdout: &str) -> Self {
        self.stdout.push((key.to_string(), stdout.to_string()));
        self
    }

    /// Exit with `code` for invocations matching `key`
    pub fn failing(mut self, key: &str, code: i32) -> Self {
        self.failures.push((key.to_string(), code));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded command lines, e.g. `npm install --quiet ...`
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(Invocation::display).collect()
    }

    fn matches(invocation: &Invocation, key: &str) -> bool {
        program_name(invocation) == key || invocation.args.iter().any(|a| a == key)
    }

    fn answer(&self, invocation: &Invocation) -> String {
        if let Some((_, stdout)) = self
            .stdout
            .iter()
            .find(|(key, _)| Self::matches(invocation, key))
        {
            return stdout.clone();
        }
        match program_name(invocation).as_str() {
            "npm" if invocation.args.iter().any(|a| a == "--version") => {
                DEFAULT_NPM_VERSION.to_string()
            }
            "ruby" => DEFAULT_RUBY_VERSION.to_string(),
            _ => String::new(),
        }
    }
}

fn program_name(invocation: &Invocation) -> String {
    Path::new(&invocation.program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> NodepackResult<CommandOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        if let Some((_, code)) = self
            .failures
            .iter()
            .find(|(key, _)| Self::matches(invocation, key))
        {
            return Ok(CommandOutput {
                code: Some(*code),
                stdout: String::new(),
                stderr: format!("{} failed", invocation.display()),
            });
        }

        match program_name(invocation).as_str() {
            "npm" => emulate_npm(invocation),
            "gem" => emulate_gem(invocation),
            _ => {}
        }

        Ok(CommandOutput::success(self.answer(invocation)))
    }
}

/// `npm install` adds missing declared modules, `npm prune` drops
/// undeclared ones
fn emulate_npm(invocation: &Invocation) {
    let args = &invocation.args;
    if args.iter().any(|a| a == "-g") {
        return;
    }
    let Some(command) = args.first() else {
        return;
    };
    let production = args.iter().any(|a| a == "--production");
    let declared = declared_packages(&invocation.cwd.join("package.json"), production);
    let modules: PathBuf = invocation.cwd.join("node_modules");

    match command.as_str() {
        "install" => {
            for name in &declared {
                if !modules.join(name).exists() {
                    write_module(&modules, name);
                }
            }
        }
        "prune" => {
            for name in module_names(&modules) {
                if !declared.contains(&name) {
                    std::fs::remove_dir_all(modules.join(&name)).unwrap();
                }
            }
        }
        _ => {}
    }
}

/// Names under `dependencies`, plus `devDependencies` outside production
fn declared_packages(manifest: &Path, production: bool) -> Vec<String> {
    let manifest: serde_json::Value = std::fs::read_to_string(manifest)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default();
    let mut sections = vec!["dependencies"];
    if !production {
        sections.push("devDependencies");
    }
    let mut names: Vec<String> = sections
        .into_iter()
        .filter_map(|section| manifest.get(section).and_then(|v| v.as_object()))
        .flat_map(|deps| deps.keys().cloned())
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// `gem install <name>` creates the gem and its executable under GEM_HOME
fn emulate_gem(invocation: &Invocation) {
    let Some(gem_home) = invocation.env.get("GEM_HOME") else {
        return;
    };
    if invocation.args.first().map(String::as_str) != Some("install") {
        return;
    }
    let Some(name) = invocation.args.get(1) else {
        return;
    };
    let home = Path::new(gem_home);
    std::fs::create_dir_all(home.join("gems").join(name)).unwrap();
    std::fs::create_dir_all(home.join("bin")).unwrap();
    std::fs::write(home.join("bin").join(name), "#!/bin/sh\n").unwrap();
}
