use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::layout_engine::Direction;

const DEFAULT_CONFIG: &str = include_str!("../../lattice.default.toml");

pub fn config_file() -> PathBuf { dirs::home_dir().unwrap_or_default().join(".lattice.toml") }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub workspaces: WorkspaceSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Proxies wrapped around every engine, outermost first.
    #[serde(default = "default_proxies")]
    pub proxies: Vec<ProxyKind>,
    #[serde(default)]
    pub gaps: GapSettings,
    #[serde(default)]
    pub bar: BarSettings,
    /// The engine rotation of every workspace, in order.
    #[serde(default = "default_engines")]
    pub engines: Vec<EngineSettings>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            proxies: default_proxies(),
            gaps: GapSettings::default(),
            bar: BarSettings::default(),
            engines: default_engines(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    /// Space between the working area edge and the windows, in unscaled pixels.
    #[serde(default = "default_outer_gap")]
    pub outer_gap: i32,
    /// Space around each window, in unscaled pixels.
    #[serde(default = "default_inner_gap")]
    pub inner_gap: i32,
}

impl Default for GapSettings {
    fn default() -> Self {
        Self {
            outer_gap: default_outer_gap(),
            inner_gap: default_inner_gap(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct BarSettings {
    #[serde(default = "default_bar_height")]
    pub height: i32,
}

impl Default for BarSettings {
    fn default() -> Self { Self { height: default_bar_height() } }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProxyKind {
    Floating,
    Bar,
    Gaps,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Column,
    Tree,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct EngineSettings {
    pub kind: EngineKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Column engine only.
    #[serde(default = "yes")]
    pub left_to_right: bool,
    /// Tree engine only: where new windows go relative to the focused one.
    #[serde(default = "default_add_direction")]
    pub add_direction: Direction,
}

impl EngineSettings {
    pub fn new(kind: EngineKind) -> Self {
        Self {
            kind,
            name: None,
            left_to_right: true,
            add_direction: default_add_direction(),
        }
    }

    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match self.kind {
            EngineKind::Column if self.left_to_right => "Column".to_string(),
            EngineKind::Column => "Column (right to left)".to_string(),
            EngineKind::Tree => "Tree".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    #[serde(default = "default_workspace_names")]
    pub names: Vec<String>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self { Self { names: default_workspace_names() } }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.gaps.validate());
        issues.extend(self.bar.validate());

        if self.engines.is_empty() {
            issues.push("at least one layout engine must be configured".to_string());
        }
        let mut names: Vec<String> = self.engines.iter().map(EngineSettings::display_name).collect();
        names.sort();
        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                issues.push(format!("duplicate layout engine name '{}'", pair[0]));
            }
        }

        for (i, proxy) in self.proxies.iter().enumerate() {
            if self.proxies[..i].contains(proxy) {
                issues.push(format!("proxy {proxy:?} is listed more than once"));
            }
        }
        if self.proxies.iter().skip(1).any(|p| *p == ProxyKind::Floating) {
            issues.push("the floating proxy must be listed first".to_string());
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = self.gaps.auto_fix_values() + self.bar.auto_fix_values();

        if self.engines.is_empty() {
            self.engines = default_engines();
            fixes += 1;
        }

        let before = self.proxies.len();
        let mut seen = Vec::new();
        self.proxies.retain(|p| {
            if seen.contains(p) {
                false
            } else {
                seen.push(*p);
                true
            }
        });
        fixes += before - self.proxies.len();

        if let Some(index) = self.proxies.iter().position(|p| *p == ProxyKind::Floating) {
            if index > 0 {
                self.proxies[..=index].rotate_right(1);
                fixes += 1;
            }
        }

        fixes
    }
}

impl GapSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.outer_gap < 0 {
            issues.push(format!("outer_gap must be non-negative, got {}", self.outer_gap));
        }
        if self.inner_gap < 0 {
            issues.push(format!("inner_gap must be non-negative, got {}", self.inner_gap));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.outer_gap < 0 {
            self.outer_gap = 0;
            fixes += 1;
        }
        if self.inner_gap < 0 {
            self.inner_gap = 0;
            fixes += 1;
        }

        fixes
    }
}

impl BarSettings {
    pub fn validate(&self) -> Vec<String> {
        if self.height < 0 {
            vec![format!("bar height must be non-negative, got {}", self.height)]
        } else {
            Vec::new()
        }
    }

    pub fn auto_fix_values(&mut self) -> usize {
        if self.height < 0 {
            self.height = default_bar_height();
            1
        } else {
            0
        }
    }
}

impl WorkspaceSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.names.is_empty() {
            issues.push("at least one workspace name must be configured".to_string());
        }
        if self.names.iter().any(|n| n.trim().is_empty()) {
            issues.push("workspace names must not be blank".to_string());
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        let before = self.names.len();
        self.names.retain(|n| !n.trim().is_empty());
        fixes += before - self.names.len();

        if self.names.is_empty() {
            self.names = default_workspace_names();
            fixes += 1;
        }

        fixes
    }
}

fn yes() -> bool { true }

fn default_outer_gap() -> i32 { 10 }

fn default_inner_gap() -> i32 { 5 }

fn default_bar_height() -> i32 { 30 }

fn default_add_direction() -> Direction { Direction::Right }

fn default_proxies() -> Vec<ProxyKind> { vec![ProxyKind::Floating, ProxyKind::Bar, ProxyKind::Gaps] }

fn default_engines() -> Vec<EngineSettings> {
    vec![EngineSettings::new(EngineKind::Tree), EngineSettings::new(EngineKind::Column)]
}

fn default_workspace_names() -> Vec<String> { (1..=4).map(|i| i.to_string()).collect() }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&buf).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// The configuration shipped with lattice.
    pub fn builtin() -> anyhow::Result<Config> { Self::parse(DEFAULT_CONFIG) }

    /// Reads `path`, falling back to the built-in configuration when the file
    /// does not exist.
    pub fn read_or_builtin(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Self::builtin() }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())
            .with_context(|| format!("writing config file {}", path.display()))?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.layout.validate());
        issues.extend(self.workspaces.validate());

        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        self.layout.auto_fix_values() + self.workspaces.auto_fix_values()
    }

    fn parse(buf: &str) -> anyhow::Result<Config> { Ok(toml::from_str(buf)?) }
}
