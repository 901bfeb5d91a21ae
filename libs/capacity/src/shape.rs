//! Machine shapes as they arrive from the install configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The provisioning role a group of machines belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    ControlPlane,
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ControlPlane => "control-plane",
            Role::Worker => "worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processor count in its wire form: an integer or a decimal string.
///
/// Both forms resolve to the same `f64`, so `2` and `"2"` are equivalent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessorCount {
    Int(i64),
    Str(String),
}

impl ProcessorCount {
    /// Resolve to a floating processor count.
    ///
    /// Returns `None` when the string form is not a finite number.
    pub fn resolve(&self) -> Option<f64> {
        match self {
            ProcessorCount::Int(v) => Some(*v as f64),
            ProcessorCount::Str(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    /// The raw value, for error messages.
    pub fn raw(&self) -> String {
        match self {
            ProcessorCount::Int(v) => v.to_string(),
            ProcessorCount::Str(s) => s.clone(),
        }
    }
}

impl From<i64> for ProcessorCount {
    fn from(v: i64) -> Self {
        ProcessorCount::Int(v)
    }
}

impl From<&str> for ProcessorCount {
    fn from(s: &str) -> Self {
        ProcessorCount::Str(s.to_string())
    }
}

impl From<String> for ProcessorCount {
    fn from(s: String) -> Self {
        ProcessorCount::Str(s)
    }
}

/// Shape of a single machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineShape {
    /// Host class the machine must run on (e.g. `s922`, `e980`).
    pub system_type: String,

    /// Processor allocation policy tag. Validated during classification,
    /// so an unknown tag surfaces as a capacity error rather than a parse
    /// error.
    pub processor_type: String,

    pub processors: ProcessorCount,

    pub memory_gib: i64,
}

impl MachineShape {
    pub fn new(
        system_type: impl Into<String>,
        processor_type: impl Into<String>,
        processors: impl Into<ProcessorCount>,
        memory_gib: i64,
    ) -> Self {
        Self {
            system_type: system_type.into(),
            processor_type: processor_type.into(),
            processors: processors.into(),
            memory_gib,
        }
    }
}

/// A templated set of worker machines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSet {
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_replicas")]
    pub replicas: u32,

    pub template: MachineShape,
}

fn default_replicas() -> u32 {
    1
}

impl WorkerSet {
    pub fn new(name: impl Into<String>, replicas: u32, template: MachineShape) -> Self {
        Self {
            name: name.into(),
            replicas,
            template,
        }
    }
}
