use serde::{Deserialize, Serialize};
use std::fmt;

pub const GO_PREFIX: &str = "go://";
pub const NPM_PREFIX: &str = "npm://";
pub const GAV_PREFIX: &str = "gav://";
pub const NUGET_PREFIX: &str = "nuget://";
pub const PYPI_PREFIX: &str = "pypi://";

/// Package managers whose dependency graphs artiflow can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    Go,
    Npm,
    Maven,
    Gradle,
    Nuget,
    Pip,
    Pipenv,
    Poetry,
}

impl Technology {
    pub const ALL: [Technology; 8] = [
        Self::Go,
        Self::Npm,
        Self::Maven,
        Self::Gradle,
        Self::Nuget,
        Self::Pip,
        Self::Pipenv,
        Self::Poetry,
    ];

    /// Parse a technology name, ignoring case. `dotnet` is accepted for NuGet.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "go" | "golang" => Some(Self::Go),
            "npm" => Some(Self::Npm),
            "maven" | "mvn" => Some(Self::Maven),
            "gradle" => Some(Self::Gradle),
            "nuget" | "dotnet" => Some(Self::Nuget),
            "pip" => Some(Self::Pip),
            "pipenv" => Some(Self::Pipenv),
            "poetry" => Some(Self::Poetry),
            _ => None,
        }
    }

    /// Lowercase identifier, as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Npm => "npm",
            Self::Maven => "maven",
            Self::Gradle => "gradle",
            Self::Nuget => "nuget",
            Self::Pip => "pip",
            Self::Pipenv => "pipenv",
            Self::Poetry => "poetry",
        }
    }

    /// Display name used to tag scan results.
    pub fn formal_name(&self) -> &'static str {
        match self {
            Self::Go => "Go",
            Self::Npm => "npm",
            Self::Maven => "Maven",
            Self::Gradle => "Gradle",
            Self::Nuget => "NuGet",
            Self::Pip => "pip",
            Self::Pipenv => "Pipenv",
            Self::Poetry => "Poetry",
        }
    }

    /// Component id prefix Xray expects for this ecosystem.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Go => GO_PREFIX,
            Self::Npm => NPM_PREFIX,
            Self::Maven | Self::Gradle => GAV_PREFIX,
            Self::Nuget => NUGET_PREFIX,
            Self::Pip | Self::Pipenv | Self::Poetry => PYPI_PREFIX,
        }
    }

    /// Returns `true` for the Python tools, which share one tree builder.
    pub fn is_python(&self) -> bool {
        matches!(self, Self::Pip | Self::Pipenv | Self::Poetry)
    }

    /// Prefix a raw coordinate with this technology's id prefix.
    pub fn component_id(&self, coordinate: &str) -> String {
        format!("{}{coordinate}", self.id_prefix())
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
