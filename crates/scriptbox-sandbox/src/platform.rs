//! Platform detection and availability checking.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Supported sandbox platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux using nsjail.
    Linux,
    /// Unsupported platform (fallback execution only).
    Unsupported,
}

impl Platform {
    /// Detect the current platform.
    pub fn detect() -> Self {
        #[cfg(target_os = "linux")]
        {
            Platform::Linux
        }

        #[cfg(not(target_os = "linux"))]
        {
            Platform::Unsupported
        }
    }

    /// Get the display name for this platform.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::Unsupported => "Unsupported",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Status of isolation tool availability.
#[derive(Debug, Clone)]
pub enum IsolationStatus {
    /// Isolation tool found and ready to use.
    Available { tool: PathBuf },

    /// Isolation tool is missing.
    MissingTool { tool: PathBuf, install_hint: String },

    /// Platform is not supported.
    Unsupported { platform_name: String },
}

impl IsolationStatus {
    /// Check if isolated execution is possible.
    pub fn is_available(&self) -> bool {
        matches!(self, IsolationStatus::Available { .. })
    }

    /// Get the install hint if the tool is missing.
    pub fn install_hint(&self) -> Option<&str> {
        match self {
            IsolationStatus::MissingTool { install_hint, .. } => Some(install_hint),
            _ => None,
        }
    }

    /// Detect whether `tool` can be used on the current platform.
    pub fn detect(tool: &Path) -> Self {
        match Platform::detect() {
            Platform::Linux => Self::check_linux(tool),
            Platform::Unsupported => IsolationStatus::Unsupported {
                platform_name: std::env::consts::OS.to_string(),
            },
        }
    }

    fn check_linux(tool: &Path) -> Self {
        if binary_exists(tool) {
            IsolationStatus::Available {
                tool: tool.to_path_buf(),
            }
        } else {
            IsolationStatus::MissingTool {
                tool: tool.to_path_buf(),
                install_hint: format!(
                    "Scripts will run WITHOUT resource isolation until {tool} is installed.\n\
                     Build it from https://github.com/google/nsjail or install a package:\n\
                     \n\
                       Debian/Ubuntu: sudo apt-get install nsjail\n\
                       Arch:          yay -S nsjail\n\
                     \n\
                     Set `sandbox.isolation_tool` if it lives outside PATH.",
                    tool = tool.display()
                ),
            }
        }
    }
}

impl fmt::Display for IsolationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationStatus::Available { tool } => {
                write!(f, "Isolation available ({})", tool.display())
            }
            IsolationStatus::MissingTool { tool, install_hint } => {
                write!(
                    f,
                    "Isolation unavailable: {} not found\n\n{install_hint}",
                    tool.display()
                )
            }
            IsolationStatus::Unsupported { platform_name } => {
                write!(f, "Isolation not supported on {platform_name}")
            }
        }
    }
}

/// Check whether a binary exists, either at an explicit path or on `PATH`.
pub fn binary_exists(binary: &Path) -> bool {
    if binary.components().count() > 1 {
        return binary.is_file();
    }

    Command::new("which")
        .arg(binary)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detect() {
        let platform = Platform::detect();

        #[cfg(target_os = "linux")]
        assert_eq!(platform, Platform::Linux);

        #[cfg(not(target_os = "linux"))]
        assert_eq!(platform, Platform::Unsupported);
    }

    #[test]
    fn test_platform_name() {
        assert_eq!(Platform::Linux.name(), "Linux");
        assert_eq!(Platform::Unsupported.name(), "Unsupported");
    }

    #[test]
    fn test_missing_tool_detected() {
        let status = IsolationStatus::detect(Path::new("/nonexistent/bin/nsjail"));
        assert!(!status.is_available());

        #[cfg(target_os = "linux")]
        assert!(status.install_hint().is_some());
    }

    #[test]
    fn test_binary_exists_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("fake-tool");
        assert!(!binary_exists(&tool));

        std::fs::write(&tool, "").unwrap();
        assert!(binary_exists(&tool));
    }

    #[test]
    fn test_isolation_status_display() {
        let available = IsolationStatus::Available {
            tool: PathBuf::from("nsjail"),
        };
        assert!(available.to_string().contains("available"));

        let missing = IsolationStatus::MissingTool {
            tool: PathBuf::from("nsjail"),
            install_hint: "Install nsjail".to_string(),
        };
        assert!(missing.to_string().contains("unavailable"));
        assert!(missing.to_string().contains("Install nsjail"));
    }
}
