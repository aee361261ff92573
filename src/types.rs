// src/types.rs

use std::fmt;
use std::path::Path;

/// Path to a test artifact, as reported by one discovery peer.
///
/// The value is already decoded and trimmed. It may be empty when a peer
/// connected and closed without writing anything; such an identifier never
/// resolves to an existing file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the identifier names an existing filesystem entry.
    ///
    /// Lookup errors (e.g. permission denied on a parent) count as missing.
    pub async fn exists(&self) -> bool {
        !self.is_empty() && tokio::fs::try_exists(self.as_path()).await.unwrap_or(false)
    }

    /// Case-sensitive suffix test (e.g. `".dll"`).
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.0.ends_with(suffix)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which build invocation feeds the discovery channel.
///
/// - `BuildAndDiscover`: compile, then report test projects.
/// - `DiscoverOnly`: artifacts already exist (`--no-build`); only report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    BuildAndDiscover,
    DiscoverOnly,
}

impl TriggerMode {
    pub fn from_no_build(no_build: bool) -> Self {
        if no_build {
            TriggerMode::DiscoverOnly
        } else {
            TriggerMode::BuildAndDiscover
        }
    }

    /// MSBuild target list for this mode.
    pub fn targets(self) -> &'static str {
        match self {
            TriggerMode::BuildAndDiscover => "Build;_GetTestsProject",
            TriggerMode::DiscoverOnly => "_GetTestsProject",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_id_is_trimmed() {
        let id = ModuleId::new("  /build/out/MyTests.dll\r\n");
        assert_eq!(id.as_str(), "/build/out/MyTests.dll");
    }

    #[tokio::test]
    async fn empty_module_id_never_exists() {
        let id = ModuleId::new(" \n");
        assert!(id.is_empty());
        assert!(!id.exists().await);
    }

    #[tokio::test]
    async fn existing_file_is_found_without_blocking_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("MyTests.dll");
        std::fs::write(&file, b"").unwrap();

        assert!(ModuleId::new(file.display().to_string()).exists().await);
        assert!(!ModuleId::new(dir.path().join("missing.dll").display().to_string()).exists().await);
    }

    #[test]
    fn suffix_match_is_case_sensitive() {
        assert!(ModuleId::new("/out/Tests.dll").has_suffix(".dll"));
        assert!(!ModuleId::new("/out/Tests.DLL").has_suffix(".dll"));
        assert!(!ModuleId::new("/out/tests").has_suffix(".dll"));
    }

    #[test]
    fn trigger_mode_targets() {
        assert_eq!(TriggerMode::from_no_build(false).targets(), "Build;_GetTestsProject");
        assert_eq!(TriggerMode::from_no_build(true).targets(), "_GetTestsProject");
    }
}
