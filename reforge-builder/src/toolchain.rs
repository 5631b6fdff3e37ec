//! Toolchain discovery and validation: resolving `cc` and `strip` from the profile, recording
//! their absolute paths and reported versions.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

use crate::receipt::ToolchainIdentity;

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("toolchain tool `{0}` was not found on PATH")]
    NotFound(String),
    #[error("failed to run `{tool} --version`")]
    VersionCheck {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Locates `tool` on `PATH`, the way a shell's `command -v` would.
fn resolve_on_path(tool: &str) -> Option<PathBuf> {
    if tool.contains('/') {
        let path = PathBuf::from(tool);
        return path.is_file().then_some(path);
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
}

fn version_string(path: &PathBuf, tool: &str) -> Result<String, ToolchainError> {
    let output = Command::new(path)
        .arg("--version")
        .output()
        .map_err(|source| ToolchainError::VersionCheck {
            tool: tool.to_string(),
            source,
        })?;
    let text = String::from_utf8_lossy(&output.stdout);
    Ok(text.lines().next().unwrap_or_default().trim().to_string())
}

/// Resolves the compiler and strip tool named by the profile and records their identity. A
/// missing tool is a hard failure for the whole job, reported before any cell runs.
pub fn discover(compiler: &str, strip_tool: &str) -> Result<ToolchainIdentity, ToolchainError> {
    let compiler_path =
        resolve_on_path(compiler).ok_or_else(|| ToolchainError::NotFound(compiler.to_string()))?;
    let strip_tool_path = resolve_on_path(strip_tool)
        .ok_or_else(|| ToolchainError::NotFound(strip_tool.to_string()))?;

    let compiler_version = version_string(&compiler_path, compiler)?;
    let strip_tool_version = version_string(&strip_tool_path, strip_tool)?;

    Ok(ToolchainIdentity {
        compiler_path: compiler_path.display().to_string(),
        compiler_version,
        strip_tool_path: strip_tool_path.display().to_string(),
        strip_tool_version,
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_tool_that_exists_on_path() {
        assert!(resolve_on_path("ls").is_some());
    }

    #[test]
    fn missing_tool_resolves_to_none() {
        assert!(resolve_on_path("reforge-nonexistent-tool-xyz").is_none());
    }

    #[test]
    fn discover_fails_for_a_missing_compiler() {
        let result = discover("reforge-nonexistent-cc-xyz", "strip");
        assert!(matches!(result, Err(ToolchainError::NotFound(_))));
    }
}
