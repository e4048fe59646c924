//! WiFi credential source: the host's own wpa_supplicant configuration.
//!
//! The provisioning host forwards the network it is itself connected to, so
//! the credentials are read from `wpa_supplicant.conf`:
//!
//! ```text
//! network={
//!     ssid="HomeNetwork"
//!     psk="hunter2abc"
//! }
//! ```
//!
//! Credentials are a precondition, not a retryable condition – any failure
//! here is fatal at startup. The protocol core never sees this module; it
//! receives a validated payload and is agnostic to where it came from.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for credential retrieval. All variants are fatal.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// The wpa_supplicant file could not be read.
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file holds no `ssid=` entry.
    #[error("no ssid entry found in {path}")]
    MissingSsid { path: PathBuf },
    /// The file holds no `psk=` entry.
    #[error("no psk entry found in {path}")]
    MissingPsk { path: PathBuf },
}

/// Extracts the WiFi SSID and passphrase from a wpa_supplicant config.
///
/// Lines are matched by the `ssid=` / `psk=` prefix after trimming, with
/// surrounding quotes stripped; when several networks are configured the
/// first of each wins. Comments and unrelated keys (`scan_ssid=…`) are
/// ignored.
///
/// # Errors
///
/// Returns [`CredentialsError`] when the file is unreadable or either field
/// is absent – the caller treats every case as fatal.
pub fn load_wifi_credentials(path: &Path) -> Result<(String, String), CredentialsError> {
    let content = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut ssid = None;
    let mut psk = None;
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some(value) = line.strip_prefix("ssid=") {
            ssid.get_or_insert_with(|| unquote(value).to_string());
        } else if let Some(value) = line.strip_prefix("psk=") {
            psk.get_or_insert_with(|| unquote(value).to_string());
        }
    }

    let ssid = ssid.ok_or_else(|| CredentialsError::MissingSsid {
        path: path.to_path_buf(),
    })?;
    let psk = psk.ok_or_else(|| CredentialsError::MissingPsk {
        path: path.to_path_buf(),
    })?;
    Ok((ssid, psk))
}

/// Strips one pair of surrounding double quotes, if present.
fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("blewifi_cred_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parses_quoted_ssid_and_psk() {
        // Arrange
        let path = write_temp(
            "ok.conf",
            r#"
ctrl_interface=DIR=/var/run/wpa_supplicant GROUP=netdev
update_config=1
country=DE

network={
    ssid="HomeNetwork"
    scan_ssid=1
    psk="hunter2abc"
    key_mgmt=WPA-PSK
}
"#,
        );

        // Act
        let (ssid, psk) = load_wifi_credentials(&path).expect("parse");

        // Assert – scan_ssid is not mistaken for the ssid entry
        assert_eq!(ssid, "HomeNetwork");
        assert_eq!(psk, "hunter2abc");
    }

    #[test]
    fn test_unquoted_values_pass_through() {
        let path = write_temp("raw.conf", "ssid=plain\npsk=0123456789abcdef\n");
        let (ssid, psk) = load_wifi_credentials(&path).unwrap();
        assert_eq!(ssid, "plain");
        assert_eq!(psk, "0123456789abcdef");
    }

    #[test]
    fn test_first_network_wins_when_several_are_configured() {
        let path = write_temp(
            "multi.conf",
            "network={\n ssid=\"first\"\n psk=\"pw-one\"\n}\nnetwork={\n ssid=\"second\"\n psk=\"pw-two\"\n}\n",
        );
        let (ssid, psk) = load_wifi_credentials(&path).unwrap();
        assert_eq!(ssid, "first");
        assert_eq!(psk, "pw-one");
    }

    #[test]
    fn test_comment_lines_are_ignored() {
        let path = write_temp("comment.conf", "# ssid=\"nope\"\nssid=\"real\"\npsk=\"pw\"\n");
        let (ssid, _) = load_wifi_credentials(&path).unwrap();
        assert_eq!(ssid, "real");
    }

    #[test]
    fn test_missing_psk_is_reported() {
        let path = write_temp("nopsk.conf", "ssid=\"lonely\"\n");
        let result = load_wifi_credentials(&path);
        assert!(matches!(result, Err(CredentialsError::MissingPsk { .. })));
    }

    #[test]
    fn test_unreadable_file_is_reported() {
        let result = load_wifi_credentials(Path::new("/nonexistent/wpa_supplicant.conf"));
        assert!(matches!(result, Err(CredentialsError::Io { .. })));
    }
}
