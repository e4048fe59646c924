//! The credential payload transferred to a device.

use std::fmt;

use crate::protocol::messages::FieldLabel;

/// The three fields sent to a device during provisioning.
///
/// Constructed once at startup and shared read-only for the lifetime of the
/// process. The `Debug` implementation never reveals the password value,
/// only its length – payloads routinely end up in log output.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPayload {
    ssid: String,
    password: String,
    ip: String,
}

impl CredentialPayload {
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
            ip: ip.into(),
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// The value belonging to a wire label, used to drive the fixed-order
    /// transmission loop.
    pub fn field(&self, label: FieldLabel) -> &str {
        match label {
            FieldLabel::Ssid => &self.ssid,
            FieldLabel::Password => &self.password,
            FieldLabel::Ip => &self.ip,
        }
    }
}

impl fmt::Debug for CredentialPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPayload")
            .field("ssid", &self.ssid)
            .field("password", &format_args!("<redacted, {} chars>", self.password.chars().count()))
            .field("ip", &self.ip)
            .finish()
    }
}
