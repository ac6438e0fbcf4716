use serde::{Deserialize, Serialize};

/// Audio-server connection state machine.
///
/// ```text
/// unconnected → connecting → authorizing → setting-name → ready
///                   ↓             ↓              ↓          ↓
///                   └─────────────┴──── failed / terminated ┘
/// ```
///
/// Every transition after the initial connect call comes from a server
/// notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionState {
    Unconnected,
    Connecting,
    Authorizing,
    SettingName,
    Ready,
    Failed,
    Terminated,
}

impl ConnectionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// `Failed` and `Terminated` end the connection for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Terminated)
    }
}

/// Capture stream state, one instance per recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    Uninitialized,
    Creating,
    Ready,
    Failed,
    Terminated,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Terminated)
    }
}

/// Recording session state machine.
///
/// ```text
/// idle → starting → recording → stopping → idle
///           ↓           ↓
///           └── idle (stream failure) ┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Starting,
    Recording,
    Stopping,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    /// A stream exists in every state but `Idle`.
    pub fn is_active(&self) -> bool {
        !self.is_idle()
    }
}
