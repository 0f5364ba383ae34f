// SSH launcher: remote script execution and target-side filesystem access

use crate::config::SshConfig;
use crate::errors::RunnerError;
use crate::launcher::{ScriptKind, ScriptLauncher};
use serde::{Deserialize, Serialize};
use ssh2::Session;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// SSH authentication method
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SshAuth {
    Password {
        username: String,
        password: String,
    },
    SshKey {
        username: String,
        private_key_path: String,
    },
}

/// Runs scripts on a remote target over SSH.
///
/// File existence and content are evaluated on the remote filesystem through
/// SFTP, because that is where the script will run. The script artifact is
/// uploaded under the working directory, executed through a channel, and
/// unlinked once the process exits, including on failure paths.
pub struct SshLauncher {
    host: String,
    port: u16,
    auth: SshAuth,
    config: SshConfig,
}

impl SshLauncher {
    pub fn new(host: impl Into<String>, port: u16, auth: SshAuth, config: SshConfig) -> Self {
        Self {
            host: host.into(),
            port,
            auth,
            config,
        }
    }

    /// Establish an authenticated SSH session.
    #[instrument(skip(self), fields(host = %self.host, port = %self.port))]
    fn connect(&self) -> Result<Session, RunnerError> {
        debug!("Establishing SSH connection");

        let tcp = TcpStream::connect((self.host.as_str(), self.port)).map_err(|e| {
            error!(error = %e, "Failed to connect");
            RunnerError::Connection(format!(
                "Failed to connect to {}:{}: {}",
                self.host, self.port, e
            ))
        })?;

        let timeout = Some(std::time::Duration::from_secs(
            self.config.connect_timeout_seconds,
        ));
        tcp.set_read_timeout(timeout)
            .map_err(|e| RunnerError::Connection(format!("Failed to set read timeout: {}", e)))?;
        tcp.set_write_timeout(timeout)
            .map_err(|e| RunnerError::Connection(format!("Failed to set write timeout: {}", e)))?;

        let mut sess = Session::new()
            .map_err(|e| RunnerError::Connection(format!("Failed to create SSH session: {}", e)))?;
        sess.set_tcp_stream(tcp);
        sess.handshake().map_err(|e| {
            error!(error = %e, "SSH handshake failed");
            RunnerError::Connection(format!("SSH handshake failed: {}", e))
        })?;

        if self.config.log_host_key {
            if let Some(hash) = sess.host_key_hash(ssh2::HashType::Sha256) {
                let hash_hex = hash
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(":");
                info!(hash = %hash_hex, "Remote host key");
            }
        }

        authenticate(&sess, &self.auth)?;

        if !sess.authenticated() {
            return Err(RunnerError::Authentication(
                "Authentication failed".to_string(),
            ));
        }

        Ok(sess)
    }

    fn sftp(sess: &Session) -> Result<ssh2::Sftp, RunnerError> {
        sess.sftp()
            .map_err(|e| RunnerError::Remote(format!("Failed to open SFTP channel: {}", e)))
    }

    /// Run the uploaded artifact and collect its exit status.
    fn exec_artifact(
        &self,
        sess: &Session,
        kind: ScriptKind,
        artifact_path: &str,
        cwd: &Path,
        sink: &mut dyn Write,
    ) -> Result<i32, RunnerError> {
        let command_line = kind.command_line(artifact_path).join(" ");
        let command = format!("cd '{}' && {}", cwd.display(), command_line);
        debug!(command = %command, "Executing remote script");

        let mut channel = sess
            .channel_session()
            .map_err(|e| RunnerError::Remote(format!("Failed to open channel: {}", e)))?;
        channel
            .exec(&command)
            .map_err(|e| RunnerError::Spawn(e.to_string()))?;

        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .map_err(|e| RunnerError::Interrupted(e.to_string()))?;
        let mut stderr = String::new();
        channel
            .stderr()
            .read_to_string(&mut stderr)
            .map_err(|e| RunnerError::Interrupted(e.to_string()))?;
        sink.write_all(stdout.as_bytes())?;
        sink.write_all(stderr.as_bytes())?;

        channel
            .wait_close()
            .map_err(|e| RunnerError::Interrupted(e.to_string()))?;
        channel
            .exit_status()
            .map_err(|e| RunnerError::Remote(format!("Failed to read exit status: {}", e)))
    }
}

impl ScriptLauncher for SshLauncher {
    fn script_exists(&self, path: &str) -> Result<bool, RunnerError> {
        let sess = self.connect()?;
        let sftp = Self::sftp(&sess)?;
        Ok(sftp.stat(Path::new(path)).is_ok())
    }

    fn read_script(&self, path: &str) -> Result<String, RunnerError> {
        let sess = self.connect()?;
        let sftp = Self::sftp(&sess)?;
        let mut remote_file = sftp.open(Path::new(path)).map_err(|e| {
            RunnerError::Io(format!("Failed to open remote file '{}': {}", path, e))
        })?;
        let mut content = String::new();
        remote_file.read_to_string(&mut content).map_err(|e| {
            RunnerError::Io(format!("Failed to read remote file '{}': {}", path, e))
        })?;
        Ok(content)
    }

    #[instrument(skip(self, script, sink), fields(host = %self.host, kind = ?kind))]
    fn launch(
        &self,
        script: &str,
        kind: ScriptKind,
        cwd: &Path,
        sink: &mut dyn Write,
    ) -> Result<i32, RunnerError> {
        let sess = self.connect()?;
        let sftp = Self::sftp(&sess)?;

        let artifact_name = format!("script-trigger-{}{}", Uuid::new_v4(), kind.file_extension());
        let artifact_path = cwd.join(&artifact_name).display().to_string();

        let mut remote_file = sftp.create(Path::new(&artifact_path)).map_err(|e| {
            RunnerError::Io(format!(
                "Failed to create remote artifact '{}': {}",
                artifact_path, e
            ))
        })?;
        let write_result = remote_file
            .write_all(script.as_bytes())
            .map_err(|e| RunnerError::Io(format!("Failed to write remote artifact: {}", e)));
        drop(remote_file);

        let result = write_result
            .and_then(|_| self.exec_artifact(&sess, kind, &artifact_path, cwd, sink));

        // Cycle-scoped artifact, removed on every exit path
        if let Err(e) = sftp.unlink(Path::new(&artifact_path)) {
            warn!(artifact = %artifact_path, error = %e, "Failed to remove remote artifact");
        }

        result
    }
}

fn authenticate(sess: &Session, auth: &SshAuth) -> Result<(), RunnerError> {
    match auth {
        SshAuth::Password { username, password } => {
            debug!(username = %username, "Authenticating with password");
            sess.userauth_password(username, password).map_err(|e| {
                error!(error = %e, username = %username, "Password authentication failed");
                RunnerError::Authentication(format!(
                    "Password authentication failed for user {}: {}",
                    username, e
                ))
            })
        }
        SshAuth::SshKey {
            username,
            private_key_path,
        } => {
            debug!(username = %username, key_path = %private_key_path, "Authenticating with SSH key");
            sess.userauth_pubkey_file(username, None, Path::new(private_key_path), None)
                .map_err(|e| {
                    error!(error = %e, username = %username, "SSH key authentication failed");
                    RunnerError::Authentication(format!(
                        "SSH key authentication failed for user {}: {}",
                        username, e
                    ))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_auth_deserializes_tagged_form() {
        let json = r#"{"type": "password", "username": "ops", "password": "secret"}"#;
        let auth: SshAuth = serde_json::from_str(json).unwrap();
        assert!(matches!(auth, SshAuth::Password { .. }));

        let json = r#"{"type": "ssh_key", "username": "ops", "private_key_path": "/home/ops/.ssh/id_ed25519"}"#;
        let auth: SshAuth = serde_json::from_str(json).unwrap();
        assert!(matches!(auth, SshAuth::SshKey { .. }));
    }

    #[test]
    fn test_connect_to_unreachable_host_is_connection_error() {
        let launcher = SshLauncher::new(
            "127.0.0.1",
            1, // no listener expected on port 1
            SshAuth::Password {
                username: "nobody".to_string(),
                password: "nothing".to_string(),
            },
            SshConfig::default(),
        );
        let err = launcher.script_exists("/tmp/check.sh").unwrap_err();
        assert!(matches!(err, RunnerError::Connection(_)));
    }
}
