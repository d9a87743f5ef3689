//! SSH transport on top of the russh client.
//!
//! Host keys go through [`decide`]: known_hosts is consulted unless
//! verification is disabled, and the verdict says whether to accept, learn
//! or reject. A rejection is parked in a shared slot so `connect` can
//! report it instead of russh's generic unknown-key error.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKey, PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use secrecy::{ExposeSecret, SecretString};

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{Result, TransportError};

type Rejection = Arc<Mutex<Option<TransportError>>>;

/// An authenticated SSH connection to one device.
pub struct SshTransport {
    session: Handle<SshHandler>,
    terminal_width: u32,
    terminal_height: u32,
}

impl SshTransport {
    /// Connect, verify the host key and authenticate, all within
    /// `config.timeout`.
    pub async fn connect(config: &SshConfig) -> Result<Self> {
        let client_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });
        let rejection = Rejection::default();
        let handler = SshHandler {
            mode: config.host_key_verification,
            known_hosts: KnownHosts::new(&config.host, config.port, config.known_hosts_path.clone()),
            rejection: rejection.clone(),
        };

        debug!("connecting to {}", config.socket_addr());
        let connecting = client::connect(client_config, (config.host.as_str(), config.port), handler);
        let mut session = match tokio::time::timeout(config.timeout, connecting).await {
            Err(_) => return Err(TransportError::Timeout(config.timeout).into()),
            Ok(Err(e)) => {
                let parked = rejection.lock().ok().and_then(|mut slot| slot.take());
                return Err(parked.unwrap_or(TransportError::Ssh(e)).into());
            }
            Ok(Ok(session)) => session,
        };

        authenticate(&mut session, config).await?;
        debug!("authenticated to {} as {}", config.host, config.username);

        Ok(Self {
            session,
            terminal_width: config.terminal_width,
            terminal_height: config.terminal_height,
        })
    }

    /// Open a shell channel with a PTY sized for the device.
    pub async fn open_channel(&self) -> Result<Channel<Msg>> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(true, "xterm", self.terminal_width, self.terminal_height, 0, 0, &[])
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(channel)
    }

    /// Whether russh's background session task has stopped.
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

fn load_key(path: &Path, passphrase: Option<&SecretString>) -> Result<PrivateKey> {
    let key = load_secret_key(path, passphrase.map(|p| p.expose_secret()))
        .map_err(|e| TransportError::Key(format!("{}: {}", path.display(), e)))?;
    Ok(key)
}

async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
    let user = config.username.as_str();
    let outcome = match &config.auth {
        AuthMethod::None => session.authenticate_none(user).await,
        AuthMethod::Password(password) => {
            session
                .authenticate_password(user, password.expose_secret())
                .await
        }
        AuthMethod::PrivateKey { path, passphrase } => {
            let key = load_key(path, passphrase.as_ref())?;
            let hash_alg = session
                .best_supported_rsa_hash()
                .await
                .map_err(TransportError::Ssh)?
                .flatten();
            session
                .authenticate_publickey(user, PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg))
                .await
        }
    }
    .map_err(TransportError::Ssh)?;

    if outcome.success() {
        Ok(())
    } else {
        Err(TransportError::AuthenticationFailed {
            user: config.username.clone(),
        }
        .into())
    }
}

/// The known_hosts entry for one `host:port`.
#[derive(Debug, Clone)]
struct KnownHosts {
    host: String,
    port: u16,
    /// `~/.ssh/known_hosts` when unset.
    path: Option<PathBuf>,
}

impl KnownHosts {
    fn new(host: &str, port: u16, path: Option<PathBuf>) -> Self {
        Self {
            host: host.to_string(),
            port,
            path,
        }
    }

    /// `Ok(false)` when the host has no entry.
    fn check(&self, key: &PublicKey) -> std::result::Result<bool, TransportError> {
        let checked = match &self.path {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };
        checked.map_err(|e| match e {
            russh::keys::Error::KeyChanged { line } => TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            },
            other => TransportError::KnownHosts(other.to_string()),
        })
    }

    fn learn(&self, key: &PublicKey) -> std::result::Result<(), TransportError> {
        use russh::keys::known_hosts::{learn_known_hosts, learn_known_hosts_path};

        match &self.path {
            Some(path) => learn_known_hosts_path(&self.host, self.port, key, path),
            None => learn_known_hosts(&self.host, self.port, key),
        }
        .map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn unknown(&self) -> TransportError {
        TransportError::HostKeyUnknown {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

#[derive(Debug)]
enum HostKeyDecision {
    Accept,
    /// Accept and record the key.
    Learn,
    Reject(TransportError),
}

/// Apply `mode` to a known_hosts lookup. `lookup` is only run when the
/// mode needs it.
fn decide<F>(mode: HostKeyVerification, known_hosts: &KnownHosts, lookup: F) -> HostKeyDecision
where
    F: FnOnce() -> std::result::Result<bool, TransportError>,
{
    if mode == HostKeyVerification::Disabled {
        return HostKeyDecision::Accept;
    }
    match (mode, lookup()) {
        (_, Ok(true)) => HostKeyDecision::Accept,
        (HostKeyVerification::AcceptNew, Ok(false)) => HostKeyDecision::Learn,
        (_, Ok(false)) => HostKeyDecision::Reject(known_hosts.unknown()),
        (_, Err(e)) => HostKeyDecision::Reject(e),
    }
}

struct SshHandler {
    mode: HostKeyVerification,
    known_hosts: KnownHosts,
    rejection: Rejection,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let known_hosts = &self.known_hosts;
        match decide(self.mode, known_hosts, || known_hosts.check(server_public_key)) {
            HostKeyDecision::Accept => Ok(true),
            HostKeyDecision::Learn => {
                match known_hosts.learn(server_public_key) {
                    Ok(()) => info!("learned host key for {}:{}", known_hosts.host, known_hosts.port),
                    Err(e) => warn!("Failed to save host key: {}", e),
                }
                Ok(true)
            }
            HostKeyDecision::Reject(error) => {
                warn!("rejecting host key: {}", error);
                if let Ok(mut slot) = self.rejection.lock() {
                    *slot = Some(error);
                }
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use russh::keys::ssh_key::private::Ed25519Keypair;

    use super::*;
    use crate::Error;
    use crate::session::fake_device;

    fn target() -> KnownHosts {
        KnownHosts::new("192.0.2.1", 22, None)
    }

    fn host_key(seed: u8) -> PublicKey {
        PrivateKey::from(Ed25519Keypair::from_seed(&[seed; 32]))
            .public_key()
            .clone()
    }

    #[test]
    fn test_disabled_skips_lookup() {
        let decision = decide(HostKeyVerification::Disabled, &target(), || {
            panic!("known_hosts must not be read")
        });
        assert!(matches!(decision, HostKeyDecision::Accept));
    }

    #[test]
    fn test_unknown_host_by_mode() {
        let learn = decide(HostKeyVerification::AcceptNew, &target(), || Ok(false));
        assert!(matches!(learn, HostKeyDecision::Learn));

        let strict = decide(HostKeyVerification::Strict, &target(), || Ok(false));
        assert!(matches!(
            strict,
            HostKeyDecision::Reject(TransportError::HostKeyUnknown { port: 22, .. })
        ));
    }

    #[test]
    fn test_changed_key_rejected_in_every_checking_mode() {
        for mode in [HostKeyVerification::AcceptNew, HostKeyVerification::Strict] {
            let decision = decide(mode, &target(), || {
                Err(TransportError::HostKeyChanged {
                    host: "192.0.2.1".into(),
                    port: 22,
                    line: 3,
                })
            });
            assert!(matches!(
                decision,
                HostKeyDecision::Reject(TransportError::HostKeyChanged { line: 3, .. })
            ));
        }
    }

    #[test]
    fn test_known_hosts_learn_then_check() {
        let tmp = tempfile::tempdir().unwrap();
        let known_hosts = KnownHosts::new("192.0.2.1", 2222, Some(tmp.path().join("known_hosts")));

        assert!(!known_hosts.check(&host_key(1)).unwrap());
        known_hosts.learn(&host_key(1)).unwrap();
        assert!(known_hosts.check(&host_key(1)).unwrap());

        let err = known_hosts.check(&host_key(2)).unwrap_err();
        assert!(matches!(err, TransportError::HostKeyChanged { port: 2222, .. }));
    }

    #[tokio::test]
    async fn test_strict_rejects_unknown_device() {
        let addr = fake_device::spawn().await;
        let tmp = tempfile::tempdir().unwrap();
        let session = fake_device::builder(addr)
            .host_key_verification(HostKeyVerification::Strict)
            .known_hosts_path(tmp.path().join("known_hosts"))
            .build()
            .unwrap();

        let err = SshTransport::connect(session.config()).await.err().unwrap();
        assert!(matches!(
            err,
            Error::Transport(TransportError::HostKeyUnknown { .. })
        ));
    }

    #[tokio::test]
    async fn test_accept_new_records_key_for_strict() {
        let addr = fake_device::spawn().await;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("known_hosts");

        for mode in [HostKeyVerification::AcceptNew, HostKeyVerification::Strict] {
            let session = fake_device::builder(addr)
                .host_key_verification(mode)
                .known_hosts_path(&path)
                .build()
                .unwrap();
            let transport = SshTransport::connect(session.config()).await.unwrap();
            assert!(!transport.is_closed());
            transport.close().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_changed_device_key_rejected() {
        let addr = fake_device::spawn_with_host_key(9).await;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("known_hosts");
        KnownHosts::new(&addr.ip().to_string(), addr.port(), Some(path.clone()))
            .learn(&host_key(7))
            .unwrap();

        let session = fake_device::builder(addr)
            .host_key_verification(HostKeyVerification::AcceptNew)
            .known_hosts_path(&path)
            .build()
            .unwrap();

        let err = SshTransport::connect(session.config()).await.err().unwrap();
        assert!(matches!(
            err,
            Error::Transport(TransportError::HostKeyChanged { .. })
        ));
    }
}
