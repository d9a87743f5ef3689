//! In-process SSH server that answers like a FortiGate CLI.
//!
//! Commands it understands:
//! - `get system status`: [`STATUS`]
//! - `slow`: `slow output`, sent [`SLOW_DELAY`] after the echo
//! - `silent`: echo only, the prompt never comes back
//! - `bogus`: a FortiOS parse error
//! - `exit`: closes the channel
//! - anything else: `<command> output`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use russh::keys::PrivateKey;
use russh::keys::ssh_key::private::Ed25519Keypair;
use russh::server::{self, Auth, Msg, Session};
use russh::{Channel, ChannelId, CryptoVec};
use tokio::net::TcpListener;

use super::{SessionBuilder, SshSession};
use crate::transport::HostKeyVerification;

pub(crate) const PROMPT: &str = "FGT60E # ";
pub(crate) const STATUS: &str = "Version: FortiGate-60E v7.2.5\nHostname: FGT60E";
pub(crate) const SLOW_DELAY: Duration = Duration::from_millis(300);

#[derive(Default)]
struct FakeFortiGate {
    line: Vec<u8>,
}

fn prompted(output: &str) -> CryptoVec {
    CryptoVec::from(format!("{}\r\n{}", output.replace('\n', "\r\n"), PROMPT))
}

impl server::Handler for FakeFortiGate {
    type Error = russh::Error;

    async fn auth_password(&mut self, _user: &str, _password: &str) -> Result<Auth, Self::Error> {
        Ok(Auth::Accept)
    }

    async fn channel_open_session(
        &mut self,
        _channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel)?;
        session.data(channel, CryptoVec::from(format!("\r\n{PROMPT}")))?;
        Ok(())
    }

    async fn data(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.line.extend_from_slice(data);

        while let Some(end) = self.line.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.line.drain(..=end).collect();
            let command = String::from_utf8_lossy(&raw).trim().to_string();
            session.data(channel, CryptoVec::from(format!("{command}\r\n")))?;

            match command.as_str() {
                "exit" => session.close(channel)?,
                "silent" => {}
                "slow" => {
                    let handle = session.handle();
                    tokio::spawn(async move {
                        tokio::time::sleep(SLOW_DELAY).await;
                        let _ = handle.data(channel, prompted("slow output")).await;
                    });
                }
                "get system status" => session.data(channel, prompted(STATUS))?,
                "bogus" => session.data(
                    channel,
                    prompted("Unknown action 0\nCommand fail. Return code -61"),
                )?,
                other => session.data(channel, prompted(&format!("{other} output")))?,
            }
        }
        Ok(())
    }
}

/// Start a fake device whose host key is derived from `seed`.
pub(crate) async fn spawn_with_host_key(seed: u8) -> SocketAddr {
    let config = Arc::new(server::Config {
        auth_rejection_time: Duration::ZERO,
        auth_rejection_time_initial: Some(Duration::ZERO),
        keys: vec![PrivateKey::from(Ed25519Keypair::from_seed(&[seed; 32]))],
        ..Default::default()
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let config = config.clone();
            tokio::spawn(async move {
                if let Ok(running) =
                    server::run_stream(config, socket, FakeFortiGate::default()).await
                {
                    let _ = running.await;
                }
            });
        }
    });

    addr
}

pub(crate) async fn spawn() -> SocketAddr {
    spawn_with_host_key(7).await
}

pub(crate) fn builder(addr: SocketAddr) -> SessionBuilder {
    SessionBuilder::new(addr.ip().to_string())
        .port(addr.port())
        .username("admin")
        .password("admin")
        .platform("fortinet")
        .timeout(Duration::from_secs(5))
}

/// An unopened session to `addr` that skips host key checks.
pub(crate) fn session(addr: SocketAddr) -> SshSession {
    builder(addr)
        .host_key_verification(HostKeyVerification::Disabled)
        .build()
        .unwrap()
}
