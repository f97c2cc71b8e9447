//! 网络 Sink
//!
//! 通过 TCP 或 UDP 把 JSON 记录发送到日志收集端（如 logstash）。
//! 连接在构造时建立，失败即返回 `TransportError`；之后的写入失败只以
//! `SinkError::Network` 的形式交给 tee，不会重连。

use crate::config::NetworkProtocol;
use crate::core::level::Level;
use crate::core::record::Record;
use crate::error::{Result, TeeLogError};
use crate::sinks::encoder::Encoder;
use crate::sinks::traits::{LogSink, SinkError, SinkMetadata, SinkResult};
use serde_json::Value;
use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::sync::Mutex;
use std::time::Duration;

const TCP_WRITE_ERROR: &str = "TCP write failed";
const UDP_SEND_ERROR: &str = "UDP send failed";

/// 日志格式版本字段
pub const VERSION_FIELD: (&str, &str) = ("@version", "1");
/// 日志类型字段
pub const TYPE_FIELD: (&str, &str) = ("type", "log");

/// 网络连接
#[derive(Debug)]
enum NetworkConnection {
    /// TCP 连接
    Tcp(Mutex<TcpStream>),
    /// 已 connect 的 UDP 套接字
    Udp(UdpSocket),
}

/// 网络 Sink
#[derive(Debug)]
pub struct NetworkSink {
    threshold: Level,
    protocol: NetworkProtocol,
    peer: SocketAddr,
    connection: NetworkConnection,
    schema_fields: Vec<(String, Value)>,
}

impl NetworkSink {
    /// 连接到 `address` 并创建 sink
    pub fn connect(
        threshold: Level,
        protocol: NetworkProtocol,
        address: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let peer = resolve(address)?;

        let connection = match protocol {
            NetworkProtocol::Tcp => {
                let stream = TcpStream::connect_timeout(&peer, timeout).map_err(|e| {
                    TeeLogError::transport(format!("TCP connection to {} failed: {}", address, e))
                })?;
                stream.set_nodelay(true).ok();
                NetworkConnection::Tcp(Mutex::new(stream))
            }
            NetworkProtocol::Udp => {
                let bind_addr = if peer.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
                let socket = UdpSocket::bind(bind_addr).map_err(|e| {
                    TeeLogError::transport(format!("UDP socket bind failed: {}", e))
                })?;
                socket.connect(peer).map_err(|e| {
                    TeeLogError::transport(format!("UDP connect to {} failed: {}", address, e))
                })?;
                NetworkConnection::Udp(socket)
            }
        };

        tracing::info!("network sink connected to {} over {:?}", peer, protocol);

        Ok(Self {
            threshold,
            protocol,
            peer,
            connection,
            schema_fields: vec![
                (VERSION_FIELD.0.to_string(), Value::from(VERSION_FIELD.1)),
                (TYPE_FIELD.0.to_string(), Value::from(TYPE_FIELD.1)),
            ],
        })
    }

    /// 对端地址
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn protocol(&self) -> NetworkProtocol {
        self.protocol
    }
}

fn resolve(address: &str) -> Result<SocketAddr> {
    address
        .to_socket_addrs()
        .map_err(|e| TeeLogError::transport(format!("Invalid address {}: {}", address, e)))?
        .next()
        .ok_or_else(|| TeeLogError::transport(format!("Address {} did not resolve", address)))
}

impl LogSink for NetworkSink {
    fn threshold(&self) -> Level {
        self.threshold
    }

    fn write_record(&self, record: &Record, static_fields: &[(String, Value)]) -> SinkResult<()> {
        let line = Encoder::Json.encode(record, &[static_fields, &self.schema_fields])?;

        match &self.connection {
            NetworkConnection::Tcp(stream) => {
                let mut stream = stream.lock().map_err(|_| SinkError::Poisoned("network"))?;
                stream
                    .write_all(line.as_bytes())
                    .map_err(|e| SinkError::Network(format!("{}: {}", TCP_WRITE_ERROR, e)))?;
            }
            NetworkConnection::Udp(socket) => {
                socket
                    .send(line.as_bytes())
                    .map_err(|e| SinkError::Network(format!("{}: {}", UDP_SEND_ERROR, e)))?;
            }
        }
        Ok(())
    }

    fn flush(&self) -> SinkResult<()> {
        if let NetworkConnection::Tcp(stream) = &self.connection {
            let mut stream = stream.lock().map_err(|_| SinkError::Poisoned("network"))?;
            stream.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "network"
    }

    fn metadata(&self) -> SinkMetadata {
        SinkMetadata::new(self.name().to_string(), self.threshold).with_description(format!(
            "Network sink using {:?} protocol to {}",
            self.protocol, self.peer
        ))
    }
}
