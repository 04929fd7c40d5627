// Zabbix trapper protocol ("sender data")
//
// Frame layout, all integers little-endian:
//
// ```text
// "ZBXD" | flags (0x01) | data length (u32) | reserved (u32) | JSON
// ```
//
// One TCP connection per batch: connect, write the request frame, read the
// response frame, close.

use std::time::Duration;

use bytes::{BufMut, BytesMut};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::Error;

pub const DEFAULT_TRAPPER_PORT: u16 = 10051;

const MAGIC: &[u8; 4] = b"ZBXD";
const FLAG_PROTOCOL: u8 = 0x01;
const FLAG_COMPRESSED: u8 = 0x02;
const HEADER_LEN: usize = 13;
/// Upper bound on a response body; real answers are a few hundred bytes.
const MAX_RESPONSE_LEN: usize = 1024 * 1024;

/// One value destined for a trapper item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderItem {
    pub host: String,
    pub key: String,
    pub value: String,
    /// Unix seconds.
    pub clock: i64,
    pub ns: u32,
}

#[derive(Serialize)]
struct SenderRequest<'a> {
    request: &'static str,
    data: &'a [SenderItem],
    clock: i64,
    ns: u32,
}

#[derive(Deserialize)]
struct SenderResponse {
    response: String,
    #[serde(default)]
    info: String,
}

/// Counters parsed from the server's `info` string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendSummary {
    pub processed: u64,
    pub failed: u64,
    pub total: u64,
}

impl SendSummary {
    /// Parse `"processed: 3; failed: 0; total: 3; seconds spent: 0.000055"`.
    ///
    /// Unknown or malformed segments are ignored.
    pub fn parse(info: &str) -> Self {
        let mut summary = Self::default();
        for segment in info.split(';') {
            let Some((name, value)) = segment.split_once(':') else {
                continue;
            };
            let Ok(value) = value.trim().parse::<u64>() else {
                continue;
            };
            match name.trim() {
                "processed" => summary.processed = value,
                "failed" => summary.failed = value,
                "total" => summary.total = value,
                _ => {}
            }
        }
        summary
    }
}

/// Pushes batches of values to a Zabbix server or proxy trapper port.
#[derive(Debug, Clone)]
pub struct ZabbixSender {
    address: String,
    timeout: Duration,
}

impl ZabbixSender {
    /// `endpoint` is `host` or `host:port`; the port defaults to 10051.
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        Self {
            address: normalize_address(endpoint),
            timeout,
        }
    }

    /// The `host:port` this sender connects to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Send one batch. The whole exchange is bounded by the sender timeout.
    pub async fn send(&self, items: &[SenderItem]) -> Result<SendSummary, Error> {
        let now = Utc::now();
        let request = SenderRequest {
            request: "sender data",
            data: items,
            clock: now.timestamp(),
            ns: now.timestamp_subsec_nanos(),
        };
        let payload =
            serde_json::to_vec(&request).map_err(|e| Error::Protocol(format!("encode: {e}")))?;
        let frame = encode_frame(&payload)?;

        debug!(address = %self.address, items = items.len(), bytes = frame.len(), "sending batch");

        let body = tokio::time::timeout(self.timeout, self.exchange(&frame))
            .await
            .map_err(|_| Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            })??;

        let response: SenderResponse = serde_json::from_slice(&body).map_err(|e| {
            Error::deserialization(&e, String::from_utf8_lossy(&body).into_owned())
        })?;

        if response.response != "success" {
            return Err(Error::Rejected {
                response: response.response,
                info: response.info,
            });
        }

        let summary = SendSummary::parse(&response.info);
        if summary.failed > 0 {
            warn!(
                processed = summary.processed,
                failed = summary.failed,
                total = summary.total,
                "Zabbix accepted the batch but refused some values"
            );
        }
        Ok(summary)
    }

    async fn exchange(&self, frame: &[u8]) -> Result<Vec<u8>, Error> {
        let mut stream = TcpStream::connect(&self.address).await?;
        stream.write_all(frame).await?;
        stream.flush().await?;

        let mut header = [0u8; HEADER_LEN];
        stream.read_exact(&mut header).await?;
        let len = decode_header(&header)?;

        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).await?;
        Ok(body)
    }
}

fn normalize_address(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    // Bracketed IPv6 with port, bare host:port, or bare host.
    let has_port = if endpoint.starts_with('[') {
        endpoint.contains("]:")
    } else {
        endpoint.matches(':').count() == 1
    };
    if has_port {
        endpoint.to_owned()
    } else if endpoint.contains(':') && !endpoint.starts_with('[') {
        format!("[{endpoint}]:{DEFAULT_TRAPPER_PORT}")
    } else {
        format!("{endpoint}:{DEFAULT_TRAPPER_PORT}")
    }
}

/// Wrap a JSON payload in a ZBXD frame.
pub(crate) fn encode_frame(payload: &[u8]) -> Result<BytesMut, Error> {
    let len = u32::try_from(payload.len())
        .map_err(|_| Error::Protocol(format!("payload too large: {} bytes", payload.len())))?;
    let mut frame = BytesMut::with_capacity(HEADER_LEN + payload.len());
    frame.put_slice(MAGIC);
    frame.put_u8(FLAG_PROTOCOL);
    frame.put_u32_le(len);
    frame.put_u32_le(0);
    frame.put_slice(payload);
    Ok(frame)
}

/// Validate a response header and return the body length.
pub(crate) fn decode_header(header: &[u8; HEADER_LEN]) -> Result<usize, Error> {
    if &header[..4] != MAGIC {
        return Err(Error::Protocol(format!(
            "bad magic {:?}",
            String::from_utf8_lossy(&header[..4])
        )));
    }
    let flags = header[4];
    if flags & FLAG_PROTOCOL == 0 {
        return Err(Error::Protocol(format!("unexpected flags {flags:#04x}")));
    }
    if flags & FLAG_COMPRESSED != 0 {
        return Err(Error::Protocol("compressed responses are not supported".into()));
    }
    let len = u32::from_le_bytes([header[5], header[6], header[7], header[8]]);
    let len = usize::try_from(len).map_err(|_| Error::Protocol("length overflow".into()))?;
    if len > MAX_RESPONSE_LEN {
        return Err(Error::Protocol(format!("response of {len} bytes exceeds limit")));
    }
    Ok(len)
}
