//! Client for the croaker music server's remote-control protocol.
//!
//! Every request opens a fresh TCP connection, writes one newline-terminated
//! command, reads the reply until a read comes back shorter than the chunk
//! size, sends `KTHX` and closes. There is no length prefix or terminator on
//! the reply side, so a short read is the only end-of-response signal.

use crate::error::{DmshError, Result};
use std::cell::OnceCell;
use std::io::{self, Read, Write};
use std::net::TcpStream;

/// Bytes requested per read.
pub const CHUNK_SIZE: usize = 4096;

/// Line sent after the reply has been consumed.
pub const SENTINEL: &[u8] = b"KTHX\n";

#[derive(Debug)]
pub struct CroakerClient {
    host: String,
    port: u16,
    chunk_size: usize,
    playlists: OnceCell<Vec<String>>,
}

impl CroakerClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            chunk_size: CHUNK_SIZE,
            playlists: OnceCell::new(),
        }
    }

    /// Use a different read size; the server must agree on it.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The playlist catalogue, fetched with `LIST` on first success.
    ///
    /// The catalogue is never refreshed afterwards, even if the server's
    /// playlists change. Use [`CroakerClient::list`] for a live listing.
    pub fn playlists(&self) -> Result<&[String]> {
        if let Some(playlists) = self.playlists.get() {
            return Ok(playlists);
        }
        let fetched: Vec<String> = self
            .send("LIST")?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect();
        log::debug!("cached {} playlists from {}", fetched.len(), self.address());
        Ok(self.playlists.get_or_init(|| fetched))
    }

    /// `LIST`, or `LIST <name>` to list one playlist's tracks.
    pub fn list(&self, name: Option<&str>) -> Result<String> {
        match name {
            Some(name) => self.send(&format!("LIST {name}")),
            None => self.send("LIST"),
        }
    }

    /// `PLAY <name>`. Without a name nothing is sent.
    pub fn play(&self, name: Option<&str>) -> Result<String> {
        let name = name.ok_or(DmshError::MissingPlaylist)?;
        self.send(&format!("PLAY {name}"))
    }

    /// `FFWD`: skip to the next track.
    pub fn skip(&self) -> Result<String> {
        self.send("FFWD")
    }

    /// Send one request and return the server's reply.
    pub fn send(&self, msg: &str) -> Result<String> {
        log::debug!("croaker {} <- {msg:?}", self.address());
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))?;
        stream.write_all(format!("{msg}\n").as_bytes())?;

        let mut data = Vec::new();
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = stream.read(&mut buf)?;
            data.extend_from_slice(&buf[..n]);
            if n < self.chunk_size {
                break;
            }
        }

        stream.write_all(SENTINEL)?;
        drop(stream);

        String::from_utf8(data)
            .map_err(|e| DmshError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}
