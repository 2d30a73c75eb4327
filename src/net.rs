use std::{
    io,
    net::{IpAddr, SocketAddr},
};

use embedded_io_adapters::tokio_1::FromTokio;
use embedded_nal_async::{AddrType, Dns, TcpConnect};
use tokio::net::TcpStream;

/// Operating system TCP for the HTTP client.
#[derive(Debug, Default)]
pub struct TokioTcp;

impl TcpConnect for TokioTcp {
    type Error = io::Error;
    type Connection<'a>
        = FromTokio<TcpStream>
    where
        Self: 'a;

    async fn connect<'a>(&'a self, remote: SocketAddr) -> Result<Self::Connection<'a>, Self::Error> {
        let stream = TcpStream::connect(remote).await?;
        stream.set_nodelay(true)?;
        Ok(FromTokio::new(stream))
    }
}

/// Operating system resolver for the HTTP client.
#[derive(Debug, Default)]
pub struct TokioDns;

impl Dns for TokioDns {
    type Error = io::Error;

    async fn get_host_by_name(&self, host: &str, addr_type: AddrType) -> Result<IpAddr, Self::Error> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }

        tokio::net::lookup_host((host, 0))
            .await?
            .map(|addr| addr.ip())
            .find(|ip| match addr_type {
                AddrType::IPv4 => ip.is_ipv4(),
                AddrType::IPv6 => ip.is_ipv6(),
                AddrType::Either => true,
            })
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("No matching address found for {host}"),
                )
            })
    }

    async fn get_host_by_address(&self, _addr: IpAddr, _result: &mut [u8]) -> Result<usize, Self::Error> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Reverse lookup is not supported",
        ))
    }
}
