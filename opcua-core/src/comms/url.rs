use opcua_types::StatusCode;

pub const OPC_TCP_SCHEME: &str = "opc.tcp";

/// A parsed `opc.tcp://host:port/path` endpoint URL. OPC UA binary
/// transport doesn't use `url::Url`'s general-purpose parsing rules for
/// its scheme (`opc.tcp` is not a registered scheme `url` recognizes out
/// of the box), so this wraps the host/port/path extraction directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcTcpUrl {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl OpcTcpUrl {
    pub fn parse(url: &str) -> Result<Self, StatusCode> {
        let rest = url
            .strip_prefix("opc.tcp://")
            .ok_or(StatusCode::BadTcpEndpointUrlInvalid)?;
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (
                host.to_string(),
                port.parse::<u16>()
                    .map_err(|_| StatusCode::BadTcpEndpointUrlInvalid)?,
            ),
            None => (authority.to_string(), 4840),
        };
        if host.is_empty() {
            return Err(StatusCode::BadTcpEndpointUrlInvalid);
        }
        Ok(Self {
            host,
            port,
            path: path.to_string(),
        })
    }

    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for OpcTcpUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "opc.tcp://{}:{}{}", self.host, self.port, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port_and_path() {
        let url = OpcTcpUrl::parse("opc.tcp://localhost:4840/server").unwrap();
        assert_eq!(url.host, "localhost");
        assert_eq!(url.port, 4840);
        assert_eq!(url.path, "/server");
    }

    #[test]
    fn defaults_port_when_absent() {
        let url = OpcTcpUrl::parse("opc.tcp://localhost").unwrap();
        assert_eq!(url.port, 4840);
    }

    #[test]
    fn rejects_non_opc_tcp_scheme() {
        assert!(OpcTcpUrl::parse("http://localhost:4840").is_err());
    }
}
