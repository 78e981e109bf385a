use crate::server::RequestHead;

/// Answers "who sent this request" for log lines.
pub trait RemoteAddr: Send + Sync {
    fn remote_addr(&self, head: &RequestHead) -> Option<String>;
}

/// Peer address of the transport connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerAddr;

impl RemoteAddr for PeerAddr {
    fn remote_addr(&self, head: &RequestHead) -> Option<String> {
        head.remote_addr().map(|a| a.ip().to_string())
    }
}

/// First hop of `X-Forwarded-For`, falling back to the peer address.
///
/// Only install this behind a proxy that overwrites the header.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardedFor;

impl RemoteAddr for ForwardedFor {
    fn remote_addr(&self, head: &RequestHead) -> Option<String> {
        head.header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| PeerAddr.remote_addr(head))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Request;

    #[test]
    fn test_forwarded_for_prefers_first_hop() {
        let req = Request::builder()
            .header("X-Forwarded-For", "203.0.113.9, 10.0.0.1")
            .remote_addr("10.0.0.1:4000".parse().unwrap())
            .build()
            .unwrap();
        assert_eq!(ForwardedFor.remote_addr(req.head()).as_deref(), Some("203.0.113.9"));
        assert_eq!(PeerAddr.remote_addr(req.head()).as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_forwarded_for_falls_back_to_peer() {
        let req = Request::builder()
            .remote_addr("192.0.2.1:80".parse().unwrap())
            .build()
            .unwrap();
        assert_eq!(ForwardedFor.remote_addr(req.head()).as_deref(), Some("192.0.2.1"));
    }
}
