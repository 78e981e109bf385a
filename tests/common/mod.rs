#![allow(dead_code)]

pub mod dispatch {
    use std::sync::Arc;

    use brrtdispatch::config::DispatcherConfig;
    use brrtdispatch::dispatcher::Dispatcher;
    use brrtdispatch::middleware::{Handler, Middleware, Pipeline};
    use brrtdispatch::recovery::ErrorRecovery;
    use brrtdispatch::registry::EndpointRegistry;
    use brrtdispatch::server::{RecordingSink, Request, ResponseEmitter};

    /// Dispatcher with the given endpoints (in order) and middlewares.
    pub fn dispatcher(
        endpoints: Vec<(&str, Arc<dyn Handler>)>,
        middlewares: Vec<Arc<dyn Middleware>>,
        recovery: ErrorRecovery,
    ) -> Dispatcher {
        let registry = endpoints
            .into_iter()
            .fold(EndpointRegistry::new(), |reg, (path, h)| reg.with(path, h));
        Dispatcher::new(
            &DispatcherConfig::default(),
            registry,
            Pipeline::new(middlewares),
            ResponseEmitter::default(),
            recovery,
        )
    }

    /// Dispatch into a fresh [`RecordingSink`].
    pub fn record(dispatcher: &Dispatcher, request: Request) -> RecordingSink {
        let mut sink = RecordingSink::new();
        dispatcher.dispatch(request, &mut sink).unwrap();
        sink
    }

    pub fn get(path: &str) -> Request {
        Request::get(path).unwrap()
    }

    pub fn get_json(path: &str) -> Request {
        Request::builder()
            .uri(path)
            .header("Accept", "application/json")
            .build()
            .unwrap()
    }
}

pub mod temp_files {
    use std::io::Write;

    use tempfile::{NamedTempFile, TempDir};

    /// Temporary file with the given extension and content.
    pub fn with_ext(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("brrtd_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn yaml(content: &str) -> NamedTempFile {
        with_ext(content, "yaml")
    }

    pub fn json(content: &str) -> NamedTempFile {
        with_ext(content, "json")
    }

    /// Directory populated with `(relative path, content)` files.
    pub fn dir(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }
        dir
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw request and read until the server closes the connection.
    pub fn send_request(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// `(status, lower-cased header lines, body)` of a close-delimited response.
    pub fn parse_response(resp: &str) -> (u16, Vec<(String, String)>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();
        (status, headers, body.to_string())
    }

    pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
