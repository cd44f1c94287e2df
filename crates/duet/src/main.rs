//! CLI entry point: `duet <host> <port>`.
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::process::ExitCode;

use duet::DuetServer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let (host, port) = match parse_args(&args) {
        Some(parsed) => parsed,
        None => {
            let program = args.first().map(String::as_str).unwrap_or("duet");
            eprintln!("Usage: {program} <host> <port>");
            return ExitCode::from(2);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let server = match DuetServer::builder().bind(&bind_addr(host, port)).build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            return ExitCode::FAILURE;
        }
    };

    if let Ok(addr) = server.local_addr() {
        tracing::info!("Server listening on {addr}");
    }

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server error");
            ExitCode::FAILURE
        }
    }
}

/// Expects exactly `<host> <port>` after the program name.
fn parse_args(args: &[String]) -> Option<(&str, u16)> {
    match args {
        [_, host, port] => Some((host.as_str(), port.parse().ok()?)),
        _ => None,
    }
}

/// Joins host and port, bracketing bare IPv6 literals.
fn bind_addr(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_host_and_port() {
        let a = args(&["duet", "0.0.0.0", "9000"]);
        assert_eq!(parse_args(&a), Some(("0.0.0.0", 9000)));
    }

    #[test]
    fn test_parse_args_rejects_wrong_arity_and_bad_port() {
        assert_eq!(parse_args(&args(&["duet"])), None);
        assert_eq!(parse_args(&args(&["duet", "localhost"])), None);
        assert_eq!(parse_args(&args(&["duet", "localhost", "http"])), None);
        assert_eq!(parse_args(&args(&["duet", "localhost", "70000"])), None);
        assert_eq!(parse_args(&args(&["duet", "a", "1", "extra"])), None);
    }

    #[test]
    fn test_bind_addr_brackets_ipv6() {
        assert_eq!(bind_addr("127.0.0.1", 80), "127.0.0.1:80");
        assert_eq!(bind_addr("::1", 80), "[::1]:80");
        assert_eq!(bind_addr("[::1]", 80), "[::1]:80");
        assert_eq!(bind_addr("localhost", 80), "localhost:80");
    }
}
