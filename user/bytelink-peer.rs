// bytelink-peer: interactive TCP peer - dial out or wait for one connection
use bytelink::{connect_tcp, listen_tcp, ListenerError, TransportError, TransportListener};
use std::env;
use std::io::BufRead;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct PeerListener {
    done: AtomicBool,
}

impl TransportListener for PeerListener {
    fn on_bytes_received(&self, bytes: &[u8]) -> Result<(), ListenerError> {
        println!("<- {}", String::from_utf8_lossy(bytes));
        Ok(())
    }

    fn on_connected(&self) -> Result<(), ListenerError> {
        println!("link up");
        Ok(())
    }

    fn on_disconnected(&self, reason: &str) -> Result<(), ListenerError> {
        println!("link down: {}", reason);
        self.done.store(true, Ordering::Release);
        Ok(())
    }

    fn on_error(&self, message: &str, cause: &TransportError) -> Result<(), ListenerError> {
        eprintln!("link error: {}: {}", message, cause);
        self.done.store(true, Ordering::Release);
        Ok(())
    }

    fn on_server_socket_init(&self, port: u16) -> Result<(), ListenerError> {
        println!("listening on port {}", port);
        Ok(())
    }
}

fn usage() {
    println!("Usage: bytelink-peer (-c host:port | -l port)");
    println!("Read lines from stdin and send them to the peer; print received bytes.");
    println!("Options:");
    println!("  -c host:port  Connect to a remote peer");
    println!("  -l port       Listen for one peer (0 picks a free port)");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut connect_addr: Option<String> = None;
    let mut listen_port: Option<u16> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" => {
                if i + 1 < args.len() {
                    connect_addr = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-l" => {
                if i + 1 < args.len() {
                    listen_port = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => {
                usage();
                return;
            }
        }
    }

    let listener = Arc::new(PeerListener {
        done: AtomicBool::new(false),
    });

    let transport = match (connect_addr, listen_port) {
        (Some(addr), None) => connect_tcp(&addr, Box::new(Arc::clone(&listener))),
        (None, Some(port)) => listen_tcp(port, Box::new(Arc::clone(&listener))),
        _ => {
            usage();
            process::exit(1);
        }
    };

    if let Err(e) = transport.open_connection() {
        eprintln!("open failed: {}", e);
        process::exit(1);
    }

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if listener.done.load(Ordering::Acquire) {
            break;
        }
        if !transport.send_bytes(line.as_bytes()) {
            eprintln!("send failed");
            break;
        }
    }

    transport.disconnect();
    thread::sleep(Duration::from_millis(100));
}
