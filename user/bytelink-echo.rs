// bytelink-echo: example binary driving an in-process transport pair
use bytelink::{loopback_pair, ListenerError, TransportError, TransportListener};
use std::env;
use std::thread;
use std::time::Duration;

struct ConsoleListener {
    name: &'static str,
}

impl TransportListener for ConsoleListener {
    fn on_bytes_received(&self, bytes: &[u8]) -> Result<(), ListenerError> {
        println!(
            "[{}] <- {} bytes: {}",
            self.name,
            bytes.len(),
            String::from_utf8_lossy(bytes)
        );
        Ok(())
    }

    fn on_connected(&self) -> Result<(), ListenerError> {
        println!("[{}] connected", self.name);
        Ok(())
    }

    fn on_disconnected(&self, reason: &str) -> Result<(), ListenerError> {
        println!("[{}] disconnected: {}", self.name, reason);
        Ok(())
    }

    fn on_error(&self, message: &str, cause: &TransportError) -> Result<(), ListenerError> {
        eprintln!("[{}] error: {}: {}", self.name, message, cause);
        Ok(())
    }
}

fn usage() {
    println!("Usage: bytelink-echo [options] [message]");
    println!("Send messages across an in-process transport pair and print both sides.");
    println!("Options:");
    println!("  -d delay      Milliseconds to wait between messages (Default: 200)");
    println!("  -n count      Number of messages to send per side (Default: 5)");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 5;
    let mut delay: u64 = 200;
    let mut message = String::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" => {
                if i + 1 < args.len() {
                    delay = args[i + 1].parse().unwrap_or(200);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-n" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(5);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-h" | "--help" => {
                usage();
                return;
            }
            _ => {
                message = args[i].clone();
                i += 1;
            }
        }
    }

    if message.is_empty() {
        message = "ping".to_string();
    }

    let (alice, bob) = loopback_pair(
        Box::new(ConsoleListener { name: "alice" }),
        Box::new(ConsoleListener { name: "bob" }),
    );

    alice.open_connection().expect("failed to open alice side");
    bob.open_connection().expect("failed to open bob side");

    // bob answers from its own thread while alice sends from this one
    let responder = thread::spawn(move || {
        for n in 0..count {
            let reply = format!("pong {}", n);
            if !bob.send_bytes(reply.as_bytes()) {
                eprintln!("[bob] send failed");
                break;
            }
            thread::sleep(Duration::from_millis(delay));
        }
        bob
    });

    for n in 0..count {
        let frame = format!("{} {}", message, n);
        if !alice.send_bytes(frame.as_bytes()) {
            eprintln!("[alice] send failed");
            break;
        }
        thread::sleep(Duration::from_millis(delay));
    }

    let bob = responder.join().expect("responder thread panicked");

    // Drain in-flight frames before tearing the pair down
    thread::sleep(Duration::from_millis(200));
    alice.disconnect();
    bob.disconnect();
    thread::sleep(Duration::from_millis(200));
}
