//! Example: a typed shell that logs every payload it receives
//!
//! Run with `RUST_LOG=info cargo run --example typed_shell`, then send
//! something with `printf hello | nc 127.0.0.1 5000`.

use tcpsh::{ShellHandler, TcpShell};

struct Printer;

impl ShellHandler for Printer {
    type Value = String;

    fn process(&mut self, data: String) {
        log::info!(target: "MyTCPShell", "Data: {data}");
    }
}

fn main() {
    env_logger::init();

    let mut shell = TcpShell::new("127.0.0.1", 5000, Printer);
    if let Err(e) = shell.start() {
        eprintln!("Shell stopped: {e}");
    }
}
