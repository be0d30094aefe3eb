mod common;

use common::{RecordingLogger, wait_for};

use std::io::{Read, Write};
use std::mem;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::os::fd::AsRawFd;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tcpsh::{
    FailureKind, Level, Received, RunFlag, ShellBuilder, ShellHandler, SocketError, TcpShell,
};

type Events = Arc<Mutex<Vec<&'static str>>>;

/// Forwards every processed value and stops after `remaining` of them.
struct Collect {
    values: Sender<Vec<u8>>,
    run_flag: RunFlag,
    remaining: usize,
    events: Events,
}

impl Collect {
    fn new(values: Sender<Vec<u8>>, run_flag: RunFlag, remaining: usize) -> Self {
        Self {
            values,
            run_flag,
            remaining,
            events: Events::default(),
        }
    }
}

impl ShellHandler for Collect {
    type Value = Vec<u8>;

    fn on_start(&mut self) {
        self.events.lock().unwrap().push("start");
    }

    fn on_stop(&mut self) {
        self.events.lock().unwrap().push("stop");
    }

    fn process(&mut self, value: Vec<u8>) {
        self.events.lock().unwrap().push("process");
        self.values.send(value).expect("Failed to forward value");

        self.remaining -= 1;
        if self.remaining == 0 {
            self.run_flag.stop();
        }
    }
}

/// Upper-cases only the bytes actually read.
struct Shout {
    values: Sender<(usize, String)>,
    run_flag: RunFlag,
    parsed: usize,
}

impl ShellHandler for Shout {
    type Value = String;

    fn parse(&mut self, received: &Received<'_>) -> String {
        self.parsed += 1;
        String::from_utf8_lossy(received.filled()).to_uppercase()
    }

    fn process(&mut self, value: String) {
        self.values
            .send((self.parsed, value))
            .expect("Failed to forward value");
        self.run_flag.stop();
    }
}

fn spawn_shell<H>(
    mut shell: TcpShell<H>,
) -> thread::JoinHandle<(Result<(), SocketError>, TcpShell<H>)>
where
    H: ShellHandler + Send + 'static,
{
    thread::spawn(move || {
        let result = shell.start();
        (result, shell)
    })
}

#[test]
fn test_default_parse_delivers_full_zero_padded_buffer() {
    let (values_tx, values_rx) = mpsc::channel();
    let run_flag = RunFlag::new();
    let logger = Arc::new(RecordingLogger::default());

    let handler = Collect::new(values_tx, run_flag.clone(), 1);
    let events = handler.events.clone();
    let shell = ShellBuilder::new("127.0.0.1", 5000)
        .run_flag(run_flag)
        .logger(logger.clone())
        .build(handler);
    let handle = shell.handle();
    let server = spawn_shell(shell);

    assert_eq!(wait_for(|| handle.local_port()), 5000);

    let mut stream = TcpStream::connect("127.0.0.1:5000").expect("Failed to connect");
    stream.write_all(b"hello").expect("Failed to write");

    let value = values_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Shell never processed the payload");
    assert_eq!(value.len(), 4096);
    assert_eq!(&value[..5], b"hello");
    assert!(value[5..].iter().all(|&b| b == 0));

    // The accepted connection is closed after processing.
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).expect("Failed to read");
    assert!(rest.is_empty());

    let (result, shell) = server.join().expect("Shell panicked");
    result.expect("Shell failed");

    assert_eq!(*events.lock().unwrap(), vec!["start", "process", "stop"]);
    assert!(shell.exit_reason().is_none());
    assert_eq!(handle.local_port(), None);
    assert!(logger.contains(Level::Info, "Listening on '127.0.0.1:5000' for connections..."));
    assert!(logger.contains(Level::Debug, "Read 5 bytes from '127.0.0.1:"));
}

#[test]
fn test_peer_closing_before_sending_skips_parse() {
    let (values_tx, values_rx) = mpsc::channel();
    let run_flag = RunFlag::new();
    let logger = Arc::new(RecordingLogger::default());

    let shell = ShellBuilder::new("127.0.0.1", 0)
        .run_flag(run_flag.clone())
        .logger(logger.clone())
        .build(Shout {
            values: values_tx,
            run_flag,
            parsed: 0,
        });
    let handle = shell.handle();
    let server = spawn_shell(shell);
    let port = wait_for(|| handle.local_port());

    let silent = TcpStream::connect(("127.0.0.1", port)).expect("Failed to connect");
    silent.shutdown(Shutdown::Both).expect("Failed to shutdown");
    drop(silent);

    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("Failed to connect");
    stream.write_all(b"x").expect("Failed to write");

    let (parsed, value) = values_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Shell never processed the payload");
    assert_eq!(parsed, 1);
    assert_eq!(value, "X");

    let (result, shell) = server.join().expect("Shell panicked");
    result.expect("Shell failed");

    assert_eq!(shell.handler().parsed, 1);
    assert!(logger.contains(Level::Debug, "closed without sending data"));
}

#[test]
fn test_configured_buffer_size_reaches_parse() {
    let (values_tx, values_rx) = mpsc::channel();
    let run_flag = RunFlag::new();

    let shell = ShellBuilder::new("127.0.0.1", 0)
        .buffer_size(8)
        .run_flag(run_flag.clone())
        .build(Shout {
            values: values_tx,
            run_flag,
            parsed: 0,
        });
    let handle = shell.handle();
    let server = spawn_shell(shell);
    let port = wait_for(|| handle.local_port());

    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("Failed to connect");
    stream.write_all(b"abcdefgh").expect("Failed to write");

    let (_, value) = values_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Shell never processed the payload");
    assert_eq!(value, "ABCDEFGH");

    let (result, _) = server.join().expect("Shell panicked");
    result.expect("Shell failed");
}

#[test]
fn test_oversized_payload_is_read_once_and_dropped() {
    let (values_tx, values_rx) = mpsc::channel();
    let run_flag = RunFlag::new();

    let handler = Collect::new(values_tx, run_flag.clone(), 2);
    let events = handler.events.clone();
    let shell = ShellBuilder::new("127.0.0.1", 0)
        .run_flag(run_flag)
        .logger(Arc::new(RecordingLogger::default()))
        .build(handler);
    let handle = shell.handle();
    let server = spawn_shell(shell);
    let port = wait_for(|| handle.local_port());

    let mut first = TcpStream::connect(("127.0.0.1", port)).expect("Failed to connect");
    first.write_all(&[1u8; 6000]).expect("Failed to write");

    let value = values_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Shell never processed the first payload");
    assert_eq!(value.len(), 4096);
    assert!(value.iter().all(|&b| b == 1));

    // The rest is never read; the connection is closed instead.
    let mut rest = [0u8; 64];
    assert!(!matches!(first.read(&mut rest), Ok(n) if n > 0));

    let mut second = TcpStream::connect(("127.0.0.1", port)).expect("Failed to connect");
    second.write_all(b"z").expect("Failed to write");

    let value = values_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Shell never processed the second payload");
    assert_eq!(value[0], b'z');
    assert!(value[1..].iter().all(|&b| b == 0));

    let (result, _) = server.join().expect("Shell panicked");
    result.expect("Shell failed");
    assert_eq!(
        *events.lock().unwrap(),
        vec!["start", "process", "process", "stop"]
    );
}

/// Closes `stream` with a reset instead of a FIN.
fn reset(stream: TcpStream) {
    let linger = libc::linger {
        l_onoff: 1,
        l_linger: 0,
    };
    let rc = unsafe {
        libc::setsockopt(
            stream.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_LINGER,
            &linger as *const libc::linger as *const libc::c_void,
            mem::size_of::<libc::linger>() as libc::socklen_t,
        )
    };
    assert_eq!(rc, 0, "Failed to set SO_LINGER");
    drop(stream);
}

#[test]
fn test_failed_read_is_logged_and_skips_parse() {
    let (values_tx, values_rx) = mpsc::channel();
    let run_flag = RunFlag::new();
    let logger = Arc::new(RecordingLogger::default());

    let shell = ShellBuilder::new("127.0.0.1", 0)
        .run_flag(run_flag.clone())
        .logger(logger.clone())
        .build(Shout {
            values: values_tx,
            run_flag,
            parsed: 0,
        });
    let handle = shell.handle();
    let server = spawn_shell(shell);
    let port = wait_for(|| handle.local_port());

    reset(TcpStream::connect(("127.0.0.1", port)).expect("Failed to connect"));

    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("Failed to connect");
    stream.write_all(b"ok").expect("Failed to write");

    let (parsed, value) = values_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("Shell never processed the payload");
    assert_eq!(parsed, 1);
    assert_eq!(value, "OK");

    let (result, shell) = server.join().expect("Shell panicked");
    result.expect("Shell failed");

    assert_eq!(shell.handler().parsed, 1);
    assert!(logger.contains(Level::Warn, "Could not read from '127.0.0.1:"));
}

#[test]
fn test_setup_failure_records_exit_reason() {
    let occupied = TcpListener::bind("0.0.0.0:0").expect("Failed to bind listener");
    let port = occupied.local_addr().expect("Failed to get address").port();

    let (values_tx, _values_rx) = mpsc::channel();
    let handler = Collect::new(values_tx, RunFlag::new(), 1);
    let events = handler.events.clone();

    let mut shell = ShellBuilder::new("127.0.0.1", port)
        .logger(Arc::new(RecordingLogger::default()))
        .build(handler);

    let error = shell.start().expect_err("Bound to an occupied port");

    assert!(matches!(error, SocketError::Bind { .. }));
    assert_eq!(error.kind(), FailureKind::Setup);
    assert!(
        shell
            .exit_reason()
            .expect("No exit reason recorded")
            .starts_with("Could not bind to '0.0.0.0:")
    );
    assert_eq!(*events.lock().unwrap(), vec!["start", "stop"]);
    assert!(!shell.handle().is_running());
    assert_eq!(shell.handle().local_port(), None);
}

#[test]
fn test_stop_from_another_thread_after_next_accept() {
    let (values_tx, _values_rx) = mpsc::channel();
    let handler = Collect::new(values_tx, RunFlag::new(), usize::MAX);

    let shell = ShellBuilder::new("127.0.0.1", 0)
        .logger(Arc::new(RecordingLogger::default()))
        .build(handler);
    let handle = shell.handle();
    let server = spawn_shell(shell);
    let port = wait_for(|| handle.local_port());
    assert!(handle.is_running());

    handle.stop();
    // The loop only sees the request once the pending accept returns.
    drop(TcpStream::connect(("127.0.0.1", port)).expect("Failed to connect"));

    let (result, shell) = server.join().expect("Shell panicked");
    result.expect("Shell failed");

    assert!(!handle.is_running());
    assert_eq!(
        *shell.into_handler().events.lock().unwrap(),
        vec!["start", "stop"]
    );
}
