//! Example: a listening container and a connecting container on two threads

use std::io::Read;
use std::thread;
use std::time::Duration;

use tcpsh::{ConnectionState, SocketContainer};

fn main() {
    env_logger::init();

    let mut server = SocketContainer::new();
    if let Err(e) = server.create() {
        eprintln!("Could not create server socket: {e}");
        return;
    }
    let server_handle = server.handle();

    let listener = thread::spawn(move || {
        let result = server.listen_on(6666, |peer, connection, handle| {
            let mut data = Vec::new();
            if connection.read_to_end(&mut data).is_ok() {
                println!("{peer} sent {:?}", String::from_utf8_lossy(&data));
            }
            handle.stop();
        });

        if let Err(e) = result {
            eprintln!("Server stopped: {e}");
        }
    });

    while server_handle.state() != ConnectionState::Listening && !listener.is_finished() {
        thread::sleep(Duration::from_millis(10));
    }

    let connector = thread::spawn(|| {
        let mut client = SocketContainer::new();
        if let Err(e) = client.create() {
            eprintln!("Could not create client socket: {e}");
            return;
        }

        let result = client.connect_to("127.0.0.1", 6666, |peer, connection, _| {
            match SocketContainer::write_to(connection, b"42\n") {
                Ok(n) => println!("Wrote {n} bytes to {peer}"),
                Err(e) => eprintln!("Write failed: {e}"),
            }
        });

        if let Err(e) = result {
            eprintln!("Client stopped: {e}");
        }
    });

    let _ = connector.join();
    let _ = listener.join();
}
