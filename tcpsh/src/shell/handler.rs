/// Bytes received from one connection.
///
/// `buffer` is always the full fixed-size read buffer, zero-filled past
/// the bytes the single read produced.
#[derive(Debug, Clone, Copy)]
pub struct Received<'a> {
    buffer: &'a [u8],
    len: usize,
}

impl<'a> Received<'a> {
    pub(crate) fn new(buffer: &'a [u8], len: usize) -> Self {
        Self { buffer, len }
    }

    /// Returns the whole read buffer.
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Returns the number of bytes the read produced.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns only the bytes the read produced.
    pub fn filled(&self) -> &'a [u8] {
        &self.buffer[..self.len]
    }
}

/// Conversion from a raw read buffer, with no validation.
pub trait FromBuffer {
    fn from_buffer(buffer: &[u8]) -> Self;
}

impl FromBuffer for Vec<u8> {
    fn from_buffer(buffer: &[u8]) -> Self {
        buffer.to_vec()
    }
}

impl FromBuffer for Box<[u8]> {
    fn from_buffer(buffer: &[u8]) -> Self {
        buffer.into()
    }
}

impl FromBuffer for String {
    /// Reads up to the first NUL byte, like a C string. Invalid UTF-8 is
    /// replaced, not rejected.
    fn from_buffer(buffer: &[u8]) -> Self {
        let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());

        String::from_utf8_lossy(&buffer[..end]).into_owned()
    }
}

/// Hooks a [`TcpShell`](super::TcpShell) calls into.
///
/// Only `Value` is required; every hook has a default. For each
/// connection that delivers data, the shell calls
/// [`parse`](Self::parse) and then [`process`](Self::process).
///
/// # Examples
///
/// ```rust,ignore
/// struct Printer;
///
/// impl ShellHandler for Printer {
///     type Value = String;
///
///     fn process(&mut self, data: String) {
///         println!("Data: {data}");
///     }
/// }
/// ```
pub trait ShellHandler {
    /// Typed value produced from each received buffer.
    type Value: FromBuffer;

    /// Runs before the shell sets up its socket.
    fn on_start(&mut self) {}

    /// Runs after the accept loop ended or setup failed.
    fn on_stop(&mut self) {}

    /// Turns a received buffer into a value.
    ///
    /// By default the full buffer is handed to
    /// [`FromBuffer::from_buffer`].
    fn parse(&mut self, received: &Received<'_>) -> Self::Value {
        Self::Value::from_buffer(received.buffer())
    }

    /// Consumes a parsed value. Does nothing by default.
    fn process(&mut self, value: Self::Value) {
        let _ = value;
    }
}
