use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::thread::sleep;
use std::time::Duration;

/// Minimal blocking client for the text protocol. Replies are returned as
/// the raw bytes read off the wire (CR LF included) so tests can assert
/// them exactly.
pub struct TextClient {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

// not every test binary uses every helper
#[allow(dead_code)]
impl TextClient {
    /// Connects with retries so tests do not race server startup.
    pub fn connect(address: &str) -> TextClient {
        let mut last_error = None;
        for _ in 0..100 {
            match TcpStream::connect(address) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(Duration::from_secs(5)))
                        .unwrap();
                    let reader = BufReader::new(stream.try_clone().unwrap());
                    return TextClient { stream, reader };
                }
                Err(err) => {
                    last_error = Some(err);
                    sleep(Duration::from_millis(20));
                }
            }
        }
        panic!("could not connect to {}: {:?}", address, last_error);
    }

    /// Sends one line, appending the CR LF terminator.
    pub fn send_line(&mut self, line: &str) {
        self.stream.write_all(line.as_bytes()).unwrap();
        self.stream.write_all(b"\r\n").unwrap();
        self.stream.flush().unwrap();
    }

    /// Reads one LF-terminated line, returned raw. An empty string means
    /// the server closed the connection.
    pub fn read_line(&mut self) -> String {
        let mut line = Vec::new();
        self.reader.read_until(b'\n', &mut line).unwrap();
        String::from_utf8(line).unwrap()
    }

    /// Reads reply lines until (and including) the END terminator.
    pub fn read_until_end(&mut self) -> String {
        let mut reply = String::new();
        loop {
            let line = self.read_line();
            let done = line == "END\r\n" || line.is_empty();
            reply.push_str(&line);
            if done {
                return reply;
            }
        }
    }

    /// Issues a set and returns the raw reply line.
    pub fn set(&mut self, key: &str, flags: u32, value: &str) -> String {
        self.send_line(&format!("set {} {} 0 {}", key, flags, value.len()));
        self.send_line(value);
        self.read_line()
    }

    /// Issues a get and returns the raw multi-line reply.
    pub fn get(&mut self, keys: &str) -> String {
        self.send_line(&format!("get {}", keys));
        self.read_until_end()
    }

    /// Issues a gets and returns the raw multi-line reply.
    pub fn gets(&mut self, keys: &str) -> String {
        self.send_line(&format!("gets {}", keys));
        self.read_until_end()
    }

    /// Issues a delete and returns the raw reply line.
    pub fn delete(&mut self, key: &str) -> String {
        self.send_line(&format!("delete {}", key));
        self.read_line()
    }

    /// Issues a cas and returns the raw reply line.
    pub fn cas(&mut self, key: &str, flags: u32, token: u64, value: &str) -> String {
        self.send_line(&format!(
            "cas {} {} 0 {} {}",
            key,
            flags,
            value.len(),
            token
        ));
        self.send_line(value);
        self.read_line()
    }

    /// Extracts the cas token from the first VALUE line of a gets reply.
    pub fn cas_token(gets_reply: &str) -> u64 {
        let value_line = gets_reply
            .lines()
            .find(|line| line.starts_with("VALUE "))
            .expect("gets reply without VALUE line");
        let token = value_line
            .split_whitespace()
            .nth(4)
            .expect("VALUE line without cas token");
        token.parse().unwrap()
    }
}
