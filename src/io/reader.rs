use std::{
    fs::File,
    io::{self, prelude::*},
    path::Path,
    rc::Rc,
};

/// Line iterator over a buffered file that recycles a single line buffer.
///
/// Each item carries the 1-based line number and the line with its trailing
/// newline (and carriage return) removed.
pub struct TextReader<R = File> {
    reader: io::BufReader<R>,
    buf: Rc<String>,
    line_number: usize,
}

const LINE_CAPACITY: usize = 4 * 1024;

impl TextReader<File> {
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::with_capacity(file, capacity))
    }
}

impl<R: Read> TextReader<R> {
    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        TextReader {
            reader: io::BufReader::with_capacity(capacity, inner),
            buf: Rc::new(String::with_capacity(LINE_CAPACITY)),
            line_number: 0,
        }
    }
}

impl<R: Read> Iterator for TextReader<R> {
    type Item = io::Result<(usize, Rc<String>)>;

    fn next(&mut self) -> Option<Self::Item> {
        // the previous line may still be held by the caller
        let buf = Rc::make_mut(&mut self.buf);
        buf.clear();

        match self.reader.read_line(buf) {
            Ok(0) => None,
            Ok(_) => {
                let trimmed_len = buf.trim_end_matches(&['\n', '\r'][..]).len();
                buf.truncate(trimmed_len);
                self.line_number += 1;
                Some(Ok((self.line_number, Rc::clone(&self.buf))))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_numbered_lines_without_terminators() {
        let input = "first\r\nsecond\n\nlast";
        let lines: Vec<(usize, String)> = TextReader::with_capacity(input.as_bytes(), 16)
            .map(|l| l.map(|(n, s)| (n, s.to_string())))
            .collect::<io::Result<_>>()
            .unwrap();

        assert_eq!(
            lines,
            vec![
                (1, "first".to_string()),
                (2, "second".to_string()),
                (3, String::new()),
                (4, "last".to_string()),
            ]
        );
    }
}
