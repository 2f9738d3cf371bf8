//! Record splitting for child process output.
//!
//! Progress output may rewrite the current terminal line with `\r` instead of
//! ending it with `\n`, so records are delimited by either byte.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Reads an async stream and yields trimmed, non-empty text records.
pub struct RecordReader<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
}

impl<R> RecordReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            pending: Vec::new(),
        }
    }

    /// Returns the next record, or `None` at end of stream.
    pub async fn next_record(&mut self) -> io::Result<Option<String>> {
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                let record = take_record(&mut self.pending);
                return Ok((!record.is_empty()).then_some(record));
            }

            match buf.iter().position(|b| matches!(b, b'\n' | b'\r')) {
                Some(idx) => {
                    self.pending.extend_from_slice(&buf[..idx]);
                    self.reader.consume(idx + 1);
                    let record = take_record(&mut self.pending);
                    if !record.is_empty() {
                        return Ok(Some(record));
                    }
                }
                None => {
                    let n = buf.len();
                    self.pending.extend_from_slice(buf);
                    self.reader.consume(n);
                }
            }
        }
    }
}

fn take_record(pending: &mut Vec<u8>) -> String {
    let record = String::from_utf8_lossy(pending).trim().to_string();
    pending.clear();
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn collect(input: &'static [u8]) -> Vec<String> {
        let (mut tx, rx) = tokio::io::duplex(16);
        tokio::spawn(async move {
            let _ = tx.write_all(input).await;
        });

        let mut reader = RecordReader::new(rx);
        let mut records = Vec::new();
        while let Some(record) = reader.next_record().await.unwrap() {
            records.push(record);
        }
        records
    }

    #[tokio::test]
    async fn splits_on_cr_and_lf() {
        let records = collect(b"one\rtwo\nthree\r\nfour").await;
        assert_eq!(records, vec!["one", "two", "three", "four"]);
    }

    #[tokio::test]
    async fn skips_blank_records_and_spans_reads() {
        let records =
            collect(b"\n\nat:1.2MiB/s eta:00:05 per:42.0%\n   \n[download] Destination: a.mp4\n").await;
        assert_eq!(
            records,
            vec!["at:1.2MiB/s eta:00:05 per:42.0%", "[download] Destination: a.mp4"]
        );
    }
}
