// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;
use std::io;
use std::io::{Read, Seek, SeekFrom};

use super::{MediaSource, ReadBytes};

const END_OF_STREAM_ERROR_STR: &str = "end of stream";

/// `SourceStreamOptions` specifies the buffering behaviour of a `SourceStream`.
pub struct SourceStreamOptions {
    /// The read-ahead buffer size.
    pub buffer_len: usize,
}

impl Default for SourceStreamOptions {
    fn default() -> Self {
        SourceStreamOptions { buffer_len: 32 * 1024 }
    }
}

/// A `SourceStream` is the buffered, seekable byte stream the demuxers read from.
///
/// It wraps any [`MediaSource`] behind dynamic dispatch and amortizes small reads over a
/// read-ahead buffer. Seeks that land inside the buffered window are served without touching
/// the inner source. The seekability and length of the source are queried once, on construction.
pub struct SourceStream {
    /// The source reader.
    inner: Box<dyn MediaSource>,
    /// The read-ahead buffer.
    buf: Box<[u8]>,
    /// The read position within the buffer.
    read_pos: usize,
    /// The number of valid bytes in the buffer.
    end_pos: usize,
    /// Absolute stream position of the first byte in the buffer. The inner source is always
    /// positioned at `base + end_pos`.
    base: u64,
    /// Cached seekability of the inner source.
    seekable: bool,
    /// Cached length of the inner source.
    byte_len: Option<u64>,
}

impl SourceStream {
    pub fn new(source: Box<dyn MediaSource>, options: SourceStreamOptions) -> Self {
        let seekable = source.is_seekable();
        let byte_len = source.byte_len();

        SourceStream {
            inner: source,
            buf: vec![0; cmp::max(options.buffer_len, 1)].into_boxed_slice(),
            read_pos: 0,
            end_pos: 0,
            base: 0,
            seekable,
            byte_len,
        }
    }

    /// Returns if the stream is seekable.
    pub fn is_seekable(&self) -> bool {
        self.seekable
    }

    /// Returns the length in bytes of the stream, if known.
    pub fn byte_len(&self) -> Option<u64> {
        self.byte_len
    }

    /// Seeks the stream, returning the new absolute position.
    ///
    /// Seeks that stay within the buffered window do not touch the inner source. Any other seek
    /// requires a seekable source.
    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(pos) => pos,
            SeekFrom::Current(delta) => {
                let cur = self.pos();
                if delta < 0 {
                    cur.checked_sub(delta.unsigned_abs()).ok_or_else(|| {
                        io::Error::new(io::ErrorKind::InvalidInput, "seek before start of stream")
                    })?
                }
                else {
                    cur.saturating_add(delta as u64)
                }
            }
            SeekFrom::End(delta) => {
                let len = self.byte_len.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::Unsupported, "stream length is unknown")
                })?;
                len.checked_add_signed(delta).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek before start of stream")
                })?
            }
        };

        if target >= self.base && target <= self.base + self.end_pos as u64 {
            self.read_pos = (target - self.base) as usize;
            return Ok(target);
        }

        if !self.seekable {
            // Forward seeks on an unseekable source can still be satisfied by reading.
            let cur = self.pos();
            if target < cur {
                return Err(io::Error::new(io::ErrorKind::Unsupported, "source is not seekable"));
            }
            self.discard(target - cur)?;
            return Ok(target);
        }

        self.inner.seek(SeekFrom::Start(target))?;
        self.base = target;
        self.read_pos = 0;
        self.end_pos = 0;

        Ok(target)
    }

    /// Refills the read-ahead buffer. Returns the number of bytes now available.
    fn fetch(&mut self) -> io::Result<usize> {
        if self.read_pos < self.end_pos {
            return Ok(self.end_pos - self.read_pos);
        }

        self.base += self.end_pos as u64;
        self.read_pos = 0;
        self.end_pos = 0;

        loop {
            match self.inner.read(&mut self.buf) {
                Ok(len) => {
                    self.end_pos = len;
                    return Ok(len);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    #[inline(always)]
    fn fetch_or_eof(&mut self) -> io::Result<()> {
        if self.fetch()? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, END_OF_STREAM_ERROR_STR));
        }
        Ok(())
    }

    /// Reads and throws away `count` bytes.
    fn discard(&mut self, mut count: u64) -> io::Result<()> {
        while count > 0 {
            self.fetch_or_eof()?;
            let len = cmp::min((self.end_pos - self.read_pos) as u64, count);
            self.read_pos += len as usize;
            count -= len;
        }
        Ok(())
    }
}

impl Read for SourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fetch()? == 0 {
            return Ok(0);
        }

        let len = cmp::min(self.end_pos - self.read_pos, buf.len());
        buf[..len].copy_from_slice(&self.buf[self.read_pos..self.read_pos + len]);
        self.read_pos += len;

        Ok(len)
    }
}

impl ReadBytes for SourceStream {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        if self.read_pos == self.end_pos {
            self.fetch_or_eof()?;
        }

        let value = self.buf[self.read_pos];
        self.read_pos += 1;
        Ok(value)
    }

    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        let mut bytes = [0; 2];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        let mut bytes = [0; 4];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_buf_exact(&mut self, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            self.fetch_or_eof()?;

            let len = cmp::min(self.end_pos - self.read_pos, buf.len());
            buf[..len].copy_from_slice(&self.buf[self.read_pos..self.read_pos + len]);
            self.read_pos += len;

            buf = &mut buf[len..];
        }
        Ok(())
    }

    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        let target = self.pos().checked_add(count).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek past the addressable range")
        })?;
        self.seek(SeekFrom::Start(target)).map(|_| ())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.base + self.read_pos as u64
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, SeekFrom};

    use super::{ReadBytes, SourceStream, SourceStreamOptions};

    /// Generate a random vector of bytes of the specified length using a PRNG.
    fn generate_random_bytes(len: usize) -> Box<[u8]> {
        let mut lcg: u32 = 0xec57c4bf;

        let mut bytes = vec![0; len];

        for quad in bytes.chunks_mut(4) {
            lcg = lcg.wrapping_mul(1664525).wrapping_add(1013904223);
            for (src, dest) in quad.iter_mut().zip(&lcg.to_ne_bytes()) {
                *src = *dest;
            }
        }

        bytes.into_boxed_slice()
    }

    #[test]
    fn verify_stream_read() {
        let data = generate_random_bytes(3 * 32 * 1024 + 17);

        let mut ss = SourceStream::new(Box::new(Cursor::new(data.clone())), Default::default());

        assert!(ss.is_seekable());
        assert_eq!(ss.byte_len(), Some(data.len() as u64));

        let mut buf = &data[..];

        for byte in &buf[..40 * 1024] {
            assert_eq!(*byte, ss.read_byte().unwrap());
        }

        ss.ignore_bytes(11).unwrap();
        buf = &buf[11 + 40 * 1024..];

        for bytes in buf[..4 * 1024].chunks_exact(4) {
            assert_eq!(bytes, &ss.read_quad_bytes().unwrap());
        }

        buf = &buf[4 * 1024..];

        let mut rest = Vec::new();
        ss.read_to_end(&mut rest).unwrap();
        assert_eq!(&rest[..], buf);
        assert!(ss.read_byte().is_err());
    }

    #[test]
    fn verify_stream_seek() {
        let data = generate_random_bytes(256 * 1024);

        let options = SourceStreamOptions { buffer_len: 4096 };
        let mut ss = SourceStream::new(Box::new(Cursor::new(data.clone())), options);

        // Seek far ahead, outside the buffered window.
        assert_eq!(ss.seek(SeekFrom::Start(100_000)).unwrap(), 100_000);
        assert_eq!(ss.read_byte().unwrap(), data[100_000]);

        // Seek backwards within the buffered window.
        assert_eq!(ss.seek(SeekFrom::Current(-1)).unwrap(), 100_000);
        assert_eq!(ss.pos(), 100_000);
        assert_eq!(ss.read_byte().unwrap(), data[100_000]);

        // Seek backwards outside the buffered window.
        ss.seek(SeekFrom::Start(7)).unwrap();
        let mut buf = [0; 9000];
        ss.read_buf_exact(&mut buf).unwrap();
        assert_eq!(&buf[..], &data[7..9007]);
        assert_eq!(ss.pos(), 9007);

        assert!(ss.seek(SeekFrom::Current(-10_000)).is_err());
    }
}
