//! Non-destructive reads over seekable streams.
//!
//! Every decoder wraps its input in a [`Rewind`]. Dropping the guard without
//! calling [`Rewind::commit`] seeks back to where decoding started, so a
//! failed decoder leaves the stream unconsumed for the next one.

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::ImageError;

pub(crate) struct Rewind<'a, R: Read + Seek + ?Sized> {
    inner: &'a mut R,
    start: u64,
    armed: bool,
}

impl<'a, R: Read + Seek + ?Sized> Rewind<'a, R> {
    pub(crate) fn new(inner: &'a mut R) -> Result<Self, ImageError> {
        let start = inner.stream_position()?;
        Ok(Self {
            inner,
            start,
            armed: true,
        })
    }

    /// Keep the current position when the guard goes away.
    pub(crate) fn commit(mut self) {
        self.armed = false;
    }

    /// Bytes between the current position and the end of the stream.
    pub(crate) fn remaining(&mut self) -> Result<u64, ImageError> {
        let pos = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(end.saturating_sub(pos))
    }

    /// Seek to `offset` bytes past the position the guard was created at.
    pub(crate) fn seek_from_start(&mut self, offset: u64) -> Result<(), ImageError> {
        let target = self
            .start
            .checked_add(offset)
            .ok_or(ImageError::UnexpectedEof)?;
        self.inner.seek(SeekFrom::Start(target))?;
        Ok(())
    }

    /// Bytes consumed since the guard was created.
    pub(crate) fn consumed(&mut self) -> Result<u64, ImageError> {
        Ok(self.inner.stream_position()?.saturating_sub(self.start))
    }

    /// Read a fixed-size signature/header block. A stream too short to hold
    /// it cannot be this format, so EOF maps to `UnrecognizedFormat`.
    pub(crate) fn read_magic<const N: usize>(&mut self) -> Result<[u8; N], ImageError> {
        let mut buf = [0u8; N];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(ImageError::UnrecognizedFormat)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ImageError> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn read_full(&mut self, buf: &mut [u8]) -> Result<(), ImageError> {
        self.inner.read_exact(buf)?;
        Ok(())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, ImageError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Skip `n` bytes that must exist in the stream.
    pub(crate) fn skip(&mut self, n: u64) -> Result<(), ImageError> {
        if n > self.remaining()? {
            return Err(ImageError::UnexpectedEof);
        }
        let n = i64::try_from(n).map_err(|_| ImageError::UnexpectedEof)?;
        self.inner.seek(SeekFrom::Current(n))?;
        Ok(())
    }
}

impl<R: Read + Seek + ?Sized> Read for Rewind<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Seek + ?Sized> Seek for Rewind<'_, R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<R: Read + Seek + ?Sized> Drop for Rewind<'_, R> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.inner.seek(SeekFrom::Start(self.start)) {
                tracing::warn!(start = self.start, error = %e, "failed to rewind image stream");
            }
        }
    }
}

pub(crate) fn le_u16(b: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([b[off], b[off + 1]])
}

pub(crate) fn le_u32(b: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

pub(crate) fn le_i32(b: &[u8], off: usize) -> i32 {
    le_u32(b, off) as i32
}
