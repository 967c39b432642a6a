use crate::error::CoapError;

/// Bounds-checked reader over a borrowed buffer.  The position only moves through the `read_*`
/// and `take` methods, each of which fails with [`CoapError::InsufficientData`] instead of
/// running past the end.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Result<u8, CoapError> {
        let byte = self.peek().ok_or(CoapError::InsufficientData)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16, CoapError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CoapError> {
        if n > self.remaining() {
            return Err(CoapError::InsufficientData);
        }
        let taken = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_stop_at_end() {
        let mut cursor = Cursor::new(&[0x01, 0x02, 0x03]);
        assert_eq!(cursor.read_u8(), Ok(0x01));
        assert_eq!(cursor.read_u16(), Ok(0x0203));
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.read_u8(), Err(CoapError::InsufficientData));
    }

    #[test]
    fn test_failed_take_does_not_advance() {
        let mut cursor = Cursor::new(&[0xaa, 0xbb]);
        assert_eq!(cursor.take(3), Err(CoapError::InsufficientData));
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.take(2), Ok(&[0xaa, 0xbb][..]));
        assert_eq!(cursor.take(0), Ok(&[][..]));
    }
}
