//! Binary ledger record model and decoder
//!
//! The source database stores ledger headers, transaction envelopes, results,
//! metas and fee change sets as base64 encoded XDR. Records are decoded into
//! the closed types in [`types`]; an unknown discriminant or malformed length
//! is a [`DecodeError`] and never silently skipped.
//!
//! Records up to protocol 15 are covered: operation types 0 through 13 and
//! account, trustline, offer and data entries. Protocol 14 sponsorship
//! extensions and result codes are read, since every entry of a protocol 14
//! ledger may carry them. Claimable balance and sponsorship operations and
//! claimable balance entries are not modelled, so a ledger holding one stops
//! decoding with `UnknownDiscriminant` rather than being indexed partially.

mod decode;
pub mod types;

pub use decode::SignaturePayload;
pub use types::*;

use crate::core::error::DecodeError;
use base64::Engine;

/// Cursor over an XDR encoded byte slice
pub struct XdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> XdrReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Bytes consumed between `start` and the current position
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.buf[start..self.pos]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn skip_padding(&mut self, len: usize) -> Result<(), DecodeError> {
        let pad = (4 - len % 4) % 4;
        let offset = self.pos;
        if self.take(pad)?.iter().any(|b| *b != 0) {
            return Err(DecodeError::NonZeroPadding { offset });
        }
        Ok(())
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let hi = u64::from(self.read_u32()?);
        let lo = u64::from(self.read_u32()?);
        Ok((hi << 32) | lo)
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.read_i32()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::UnknownDiscriminant { kind: "bool", value }),
        }
    }

    /// Fixed-length opaque data
    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        self.skip_padding(N)?;
        Ok(out)
    }

    /// Variable-length opaque data (also used for XDR strings)
    pub fn read_opaque(&mut self, kind: &'static str, max: usize) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_u32()? as usize;
        if len > max {
            return Err(DecodeError::LengthExceeded { kind, len, max });
        }
        let bytes = self.take(len)?.to_vec();
        self.skip_padding(len)?;
        Ok(bytes)
    }

    pub fn read_optional<T: ReadXdr>(&mut self) -> Result<Option<T>, DecodeError> {
        if self.read_bool()? {
            Ok(Some(T::read_xdr(self)?))
        } else {
            Ok(None)
        }
    }

    pub fn read_array<T: ReadXdr>(&mut self, kind: &'static str, max: usize) -> Result<Vec<T>, DecodeError> {
        let len = self.read_u32()? as usize;
        if len > max {
            return Err(DecodeError::LengthExceeded { kind, len, max });
        }
        // Each element takes at least 4 bytes, cap preallocation by what is left
        let mut items = Vec::with_capacity(len.min(self.remaining() / 4));
        for _ in 0..len {
            items.push(T::read_xdr(self)?);
        }
        Ok(items)
    }

    /// An extension point union whose only known arm is `v = 0`
    pub fn read_empty_ext(&mut self, kind: &'static str) -> Result<(), DecodeError> {
        match self.read_i32()? {
            0 => Ok(()),
            value => Err(DecodeError::UnknownDiscriminant { kind, value }),
        }
    }

    pub fn finish(&self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }
}

/// Unbounded length for arrays declared without a maximum
pub const UNBOUNDED: usize = u32::MAX as usize;

/// Types that can be decoded from XDR
pub trait ReadXdr: Sized {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError>;

    /// Decode a complete record, rejecting trailing bytes
    fn from_xdr(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = XdrReader::new(bytes);
        let value = Self::read_xdr(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }

    fn from_xdr_base64(encoded: &str) -> Result<Self, DecodeError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        Self::from_xdr(&bytes)
    }
}

impl ReadXdr for u32 {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        r.read_u32()
    }
}

impl ReadXdr for i32 {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        r.read_i32()
    }
}

impl ReadXdr for u64 {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        r.read_u64()
    }
}

impl ReadXdr for i64 {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        r.read_i64()
    }
}

impl ReadXdr for [u8; 32] {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, DecodeError> {
        r.read_fixed::<32>()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal XDR writer for building fixtures in tests

    #[derive(Default)]
    pub struct XdrWriter {
        pub buf: Vec<u8>,
    }

    impl XdrWriter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn u32(&mut self, v: u32) -> &mut Self {
            self.buf.extend_from_slice(&v.to_be_bytes());
            self
        }

        pub fn i32(&mut self, v: i32) -> &mut Self {
            self.buf.extend_from_slice(&v.to_be_bytes());
            self
        }

        pub fn u64(&mut self, v: u64) -> &mut Self {
            self.buf.extend_from_slice(&v.to_be_bytes());
            self
        }

        pub fn i64(&mut self, v: i64) -> &mut Self {
            self.buf.extend_from_slice(&v.to_be_bytes());
            self
        }

        pub fn fixed(&mut self, bytes: &[u8]) -> &mut Self {
            self.buf.extend_from_slice(bytes);
            let pad = (4 - bytes.len() % 4) % 4;
            self.buf.extend(std::iter::repeat(0u8).take(pad));
            self
        }

        pub fn opaque(&mut self, bytes: &[u8]) -> &mut Self {
            self.u32(bytes.len() as u32);
            self.fixed(bytes)
        }

        /// PublicKey / AccountID with the given 32 byte key
        pub fn account(&mut self, key: [u8; 32]) -> &mut Self {
            self.i32(0).fixed(&key)
        }

        pub fn native_asset(&mut self) -> &mut Self {
            self.i32(0)
        }

        pub fn credit4(&mut self, code: &[u8; 4], issuer: [u8; 32]) -> &mut Self {
            self.i32(1).fixed(code).account(issuer)
        }

        /// LedgerEntry wrapping an AccountEntry with no extensions
        pub fn account_entry(&mut self, key: [u8; 32], balance: i64) -> &mut Self {
            self.u32(1) // lastModifiedLedgerSeq
                .i32(0) // ACCOUNT
                .account(key)
                .i64(balance)
                .i64(1) // seqNum
                .u32(0) // numSubEntries
                .u32(0) // inflationDest absent
                .u32(0) // flags
                .opaque(b"") // homeDomain
                .fixed(&[1, 0, 0, 0]) // thresholds
                .u32(0) // signers
                .i32(0) // account ext
                .i32(0) // ledger entry ext
        }

        pub fn into_bytes(self) -> Vec<u8> {
            self.buf
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_primitives() {
        let bytes = [0, 0, 0, 7, 0xff, 0xff, 0xff, 0xfe, 0, 0, 0, 1, 0, 0, 0, 2];
        let mut r = XdrReader::new(&bytes);
        assert_eq!(r.read_u32().unwrap(), 7);
        assert_eq!(r.read_i32().unwrap(), -2);
        assert_eq!(r.read_u64().unwrap(), (1u64 << 32) | 2);
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_opaque_padding_and_limits() {
        let bytes = [0, 0, 0, 3, b'a', b'b', b'c', 0];
        let mut r = XdrReader::new(&bytes);
        assert_eq!(r.read_opaque("string", 28).unwrap(), b"abc".to_vec());

        let mut r = XdrReader::new(&bytes);
        assert_eq!(
            r.read_opaque("string", 2),
            Err(DecodeError::LengthExceeded { kind: "string", len: 3, max: 2 })
        );

        let dirty = [0, 0, 0, 1, b'a', 0, 1, 0];
        let mut r = XdrReader::new(&dirty);
        assert_eq!(r.read_opaque("string", 28), Err(DecodeError::NonZeroPadding { offset: 5 }));
    }

    #[test]
    fn test_truncated_input() {
        let mut r = XdrReader::new(&[0, 0, 1]);
        assert_eq!(r.read_u32(), Err(DecodeError::UnexpectedEof { offset: 0, needed: 1 }));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert_eq!(u32::from_xdr(&[0, 0, 0, 1, 0, 0, 0, 0]), Err(DecodeError::TrailingBytes(4)));
        assert_eq!(u32::from_xdr_base64("AAAAAQ==").unwrap(), 1);
    }
}
