//! Outer EAP envelope.
//!
//! ```text
//! +--------+--------+-----------------+--------+----------------
//! |  Code  |   Id   |     Length      |  Type  |  Type-Data ...
//! +--------+--------+-----------------+--------+----------------
//! ```
//!
//! Success and Failure carry the four octet header only.

use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    byteorder::{BigEndian, U16},
};

use crate::{Code, ProtocolError, Result};

/// Fixed EAP header (code, identifier, length)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct EapHeader {
    code: u8,
    id: u8,
    length: U16<BigEndian>,
}

/// One EAP packet, with the method type split out from its type data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapMessage {
    /// Outer code
    pub code: Code,
    /// Identifier, used to pair responses with requests
    pub id: u8,
    /// Method type octet (13 for EAP-TLS)
    pub method: u8,
    /// Everything after the method type octet
    pub type_data: Bytes,
}

impl EapMessage {
    /// Size of the code/id/length header
    pub const HEADER_LEN: usize = 4;

    /// Method type for EAP-TLS
    pub const TYPE_TLS: u8 = 13;

    /// Build a message from its parts.
    pub fn new(code: Code, id: u8, method: u8, type_data: impl Into<Bytes>) -> Self {
        Self { code, id, method, type_data: type_data.into() }
    }

    /// Length that will be written into the header.
    pub fn wire_len(&self) -> usize {
        if self.code.has_type() { Self::HEADER_LEN + 1 + self.type_data.len() } else { Self::HEADER_LEN }
    }

    /// Decode one packet. Bytes past the header's length are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let (header, _) = EapHeader::read_from_prefix(buf).map_err(|_| {
            ProtocolError::EnvelopeTooShort { expected: Self::HEADER_LEN, actual: buf.len() }
        })?;

        let code = Code::from_u8(header.code).ok_or(ProtocolError::UnknownCode(header.code))?;
        let declared = usize::from(header.length.get());
        if declared < Self::HEADER_LEN || declared > buf.len() {
            return Err(ProtocolError::LengthMismatch { declared, actual: buf.len() });
        }

        if !code.has_type() {
            return Ok(Self { code, id: header.id, method: 0, type_data: Bytes::new() });
        }

        if declared < Self::HEADER_LEN + 1 {
            return Err(ProtocolError::EnvelopeTooShort {
                expected: Self::HEADER_LEN + 1,
                actual: declared,
            });
        }

        Ok(Self {
            code,
            id: header.id,
            method: buf[Self::HEADER_LEN],
            type_data: Bytes::copy_from_slice(&buf[Self::HEADER_LEN + 1..declared]),
        })
    }

    /// Encode into `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        let len = self.wire_len();
        let header =
            EapHeader { code: self.code.to_u8(), id: self.id, length: U16::new(len as u16) };

        dst.reserve(len);
        dst.put_slice(header.as_bytes());
        if self.code.has_type() {
            dst.put_u8(self.method);
            dst.put_slice(&self.type_data);
        }
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.encode(&mut buf);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn decode_response_with_type_data() {
        let raw = hex!("02 07 0007 0d 80 aa");
        let msg = EapMessage::decode(&raw).unwrap();

        assert_eq!(msg.code, Code::Response);
        assert_eq!(msg.id, 7);
        assert_eq!(msg.method, EapMessage::TYPE_TLS);
        assert_eq!(&msg.type_data[..], &[0x80, 0xaa]);
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let raw = hex!("02 01 0006 0d 00 ff ff");
        let msg = EapMessage::decode(&raw).unwrap();
        assert_eq!(&msg.type_data[..], &[0x00]);
    }

    #[test]
    fn decode_rejects_length_past_buffer() {
        let raw = hex!("02 01 0010 0d 00");
        assert_eq!(
            EapMessage::decode(&raw),
            Err(ProtocolError::LengthMismatch { declared: 16, actual: 6 })
        );
    }

    #[test]
    fn decode_rejects_short_header() {
        assert!(matches!(
            EapMessage::decode(&[0x02, 0x01]),
            Err(ProtocolError::EnvelopeTooShort { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn decode_rejects_unknown_code() {
        let raw = hex!("09 01 0004");
        assert_eq!(EapMessage::decode(&raw), Err(ProtocolError::UnknownCode(9)));
    }

    #[test]
    fn success_encodes_header_only() {
        let msg = EapMessage::new(Code::Success, 4, EapMessage::TYPE_TLS, vec![0x00]);
        assert_eq!(&msg.to_bytes()[..], &hex!("03 04 0004"));
    }

    #[test]
    fn request_round_trips() {
        let msg = EapMessage::new(Code::Request, 200, EapMessage::TYPE_TLS, vec![0x20]);
        let decoded = EapMessage::decode(&msg.to_bytes()).unwrap();
        assert_eq!(decoded, msg);
    }
}
