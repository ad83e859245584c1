//! EAP-TLS packet extraction and reply composition.
//!
//! Extraction turns the type data of a classified response into the TLS
//! bytes it carries. Composition is the inverse for the replies the server
//! sends: Start, fragment ACK, data Request, Success and Failure.

use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    byteorder::{BigEndian, U32},
};

use crate::{Code, EapMessage, ProtocolError, Result, TlsFlags, TlsStatus};

/// Flag byte followed by the four octet TLS Message Length
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct LengthPrefix {
    _flags: u8,
    total_len: U32<BigEndian>,
}

/// Size of the flag byte
pub const FLAGS_LEN: usize = 1;

/// Size of the TLS Message Length field
pub const LENGTH_FIELD_LEN: usize = 4;

/// Flag byte plus length field
pub const LENGTH_PREFIX_LEN: usize = FLAGS_LEN + LENGTH_FIELD_LEN;

/// Read the TLS Message Length if the L bit is set.
///
/// Returns `Ok(None)` when the packet has no length field and
/// [`ProtocolError::LengthFieldMissing`] when L is set but fewer than five
/// bytes of type data are present.
pub fn declared_length(type_data: &[u8]) -> Result<Option<u32>> {
    let Some(&flags) = type_data.first() else {
        return Ok(None);
    };
    if !TlsFlags::from_byte(flags).length_included() {
        return Ok(None);
    }

    let (prefix, _) =
        LengthPrefix::read_from_prefix(type_data).map_err(|_| ProtocolError::LengthFieldMissing)?;
    Ok(Some(prefix.total_len.get()))
}

/// TLS data carried by one inbound EAP-TLS response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPacket {
    /// Outer code, copied from the response
    pub code: Code,
    /// Identifier, copied from the response
    pub id: u8,
    /// EAP length minus the method type octet
    pub length: usize,
    /// Flag byte
    pub flags: TlsFlags,
    /// Fragment payload
    pub data: Bytes,
}

impl TlsPacket {
    /// Extract the fragment from `msg` according to how it was classified.
    ///
    /// A declared length larger than `max_record_size` fails before any
    /// payload is sliced out. A declared length larger than the bytes that
    /// actually arrived is clamped to what arrived.
    pub fn extract(msg: &EapMessage, status: TlsStatus, max_record_size: u32) -> Result<Self> {
        if status == TlsStatus::Invalid {
            return Err(ProtocolError::NotExtractable(status));
        }

        let type_data = &msg.type_data;
        let Some(&flag_byte) = type_data.first() else {
            return Err(ProtocolError::TooShort { expected: FLAGS_LEN, actual: 0 });
        };
        let flags = TlsFlags::from_byte(flag_byte);

        let declared = declared_length(type_data)?;
        if let Some(size) = declared.filter(|&size| size > max_record_size) {
            return Err(ProtocolError::RecordTooLarge { size, max: max_record_size });
        }

        let data = match status {
            TlsStatus::FirstFragment { .. }
            | TlsStatus::LengthIncludedComplete { .. }
            | TlsStatus::MoreFragmentsWithLength => {
                let declared = declared.ok_or(ProtocolError::LengthFieldMissing)? as usize;
                let available = type_data.len() - LENGTH_PREFIX_LEN;
                type_data.slice(LENGTH_PREFIX_LEN..LENGTH_PREFIX_LEN + declared.min(available))
            },
            TlsStatus::MoreFragments | TlsStatus::Ok => type_data.slice(FLAGS_LEN..),
            other => return Err(ProtocolError::NotExtractable(other)),
        };

        Ok(Self {
            code: msg.code,
            id: msg.id,
            length: msg.wire_len() - 1,
            flags,
            data,
        })
    }
}

/// Kind of reply the server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// EAP-TLS Start
    Start,
    /// Fragment acknowledgement
    Ack,
    /// TLS data
    Request,
    /// Handshake succeeded
    Success,
    /// Handshake failed
    Fail,
}

impl ReplyKind {
    /// Outer EAP code for this reply.
    pub fn code(self) -> Code {
        match self {
            Self::Start | Self::Ack | Self::Request => Code::Request,
            Self::Success => Code::Success,
            Self::Fail => Code::Failure,
        }
    }
}

/// Reply before it is laid out on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsReply {
    /// What this reply is
    pub kind: ReplyKind,
    /// Flag byte
    pub flags: TlsFlags,
    /// Length field (if L is set) followed by the fragment
    pub data: Bytes,
}

impl TlsReply {
    /// Start request. Carries the S bit and no data.
    pub fn start(passthrough: TlsFlags) -> Self {
        Self { kind: ReplyKind::Start, flags: passthrough.passthrough() | TlsFlags::START, data: Bytes::new() }
    }

    /// Fragment ACK. Carries only the passthrough bits.
    pub fn ack(passthrough: TlsFlags) -> Self {
        Self { kind: ReplyKind::Ack, flags: passthrough.passthrough(), data: Bytes::new() }
    }

    /// Success with no data.
    pub fn success(passthrough: TlsFlags) -> Self {
        Self { kind: ReplyKind::Success, flags: passthrough.passthrough(), data: Bytes::new() }
    }

    /// Failure with no data.
    pub fn fail(passthrough: TlsFlags) -> Self {
        Self { kind: ReplyKind::Fail, flags: passthrough.passthrough(), data: Bytes::new() }
    }

    /// Data request. The `total_len` prefix is written when given, and sets L.
    pub fn request(flags: TlsFlags, total_len: Option<u32>, fragment: &[u8]) -> Self {
        let mut flags = flags;
        let mut data = BytesMut::with_capacity(LENGTH_FIELD_LEN + fragment.len());
        if let Some(total) = total_len {
            data.put_u32(total);
            flags |= TlsFlags::LENGTH_INCLUDED;
        }
        data.put_slice(fragment);
        Self { kind: ReplyKind::Request, flags, data: data.freeze() }
    }

    /// Lay out the type data: flag byte, then the data if any.
    pub fn compose(&self) -> ComposedReply {
        let mut type_data = BytesMut::with_capacity(FLAGS_LEN + self.data.len());
        type_data.put_u8(self.flags.bits());
        if !self.data.is_empty() {
            type_data.put_slice(&self.data);
        }
        ComposedReply { code: self.kind.code(), type_data: type_data.freeze() }
    }
}

/// Composed reply, ready to be wrapped in an EAP envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedReply {
    /// Outer EAP code
    pub code: Code,
    /// Flag byte followed by the data
    pub type_data: Bytes,
}

impl ComposedReply {
    /// Wrap in an EAP envelope.
    pub fn into_message(self, id: u8, method: u8) -> EapMessage {
        EapMessage { code: self.code, id, method, type_data: self.type_data }
    }
}
