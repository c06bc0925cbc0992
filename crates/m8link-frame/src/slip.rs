use bytes::{BufMut, BytesMut};

/// Frame delimiter.
pub const END: u8 = 0xC0;

/// Escape introducer.
pub const ESC: u8 = 0xDB;

/// Second byte of the escape pair standing for a literal `END`.
pub const ESC_END: u8 = 0xDC;

/// Second byte of the escape pair standing for a literal `ESC`.
pub const ESC_ESC: u8 = 0xDD;

/// Map the byte following `ESC` to the literal it stands for.
///
/// Returns `None` for any byte that does not form a valid escape pair.
pub const fn unescape(byte: u8) -> Option<u8> {
    match byte {
        ESC_END => Some(END),
        ESC_ESC => Some(ESC),
        _ => None,
    }
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────────────────────────┬──────────┐
/// │ Payload, END → ESC ESC_END,          │ END      │
/// │          ESC → ESC ESC_ESC           │ 0xC0     │
/// └──────────────────────────────────────┴──────────┘
/// ```
///
/// An empty payload encodes to a lone `END`, which a decoder treats as an
/// idle delimiter rather than a packet.
pub fn encode_packet(payload: &[u8], dst: &mut BytesMut) {
    let specials = payload.iter().filter(|&&b| b == END || b == ESC).count();
    dst.reserve(payload.len() + specials + 1);

    for &byte in payload {
        match byte {
            END => dst.put_slice(&[ESC, ESC_END]),
            ESC => dst.put_slice(&[ESC, ESC_ESC]),
            _ => dst.put_u8(byte),
        }
    }
    dst.put_u8(END);
}
