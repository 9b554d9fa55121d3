//! MQTT 3.1.1 packet types and codec.
//!
//! Each packet type is a fixed-shape variant rather than an open map, so
//! missing or malformed fields fail at decode time instead of at some
//! later field access.

use bytes::Bytes;

use crate::error::{ProtocolError, Result};
use crate::frame::Frame;
use crate::varint;

/// MQTT Control Packet Types (4 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Connect = 1,
    Connack = 2,
    Publish = 3,
    Puback = 4,
    Pubrec = 5,
    Pubrel = 6,
    Pubcomp = 7,
    Subscribe = 8,
    Suback = 9,
    Unsubscribe = 10,
    Unsuback = 11,
    Pingreq = 12,
    Pingresp = 13,
    Disconnect = 14,
}

impl TryFrom<u8> for PacketType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(PacketType::Connect),
            2 => Ok(PacketType::Connack),
            3 => Ok(PacketType::Publish),
            4 => Ok(PacketType::Puback),
            5 => Ok(PacketType::Pubrec),
            6 => Ok(PacketType::Pubrel),
            7 => Ok(PacketType::Pubcomp),
            8 => Ok(PacketType::Subscribe),
            9 => Ok(PacketType::Suback),
            10 => Ok(PacketType::Unsubscribe),
            11 => Ok(PacketType::Unsuback),
            12 => Ok(PacketType::Pingreq),
            13 => Ok(PacketType::Pingresp),
            14 => Ok(PacketType::Disconnect),
            _ => Err(ProtocolError::InvalidPacketType(value)),
        }
    }
}

/// Quality of Service levels.
///
/// The broker reads requested QoS off the wire but always grants and
/// delivers at QoS 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
#[allow(clippy::enum_variant_names)] // MQTT spec names
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = ProtocolError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            _ => Err(ProtocolError::MalformedPacket(format!(
                "Invalid QoS: {}",
                value
            ))),
        }
    }
}

/// CONNACK return codes (MQTT 3.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[allow(dead_code)] // MQTT spec requires all variants
pub enum ConnackCode {
    Accepted = 0,
    UnacceptableProtocolVersion = 1,
    IdentifierRejected = 2,
    ServerUnavailable = 3,
    BadUsernamePassword = 4,
    NotAuthorized = 5,
}

/// MQTT packets the broker decodes or encodes.
#[derive(Debug, Clone)]
pub enum Packet {
    Connect(Connect),
    Connack(Connack),
    Publish(Publish),
    Subscribe(Subscribe),
    Suback(Suback),
    Unsubscribe(Unsubscribe),
    Unsuback { packet_id: u16 },
    Pingreq,
    Pingresp,
    Disconnect,
}

impl Packet {
    /// Human-readable packet name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Packet::Connect(_) => "CONNECT",
            Packet::Connack(_) => "CONNACK",
            Packet::Publish(_) => "PUBLISH",
            Packet::Subscribe(_) => "SUBSCRIBE",
            Packet::Suback(_) => "SUBACK",
            Packet::Unsubscribe(_) => "UNSUBSCRIBE",
            Packet::Unsuback { .. } => "UNSUBACK",
            Packet::Pingreq => "PINGREQ",
            Packet::Pingresp => "PINGRESP",
            Packet::Disconnect => "DISCONNECT",
        }
    }
}

/// CONNECT packet data.
///
/// Will, username, and password fields are parsed for stream consistency
/// but discarded: the broker implements neither will messages nor
/// authentication.
#[derive(Debug, Clone)]
pub struct Connect {
    pub protocol_name: String,
    pub protocol_level: u8,
    pub clean_session: bool,
    pub keep_alive: u16,
    pub client_id: String,
}

/// CONNACK packet data.
#[derive(Debug, Clone)]
pub struct Connack {
    pub session_present: bool,
    pub code: ConnackCode,
}

/// PUBLISH packet data.
#[derive(Debug, Clone)]
pub struct Publish {
    pub dup: bool,
    pub qos: QoS,
    pub retain: bool,
    pub topic: String,
    /// Present only when the QoS flag is non-zero; parsed and ignored.
    pub packet_id: Option<u16>,
    pub payload: Bytes,
}

/// SUBSCRIBE packet data.
#[derive(Debug, Clone)]
pub struct Subscribe {
    pub packet_id: u16,
    /// Topic filters with their requested QoS.
    pub topics: Vec<(String, QoS)>,
}

/// SUBACK packet data.
#[derive(Debug, Clone)]
pub struct Suback {
    pub packet_id: u16,
    /// One granted-QoS byte per requested filter. Always 0 here.
    pub return_codes: Vec<u8>,
}

/// UNSUBSCRIBE packet data.
#[derive(Debug, Clone)]
pub struct Unsubscribe {
    pub packet_id: u16,
    pub topics: Vec<String>,
}

/// Cursor over a packet body.
struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.buf.len() {
            return Err(ProtocolError::IncompletePacket { needed: 1, have: 0 }.into());
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_u16(&mut self) -> Result<u16> {
        if self.remaining() < 2 {
            return Err(ProtocolError::IncompletePacket {
                needed: 2,
                have: self.remaining(),
            }
            .into());
        }
        let val = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Ok(val)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(ProtocolError::IncompletePacket {
                needed: len,
                have: self.remaining(),
            }
            .into());
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        // MQTT-1.5.3-2: UTF-8 string MUST NOT contain null character U+0000
        if bytes.contains(&0u8) {
            return Err(ProtocolError::MalformedPacket(
                "UTF-8 string must not contain null character".into(),
            )
            .into());
        }
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8.into())
    }

    fn read_binary(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u16()? as usize;
        self.read_bytes(len)
    }
}

/// Decode a complete frame into a packet.
///
/// Only the six client-to-broker types the broker supports come out of
/// this successfully; broker-to-client types and the QoS 1/2 acknowledge
/// family are rejected as unexpected.
pub fn decode_frame(frame: &Frame) -> Result<Packet> {
    let packet_type = PacketType::try_from(frame.packet_type())?;
    let flags = frame.flags();
    let body = &frame.body[..];

    // MQTT-3.8.1-1 / MQTT-3.10.1-1: SUBSCRIBE and UNSUBSCRIBE fixed
    // header flags MUST be 0010.
    if matches!(packet_type, PacketType::Subscribe | PacketType::Unsubscribe) && flags != 0x02 {
        return Err(ProtocolError::MalformedPacket(format!(
            "{:?} fixed header flags must be 0x02, got {:#04x}",
            packet_type, flags
        ))
        .into());
    }

    match packet_type {
        PacketType::Connect => decode_connect(body),
        PacketType::Publish => decode_publish(flags, body),
        PacketType::Subscribe => decode_subscribe(body),
        PacketType::Unsubscribe => decode_unsubscribe(body),
        PacketType::Pingreq => Ok(Packet::Pingreq),
        PacketType::Disconnect => Ok(Packet::Disconnect),
        PacketType::Connack => Err(ProtocolError::UnexpectedPacket("CONNACK").into()),
        PacketType::Suback => Err(ProtocolError::UnexpectedPacket("SUBACK").into()),
        PacketType::Unsuback => Err(ProtocolError::UnexpectedPacket("UNSUBACK").into()),
        PacketType::Pingresp => Err(ProtocolError::UnexpectedPacket("PINGRESP").into()),
        PacketType::Puback => Err(ProtocolError::UnexpectedPacket("PUBACK").into()),
        PacketType::Pubrec => Err(ProtocolError::UnexpectedPacket("PUBREC").into()),
        PacketType::Pubrel => Err(ProtocolError::UnexpectedPacket("PUBREL").into()),
        PacketType::Pubcomp => Err(ProtocolError::UnexpectedPacket("PUBCOMP").into()),
    }
}

fn decode_connect(body: &[u8]) -> Result<Packet> {
    let mut dec = Decoder::new(body);

    // Protocol name and level are decoded structurally here; whether they
    // are acceptable (name "MQTT", level 4) is the connect handler's call,
    // because the rejection goes out as a CONNACK rather than a silent close.
    let protocol_name = dec.read_string()?;
    let protocol_level = dec.read_u8()?;

    let flags = dec.read_u8()?;
    let clean_session = (flags & 0x02) != 0;
    let will_flag = (flags & 0x04) != 0;
    let will_qos = (flags >> 3) & 0x03;
    let will_retain = (flags & 0x20) != 0;
    let password_flag = (flags & 0x40) != 0;
    let username_flag = (flags & 0x80) != 0;

    // Reserved bit must be 0
    if (flags & 0x01) != 0 {
        return Err(ProtocolError::InvalidConnectFlags(flags).into());
    }

    // MQTT-3.1.2-11/13: If Will Flag is 0, Will QoS MUST be 0
    if !will_flag && will_qos != 0 {
        return Err(ProtocolError::MalformedPacket(
            "Will QoS must be 0 when Will Flag is 0".into(),
        )
        .into());
    }

    // MQTT-3.1.2-15: If Will Flag is 0, Will Retain MUST be 0
    if !will_flag && will_retain {
        return Err(ProtocolError::MalformedPacket(
            "Will Retain must be 0 when Will Flag is 0".into(),
        )
        .into());
    }

    // MQTT-3.1.2-22: If Username Flag is 0, Password Flag MUST be 0
    if !username_flag && password_flag {
        return Err(ProtocolError::MalformedPacket(
            "Password Flag must be 0 when Username Flag is 0".into(),
        )
        .into());
    }

    let keep_alive = dec.read_u16()?;
    let client_id = dec.read_string()?;

    // Will topic/message, username, and password are parsed so the body
    // is consumed consistently, then dropped.
    if will_flag {
        dec.read_string()?;
        dec.read_binary()?;
    }
    if username_flag {
        dec.read_string()?;
    }
    if password_flag {
        dec.read_binary()?;
    }

    Ok(Packet::Connect(Connect {
        protocol_name,
        protocol_level,
        clean_session,
        keep_alive,
        client_id,
    }))
}

fn decode_publish(flags: u8, body: &[u8]) -> Result<Packet> {
    let dup = (flags & 0x08) != 0;
    let qos = QoS::try_from((flags >> 1) & 0x03)?;
    let retain = (flags & 0x01) != 0;

    let mut dec = Decoder::new(body);

    let topic = dec.read_string()?;
    if topic.is_empty() {
        return Err(ProtocolError::MalformedPacket("PUBLISH with empty topic".into()).into());
    }

    // The packet identifier is only on the wire when the QoS flag is set.
    // The broker never acknowledges it (QoS 0 contract) but must consume
    // it to find the payload start.
    let packet_id = if qos != QoS::AtMostOnce {
        Some(dec.read_u16()?)
    } else {
        None
    };

    let payload = dec.read_bytes(dec.remaining())?;

    Ok(Packet::Publish(Publish {
        dup,
        qos,
        retain,
        topic,
        packet_id,
        payload: Bytes::copy_from_slice(payload),
    }))
}

fn decode_subscribe(body: &[u8]) -> Result<Packet> {
    let mut dec = Decoder::new(body);
    let packet_id = dec.read_u16()?;

    let mut topics = Vec::new();
    while dec.remaining() > 0 {
        let topic = dec.read_string()?;

        // MQTT-4.7.0-1: Topic Filter must be at least 1 character
        if topic.is_empty() {
            return Err(ProtocolError::MalformedPacket(
                "Topic filter must be at least 1 character".into(),
            )
            .into());
        }

        let qos = QoS::try_from(dec.read_u8()?)?;
        topics.push((topic, qos));
    }

    if topics.is_empty() {
        return Err(ProtocolError::MalformedPacket("SUBSCRIBE with no topics".into()).into());
    }

    Ok(Packet::Subscribe(Subscribe { packet_id, topics }))
}

fn decode_unsubscribe(body: &[u8]) -> Result<Packet> {
    let mut dec = Decoder::new(body);
    let packet_id = dec.read_u16()?;

    let mut topics = Vec::new();
    while dec.remaining() > 0 {
        let topic = dec.read_string()?;

        if topic.is_empty() {
            return Err(ProtocolError::MalformedPacket(
                "Topic filter must be at least 1 character".into(),
            )
            .into());
        }

        topics.push(topic);
    }

    if topics.is_empty() {
        return Err(ProtocolError::MalformedPacket("UNSUBSCRIBE with no topics".into()).into());
    }

    Ok(Packet::Unsubscribe(Unsubscribe { packet_id, topics }))
}

/// Encode a broker-to-client packet into the provided buffer.
pub fn encode_packet(packet: &Packet, buf: &mut Vec<u8>) {
    match packet {
        Packet::Connack(connack) => encode_connack(connack, buf),
        Packet::Publish(publish) => encode_publish(publish, buf),
        Packet::Suback(suback) => encode_suback(suback, buf),
        Packet::Unsuback { packet_id } => encode_unsuback(*packet_id, buf),
        Packet::Pingresp => encode_pingresp(buf),
        _ => {} // Client-to-broker packets, never encoded
    }
}

fn encode_connack(connack: &Connack, buf: &mut Vec<u8>) {
    buf.push((PacketType::Connack as u8) << 4);
    buf.push(2); // Remaining length
    buf.push(if connack.session_present { 1 } else { 0 });
    buf.push(connack.code as u8);
}

/// Encode an outbound QoS 0 PUBLISH.
pub fn encode_publish(publish: &Publish, buf: &mut Vec<u8>) {
    let mut fixed_header = (PacketType::Publish as u8) << 4;
    if publish.dup {
        fixed_header |= 0x08;
    }
    fixed_header |= (publish.qos as u8) << 1;
    if publish.retain {
        fixed_header |= 0x01;
    }
    buf.push(fixed_header);

    let remaining = 2 + publish.topic.len() + publish.payload.len();
    varint::encode_to_vec(remaining, buf);

    buf.extend_from_slice(&(publish.topic.len() as u16).to_be_bytes());
    buf.extend_from_slice(publish.topic.as_bytes());
    buf.extend_from_slice(&publish.payload);
}

fn encode_suback(suback: &Suback, buf: &mut Vec<u8>) {
    buf.push((PacketType::Suback as u8) << 4);
    varint::encode_to_vec(2 + suback.return_codes.len(), buf);
    buf.extend_from_slice(&suback.packet_id.to_be_bytes());
    buf.extend_from_slice(&suback.return_codes);
}

fn encode_unsuback(packet_id: u16, buf: &mut Vec<u8>) {
    buf.push((PacketType::Unsuback as u8) << 4);
    buf.push(2); // Remaining length
    buf.extend_from_slice(&packet_id.to_be_bytes());
}

fn encode_pingresp(buf: &mut Vec<u8>) {
    buf.push((PacketType::Pingresp as u8) << 4);
    buf.push(0); // Remaining length
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::frame::FrameReader;

    fn frame_of(bytes: &[u8]) -> Frame {
        let mut reader = FrameReader::new(usize::MAX);
        reader.extend(bytes);
        reader.next_frame().unwrap().unwrap()
    }

    /// CONNECT: name "MQTT", level 4, clean session, keep-alive 60, id "cam1".
    fn connect_bytes() -> Vec<u8> {
        vec![
            0x10, 16, // fixed header
            0x00, 0x04, b'M', b'Q', b'T', b'T', // protocol name
            0x04, // protocol level
            0x02, // connect flags: clean session
            0x00, 0x3C, // keep alive 60
            0x00, 0x04, b'c', b'a', b'm', b'1', // client id
        ]
    }

    #[test]
    fn test_decode_connect() {
        let packet = decode_frame(&frame_of(&connect_bytes())).unwrap();
        let Packet::Connect(c) = packet else {
            panic!("expected CONNECT");
        };
        assert_eq!(c.protocol_name, "MQTT");
        assert_eq!(c.protocol_level, 4);
        assert!(c.clean_session);
        assert_eq!(c.keep_alive, 60);
        assert_eq!(c.client_id, "cam1");
    }

    #[test]
    fn test_decode_connect_with_will_and_credentials() {
        // Flags: username, password, will retain, will qos 1, will flag, clean session
        let flags = 0x80 | 0x40 | 0x20 | 0x08 | 0x04 | 0x02;
        let mut body = vec![
            0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, flags, 0x00, 0x0A, // keep alive 10
            0x00, 0x02, b'c', b'1', // client id
        ];
        body.extend_from_slice(&[0x00, 0x03, b'l', b'w', b't']); // will topic
        body.extend_from_slice(&[0x00, 0x02, b'h', b'i']); // will message
        body.extend_from_slice(&[0x00, 0x01, b'u']); // username
        body.extend_from_slice(&[0x00, 0x01, b'p']); // password

        let mut bytes = vec![0x10, body.len() as u8];
        bytes.extend_from_slice(&body);

        // Optional fields are consumed but not surfaced.
        let packet = decode_frame(&frame_of(&bytes)).unwrap();
        let Packet::Connect(c) = packet else {
            panic!("expected CONNECT");
        };
        assert_eq!(c.client_id, "c1");
        assert_eq!(c.keep_alive, 10);
    }

    #[test]
    fn test_decode_connect_reserved_flag_bit_rejected() {
        let mut bytes = connect_bytes();
        bytes[9] |= 0x01; // reserved bit
        assert!(decode_frame(&frame_of(&bytes)).is_err());
    }

    #[test]
    fn test_encode_connack_accepted() {
        let mut buf = Vec::new();
        encode_packet(
            &Packet::Connack(Connack {
                session_present: false,
                code: ConnackCode::Accepted,
            }),
            &mut buf,
        );
        assert_eq!(buf, [0x20, 0x02, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_connack_rejected_level() {
        let mut buf = Vec::new();
        encode_packet(
            &Packet::Connack(Connack {
                session_present: false,
                code: ConnackCode::UnacceptableProtocolVersion,
            }),
            &mut buf,
        );
        assert_eq!(buf, [0x20, 0x02, 0x00, 0x01]);
    }

    #[test]
    fn test_decode_publish_qos0() {
        let mut bytes = vec![0x30];
        let body_len = 2 + 8 + 5;
        bytes.push(body_len as u8);
        bytes.extend_from_slice(&[0x00, 0x08]);
        bytes.extend_from_slice(b"siot/img");
        bytes.extend_from_slice(b"hello");

        let Packet::Publish(p) = decode_frame(&frame_of(&bytes)).unwrap() else {
            panic!("expected PUBLISH");
        };
        assert_eq!(p.topic, "siot/img");
        assert_eq!(p.qos, QoS::AtMostOnce);
        assert_eq!(p.packet_id, None);
        assert_eq!(&p.payload[..], b"hello");
    }

    #[test]
    fn test_decode_publish_qos1_consumes_packet_id() {
        // QoS 1 flag set: payload starts after the 2-byte packet id.
        let mut bytes = vec![0x32];
        bytes.push((2 + 1 + 2 + 2) as u8);
        bytes.extend_from_slice(&[0x00, 0x01, b't']);
        bytes.extend_from_slice(&[0x00, 0x07]); // packet id 7
        bytes.extend_from_slice(b"ok");

        let Packet::Publish(p) = decode_frame(&frame_of(&bytes)).unwrap() else {
            panic!("expected PUBLISH");
        };
        assert_eq!(p.qos, QoS::AtLeastOnce);
        assert_eq!(p.packet_id, Some(7));
        assert_eq!(&p.payload[..], b"ok");
    }

    #[test]
    fn test_decode_subscribe_and_encode_suback() {
        let mut bytes = vec![0x82];
        bytes.push((2 + 2 + 8 + 1) as u8);
        bytes.extend_from_slice(&[0x00, 0x05]); // packet id 5
        bytes.extend_from_slice(&[0x00, 0x08]);
        bytes.extend_from_slice(b"siot/img");
        bytes.push(0x01); // requested QoS 1

        let Packet::Subscribe(s) = decode_frame(&frame_of(&bytes)).unwrap() else {
            panic!("expected SUBSCRIBE");
        };
        assert_eq!(s.packet_id, 5);
        assert_eq!(s.topics, vec![("siot/img".to_string(), QoS::AtLeastOnce)]);

        // Granted QoS is always 0 regardless of request.
        let mut buf = Vec::new();
        encode_packet(
            &Packet::Suback(Suback {
                packet_id: 5,
                return_codes: vec![0],
            }),
            &mut buf,
        );
        assert_eq!(buf, [0x90, 0x03, 0x00, 0x05, 0x00]);
    }

    #[test]
    fn test_subscribe_bad_flags_rejected() {
        let bytes = vec![0x80, 5, 0x00, 0x01, 0x00, 0x01, b'a'];
        assert!(decode_frame(&frame_of(&bytes)).is_err());
    }

    #[test]
    fn test_decode_unsubscribe_and_encode_unsuback() {
        let mut bytes = vec![0xA2];
        bytes.push((2 + 2 + 3) as u8);
        bytes.extend_from_slice(&[0x00, 0x09]); // packet id 9
        bytes.extend_from_slice(&[0x00, 0x03]);
        bytes.extend_from_slice(b"t/1");

        let Packet::Unsubscribe(u) = decode_frame(&frame_of(&bytes)).unwrap() else {
            panic!("expected UNSUBSCRIBE");
        };
        assert_eq!(u.packet_id, 9);
        assert_eq!(u.topics, vec!["t/1".to_string()]);

        let mut buf = Vec::new();
        encode_packet(&Packet::Unsuback { packet_id: 9 }, &mut buf);
        assert_eq!(buf, [0xB0, 0x02, 0x00, 0x09]);
    }

    #[test]
    fn test_pingreq_disconnect_pingresp() {
        assert!(matches!(
            decode_frame(&frame_of(&[0xC0, 0x00])).unwrap(),
            Packet::Pingreq
        ));
        assert!(matches!(
            decode_frame(&frame_of(&[0xE0, 0x00])).unwrap(),
            Packet::Disconnect
        ));

        let mut buf = Vec::new();
        encode_packet(&Packet::Pingresp, &mut buf);
        assert_eq!(buf, [0xD0, 0x00]);
    }

    #[test]
    fn test_unsupported_types_rejected() {
        // PUBACK (4) and a broker-to-client CONNACK (2) are both
        // unexpected from a client.
        for header in [0x40u8, 0x20u8] {
            let err = decode_frame(&frame_of(&[header, 0x02, 0x00, 0x01])).unwrap_err();
            assert!(matches!(
                err,
                Error::Protocol(ProtocolError::UnexpectedPacket(_))
            ));
        }
        // Type nibble 0 is invalid outright.
        assert!(matches!(
            decode_frame(&frame_of(&[0x00, 0x00])).unwrap_err(),
            Error::Protocol(ProtocolError::InvalidPacketType(0))
        ));
    }

    #[test]
    fn test_encode_publish_wire_format() {
        let publish = Publish {
            dup: false,
            qos: QoS::AtMostOnce,
            retain: false,
            topic: "t".to_string(),
            packet_id: None,
            payload: Bytes::from_static(b"hi"),
        };
        let mut buf = Vec::new();
        encode_publish(&publish, &mut buf);
        assert_eq!(buf, [0x30, 0x05, 0x00, 0x01, b't', b'h', b'i']);
    }

    #[test]
    fn test_truncated_bodies_rejected() {
        // CONNECT body cut off inside the client id.
        let bytes = vec![0x10, 12, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, 0x02, 0x00, 0x3C, 0x00, 0x04];
        assert!(decode_frame(&frame_of(&bytes)).is_err());

        // SUBSCRIBE missing the QoS byte after the filter.
        let bytes = vec![0x82, 5, 0x00, 0x01, 0x00, 0x01, b'a'];
        let frame = Frame {
            type_and_flags: 0x82,
            body: Bytes::copy_from_slice(&bytes[2..]),
        };
        assert!(decode_frame(&frame).is_err());
    }
}
