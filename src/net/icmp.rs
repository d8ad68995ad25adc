use std::net::Ipv4Addr;

pub const ECHO_REQUEST_TYPE: u8 = 8;
pub const ECHO_REPLY_TYPE: u8 = 0;
pub const ECHO_CODE: u8 = 0;

pub const ICMP_HEADER_LEN: usize = 8;
pub const DEFAULT_PAYLOAD_SIZE: usize = 56;

/// Calculate checksum according to https://en.wikipedia.org/wiki/Internet_checksum
/// (RFC 1071).
pub fn checksum(buf: &[u8]) -> u16 {
    // Wide accumulator so no carry is ever lost, whatever the buffer length.
    let mut sum: u64 = 0;

    for word in buf.chunks(2) {
        let mut val = u16::from(word[0]) << 8;
        if word.len() > 1 {
            val |= u16::from(word[1]);
        }
        sum += u64::from(val);
    }

    // Fold carry bits back into the 16 least significant bits.
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xffff);
    }

    !(sum as u16)
}

/// True when `buf` carries a correct checksum, i.e. re-summing it gives zero.
pub fn verify(buf: &[u8]) -> bool {
    checksum(buf) == 0
}

/// An ICMP echo packet implemented according to
/// https://en.wikipedia.org/wiki/Ping_(networking_utility)#ECHO-REQUEST.
///
/// The payload is a zero filler of `payload_size` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoPacket {
    pub typ: u8,
    pub code: u8,
    pub identifier: u16,
    pub sequence: u16,
    pub payload_size: usize,
}

impl EchoPacket {
    pub fn request(identifier: u16, sequence: u16, payload_size: usize) -> Self {
        EchoPacket {
            typ: ECHO_REQUEST_TYPE,
            code: ECHO_CODE,
            identifier,
            sequence,
            payload_size,
        }
    }

    pub fn encoded_len(&self) -> usize {
        ICMP_HEADER_LEN + self.payload_size
    }

    /// Writes the packet into the front of `buf` and returns the number of
    /// bytes written. `buf` must hold at least [`EchoPacket::encoded_len`] bytes.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        let len = self.encoded_len();
        let buf = &mut buf[..len];

        buf[0] = self.typ;
        buf[1] = self.code;
        buf[2..4].copy_from_slice(&[0, 0]);
        buf[4..6].copy_from_slice(&self.identifier.to_be_bytes());
        buf[6..8].copy_from_slice(&self.sequence.to_be_bytes());
        buf[ICMP_HEADER_LEN..].fill(0);

        let checksum = checksum(buf);
        buf[2..4].copy_from_slice(&checksum.to_be_bytes());
        len
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0; self.encoded_len()];
        self.encode(&mut buf);
        buf
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub typ: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
}

impl IcmpHeader {
    /// Reads the header at the start of a bare ICMP message.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < ICMP_HEADER_LEN {
            return None;
        }
        Some(IcmpHeader {
            typ: buf[0],
            code: buf[1],
            checksum: u16::from_be_bytes([buf[2], buf[3]]),
            identifier: u16::from_be_bytes([buf[4], buf[5]]),
            sequence: u16::from_be_bytes([buf[6], buf[7]]),
        })
    }
}

/// Parsed view of a datagram read from a raw ICMP socket, IP header included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    pub source: Ipv4Addr,
    pub typ: u8,
    pub code: u8,
    pub identifier: u16,
    pub sequence: u16,
    /// Datagram length minus the IP header.
    pub icmp_len: usize,
}

impl EchoReply {
    /// Strips the variable-length IP header and reads the ICMP fields behind
    /// it. Returns `None` for anything too short to hold an ICMP header.
    pub fn decode(datagram: &[u8], source: Ipv4Addr) -> Option<Self> {
        let ip_header_len = usize::from(datagram.first()? & 0x0f) * 4;
        let icmp = datagram.get(ip_header_len..)?;
        let header = IcmpHeader::parse(icmp)?;

        Some(EchoReply {
            source,
            typ: header.typ,
            code: header.code,
            identifier: header.identifier,
            sequence: header.sequence,
            icmp_len: icmp.len(),
        })
    }

    pub fn matches(&self, identifier: u16) -> bool {
        self.typ == ECHO_REPLY_TYPE && self.identifier == identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipv4_header(total_len: u16) -> Vec<u8> {
        let mut hdr = vec![0u8; 20];
        hdr[0] = 0x45;
        hdr[2..4].copy_from_slice(&total_len.to_be_bytes());
        hdr[8] = 64;
        hdr[9] = 1;
        hdr
    }

    #[test]
    fn checksum_rfc1071_example() {
        let buf = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(checksum(&buf), 0x220d);
    }

    #[test]
    fn checksum_empty_and_zeroed() {
        assert_eq!(checksum(&[]), 0xffff);
        assert_eq!(checksum(&[0; 64]), 0xffff);
    }

    #[test]
    fn checksum_odd_length_pads_trailing_byte() {
        assert_eq!(checksum(&[0x01]), 0xfeff);
        assert_eq!(checksum(&[0x00, 0x01, 0xf2]), checksum(&[0x00, 0x01, 0xf2, 0x00]));
    }

    #[test]
    fn checksum_folds_repeated_carries() {
        // 0xffff * 3 = 0x2fffd, folds to 0xffff, complement 0.
        assert_eq!(checksum(&[0xff; 6]), 0x0000);
    }

    #[test]
    fn checksum_empty_packet() {
        let buf = EchoPacket::request(0, 0, 0).to_bytes();
        assert_eq!(buf.len(), 8);
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), 0xf7ff);
    }

    #[test]
    fn encoded_packet_verifies() {
        let buf = EchoPacket::request(0x1234, 7, DEFAULT_PAYLOAD_SIZE).to_bytes();
        assert_eq!(buf.len(), 64);
        assert!(verify(&buf));
    }

    #[test]
    fn encode_layout() {
        let mut buf = [0xaau8; 80];
        let n = EchoPacket::request(0xbeef, 0x0102, 4).encode(&mut buf);
        assert_eq!(n, 12);
        assert_eq!(&buf[..2], &[ECHO_REQUEST_TYPE, ECHO_CODE]);
        assert_eq!(&buf[4..8], &[0xbe, 0xef, 0x01, 0x02]);
        assert_eq!(&buf[8..12], &[0, 0, 0, 0]);
        assert_eq!(buf[12], 0xaa);
        assert!(verify(&buf[..n]));
    }

    #[test]
    fn header_parse_recovers_request_fields() {
        let buf = EchoPacket::request(4321, 99, 16).to_bytes();
        let header = IcmpHeader::parse(&buf).unwrap();
        assert_eq!(header.typ, ECHO_REQUEST_TYPE);
        assert_eq!(header.identifier, 4321);
        assert_eq!(header.sequence, 99);
    }

    #[test]
    fn decode_echo_reply_behind_ip_header() {
        let mut reply = EchoPacket::request(77, 3, 0);
        reply.typ = ECHO_REPLY_TYPE;
        let mut datagram = ipv4_header(28);
        datagram.extend(reply.to_bytes());

        let src = Ipv4Addr::new(127, 0, 0, 1);
        let parsed = EchoReply::decode(&datagram, src).unwrap();
        assert_eq!(parsed.source, src);
        assert_eq!(parsed.icmp_len, 8);
        assert_eq!(parsed.sequence, 3);
        assert!(parsed.matches(77));
        assert!(!parsed.matches(78));
    }

    #[test]
    fn decode_rejects_short_datagrams() {
        let src = Ipv4Addr::LOCALHOST;
        assert_eq!(EchoReply::decode(&[], src), None);

        let mut datagram = ipv4_header(27);
        datagram.extend([0u8; 7]);
        assert_eq!(EchoReply::decode(&datagram, src), None);

        // Header length nibble pointing past the end of the datagram.
        let mut datagram = vec![0x4f];
        datagram.extend([0u8; 20]);
        assert_eq!(EchoReply::decode(&datagram, src), None);
    }

    #[test]
    fn request_never_matches() {
        let mut datagram = ipv4_header(28);
        datagram.extend(EchoPacket::request(77, 0, 0).to_bytes());
        let parsed = EchoReply::decode(&datagram, Ipv4Addr::LOCALHOST).unwrap();
        assert!(!parsed.matches(77));
    }
}
