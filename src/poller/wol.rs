// Wake-on-LAN magic packets.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use tokio::net::UdpSocket;

/// 6 sync bytes followed by 16 copies of the MAC.
pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mac address {0:?}: expected six hex octets like aa:bb:cc:dd:ee:ff")]
pub struct MacParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl FromStr for MacAddress {
    type Err = MacParseError;

    /// Accepts `:` or `-` separated octets, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MacParseError(s.to_string());
        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(err());
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(parts) {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(err());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| err())?;
        }
        Ok(MacAddress(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

/// Builds the magic packet waking the NIC with the given MAC.
pub fn magic_packet(mac: &MacAddress) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFFu8; MAGIC_PACKET_LEN];
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&mac.0);
    }
    packet
}

/// Sends one magic packet to `target` (normally a broadcast address on port 9).
pub async fn send_magic_packet(mac: &MacAddress, target: SocketAddr) -> std::io::Result<()> {
    let bind: SocketAddr = if target.is_ipv4() {
        ([0, 0, 0, 0], 0).into()
    } else {
        ([0u16; 8], 0).into()
    };
    let socket = UdpSocket::bind(bind).await?;
    socket.set_broadcast(true)?;

    let packet = magic_packet(mac);
    let sent = socket.send_to(&packet, target).await?;
    if sent != packet.len() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            format!("short write: {} of {} bytes", sent, packet.len()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mac() {
        let mac: MacAddress = "AA:bb:0c:dd:ee:01".parse().unwrap();
        assert_eq!(mac.0, [0xaa, 0xbb, 0x0c, 0xdd, 0xee, 0x01]);
        assert_eq!(mac.to_string(), "aa:bb:0c:dd:ee:01");

        let dashed: MacAddress = "aa-bb-0c-dd-ee-01".parse().unwrap();
        assert_eq!(dashed, mac);
    }

    #[test]
    fn test_parse_mac_rejects_garbage() {
        for bad in ["", "aa:bb:cc:dd:ee", "aa:bb:cc:dd:ee:ff:00", "zz:bb:cc:dd:ee:ff", "aaa:bb:cc:dd:ee:f", "+a:bb:cc:dd:ee:ff", "a:bb:cc:dd:ee: f"] {
            assert!(bad.parse::<MacAddress>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_magic_packet_layout() {
        let mac = MacAddress([1, 2, 3, 4, 5, 6]);
        let packet = magic_packet(&mac);

        assert_eq!(packet.len(), 102);
        assert!(packet[..6].iter().all(|b| *b == 0xFF));
        for i in 0..16 {
            let start = 6 + i * 6;
            assert_eq!(&packet[start..start + 6], &mac.0);
        }
    }

    #[tokio::test]
    async fn test_send_magic_packet_reaches_target() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();
        let mac = MacAddress([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);

        send_magic_packet(&mac, target).await.unwrap();

        let mut buf = [0u8; 256];
        let (n, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &magic_packet(&mac)[..]);
    }
}
