use std::borrow::Cow;

use crate::core::packet::{Packet, PacketType};

/// Where an inbound packet is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// AUTH_RESPONSE: handled by the session
    Auth { id: i32 },
    /// RESPONSE_VALUE: handled by the reassembler
    Response { id: i32 },
    /// Type code a server never sends
    Unknown { id: i32, kind: i32 },
}

/// Route a packet received from the server by its type code.
///
/// Code `2` is read as AUTH_RESPONSE here: a server never sends EXEC_COMMAND.
#[inline]
pub fn route(packet: &Packet) -> Route {
    match PacketType::from_server(packet.kind) {
        Some(PacketType::AuthResponse) => Route::Auth { id: packet.id },
        Some(PacketType::ResponseValue) => Route::Response { id: packet.id },
        _ => Route::Unknown {
            id: packet.id,
            kind: packet.kind,
        },
    }
}

/// Name of a route for log fields (zero-copy for known types)
#[inline]
pub fn route_name(route: &Route) -> Cow<'static, str> {
    match route {
        Route::Auth { .. } => Cow::Borrowed("AUTH_RESPONSE"),
        Route::Response { .. } => Cow::Borrowed("RESPONSE_VALUE"),
        Route::Unknown { kind, .. } => Cow::Owned(format!("UNKNOWN({kind})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_by_type() {
        let auth = Packet::new(PacketType::AuthResponse, -1, "");
        assert_eq!(route(&auth), Route::Auth { id: -1 });

        let value = Packet::new(PacketType::ResponseValue, 7, "out");
        assert_eq!(route(&value), Route::Response { id: 7 });

        let odd = Packet {
            id: 3,
            kind: 99,
            body: String::new(),
        };
        assert_eq!(route(&odd), Route::Unknown { id: 3, kind: 99 });
        assert_eq!(route_name(&route(&odd)), "UNKNOWN(99)");
    }
}
