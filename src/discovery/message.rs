//! src/discovery/message.rs
//!
//! Wire format for the two discovery datagrams:
//!
//!   HELLO <id>
//!   GOSSIP <senderId>;<senderNow>,<peerId1>;<ts1>,<peerId2>;<ts2>,...
//!
//! Both are single UTF-8 text datagrams. A malformed entry or timestamp
//! inside a GOSSIP digest is skipped, not fatal to the whole message.

use crate::ids::PeerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Hello(PeerId),
    /// The sender's digest: one `(id, lastSeen_ms)` entry per known peer,
    /// including the sender's own entry (with its current clock reading)
    /// as the first element.
    Gossip(Vec<(PeerId, u64)>),
}

pub fn format_hello(id: &str) -> String {
    format!("HELLO {id}")
}

pub fn format_gossip(entries: &[(PeerId, u64)]) -> String {
    let body = entries
        .iter()
        .map(|(id, ts)| format!("{id};{ts}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("GOSSIP {body}")
}

pub fn parse(datagram: &str) -> Option<Message> {
    let datagram = datagram.trim();
    if let Some(rest) = datagram.strip_prefix("HELLO ") {
        let id = rest.trim();
        if id.is_empty() {
            return None;
        }
        return Some(Message::Hello(id.to_string()));
    }
    if let Some(rest) = datagram.strip_prefix("GOSSIP ") {
        let entries = rest
            .split(',')
            .filter_map(|entry| {
                let (id, ts) = entry.split_once(';')?;
                let id = id.trim();
                if id.is_empty() {
                    return None;
                }
                let ts: u64 = ts.trim().parse().ok()?;
                Some((id.to_string(), ts))
            })
            .collect();
        return Some(Message::Gossip(entries));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_hello() {
        let wire = format_hello("1.1.1.1:5001");
        assert_eq!(wire, "HELLO 1.1.1.1:5001");
        assert_eq!(parse(&wire), Some(Message::Hello("1.1.1.1:5001".to_string())));
    }

    #[test]
    fn round_trips_gossip() {
        let entries = vec![
            ("1.1.1.1:5001".to_string(), 1000),
            ("1.1.1.1:5002".to_string(), 2000),
        ];
        let wire = format_gossip(&entries);
        assert_eq!(wire, "GOSSIP 1.1.1.1:5001;1000,1.1.1.1:5002;2000");
        assert_eq!(parse(&wire), Some(Message::Gossip(entries)));
    }

    #[test]
    fn skips_malformed_gossip_entries_without_failing_the_whole_message() {
        let wire = "GOSSIP 1.1.1.1:5001;1000,garbage,1.1.1.1:5002;not-a-number,1.1.1.1:5003;3000";
        let parsed = parse(wire).unwrap();
        assert_eq!(
            parsed,
            Message::Gossip(vec![
                ("1.1.1.1:5001".to_string(), 1000),
                ("1.1.1.1:5003".to_string(), 3000),
            ])
        );
    }

    #[test]
    fn rejects_unknown_message_types() {
        assert_eq!(parse("PING something"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn rejects_hello_with_empty_id() {
        assert_eq!(parse("HELLO "), None);
    }
}
