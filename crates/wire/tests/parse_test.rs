use quickdns_wire::{parse_message, Class, Message, Opcode, Rcode, Type, WireError};

mod helpers;
use helpers::PacketBuilder;

#[test]
fn test_parse_example_com_query() {
    let packet = PacketBuilder::new()
        .id(0x1234)
        .flags(0x0100)
        .question("example.com", 1, 1)
        .build();

    let mut msg = Message::new();
    parse_message(&mut msg, &packet, false).unwrap();

    assert_eq!(msg.domain(), "example.com");
    assert_eq!(msg.question.qtype, Type::A);
    assert_eq!(msg.question.qclass, Class::IN);
    assert_eq!(msg.header.id, 0x1234);
    assert!(msg.header.flags.rd());
    assert!(!msg.header.flags.qr());
    assert_eq!(msg.header.flags.opcode(), Opcode::Query);
    assert_eq!(msg.header.flags.rcode(), Rcode::NoError);
    assert_eq!(msg.header.qdcount, 1);
}

#[test]
fn test_domain_is_label_stripped_qname() {
    let names = [
        "a",
        "example.com",
        "www.example.co.uk",
        "xn--bcher-kva.example",
        "a-b_c.d1.e2.f3",
    ];
    for name in names {
        let packet = PacketBuilder::new().question(name, 28, 1).build();
        let mut msg = Message::new();
        msg.parse(&packet, false).unwrap();
        assert_eq!(msg.domain(), name);
        assert_eq!(msg.question.qtype, Type::AAAA);
        assert!(!msg.domain().starts_with('.'));
        assert!(!msg.domain().ends_with('.'));
    }
}

#[test]
fn test_short_payload_is_invalid_header() {
    let packet = PacketBuilder::new().question("example.com", 1, 1).build();
    let mut msg = Message::new();
    for len in 0..12 {
        assert_eq!(
            msg.parse(&packet[..len], false),
            Err(WireError::InvalidHeader),
            "length {}",
            len
        );
    }
}

#[test]
fn test_qdcount_other_than_one_is_invalid_header() {
    for qdcount in [0u16, 2, 3, 0xFFFF] {
        let packet = PacketBuilder::new()
            .question("example.com", 1, 1)
            .qdcount(qdcount)
            .build();
        let mut msg = Message::new();
        assert_eq!(
            msg.parse(&packet, false),
            Err(WireError::InvalidHeader),
            "qdcount {}",
            qdcount
        );
    }
}

#[test]
fn test_header_only_with_qdcount_one() {
    let packet = PacketBuilder::new().qdcount(1).build();
    assert_eq!(packet.len(), 12);
    let mut msg = Message::new();
    assert_eq!(msg.parse(&packet, false), Err(WireError::InvalidQuestion));
}

#[test]
fn test_missing_terminator_is_invalid_question() {
    let packet = PacketBuilder::new()
        .raw_question(b"\x07example\x03com")
        .build();
    let mut msg = Message::new();
    assert_eq!(msg.parse(&packet, false), Err(WireError::InvalidQuestion));
}

#[test]
fn test_root_name_is_invalid_question() {
    let packet = PacketBuilder::new()
        .raw_question(b"\x00\x00\x02\x00\x01")
        .build();
    let mut msg = Message::new();
    assert_eq!(msg.parse(&packet, false), Err(WireError::InvalidQuestion));
}

#[test]
fn test_type_and_class_must_fit() {
    let full = PacketBuilder::new().question("example.com", 1, 1).build();
    let mut msg = Message::new();
    assert!(msg.parse(&full, false).is_ok());

    // cut into QTYPE/QCLASS one byte at a time
    for cut in 1..=4 {
        let truncated = &full[..full.len() - cut];
        assert_eq!(
            msg.parse(truncated, false),
            Err(WireError::InvalidQuestion),
            "cut {}",
            cut
        );
    }
}

#[test]
fn test_trailing_data_after_question_is_allowed() {
    let mut packet = PacketBuilder::new().question("example.com", 1, 1).build();
    packet.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    let mut msg = Message::new();
    msg.parse(&packet, false).unwrap();
    assert_eq!(msg.domain(), "example.com");
    assert_eq!(msg.question_end(), packet.len() - 4);
}

#[test]
fn test_misaligned_labels_are_invalid_question() {
    // first label claims 9 bytes, swallowing the next length byte
    let packet = PacketBuilder::new()
        .raw_question(b"\x09example\x03com\x00\x00\x01\x00\x01")
        .build();
    let mut msg = Message::new();
    assert_eq!(msg.parse(&packet, false), Err(WireError::InvalidQuestion));
}

#[test]
fn test_pointer_in_question_is_invalid_question() {
    let packet = PacketBuilder::new()
        .raw_question(b"\x03www\xC0\x0C\x00\x00\x01\x00\x01")
        .build();
    let mut msg = Message::new();
    assert_eq!(msg.parse(&packet, false), Err(WireError::InvalidQuestion));
}

#[test]
fn test_copy_mode_survives_buffer_reuse() {
    let mut packet = PacketBuilder::new().question("copy.example", 16, 1).build();
    let mut msg = Message::new();
    msg.parse_copied(&packet).unwrap();

    packet.fill(0xFF);

    assert_eq!(msg.domain(), "copy.example");
    assert_eq!(msg.question_name(), b"\x04copy\x07example\x00");
    assert_eq!(msg.question.qtype, Type::TXT);
    assert_ne!(msg.raw(), packet.as_slice());
}

#[test]
fn test_borrow_mode_aliases_input() {
    let packet = PacketBuilder::new().question("zero.copy", 1, 1).build();
    let mut msg = Message::new();
    msg.parse(&packet, false).unwrap();

    let name = msg.question_name();
    let base = packet.as_ptr() as usize;
    let name_ptr = name.as_ptr() as usize;
    assert_eq!(name_ptr - base, 12);
    assert_eq!(name, &packet[12..12 + name.len()]);
}

#[test]
fn test_reparse_overwrites_previous_state() {
    let first = PacketBuilder::new()
        .question("a-much-longer-first-name.example.com", 1, 1)
        .build();
    let second = PacketBuilder::new().id(7).question("b.io", 15, 3).build();

    let mut msg = Message::new();
    msg.parse_copied(&first).unwrap();
    msg.parse_copied(&second).unwrap();

    assert_eq!(msg.domain(), "b.io");
    assert_eq!(msg.header.id, 7);
    assert_eq!(msg.question.qtype, Type::MX);
    assert_eq!(msg.question.qclass, Class::CH);
    assert_eq!(msg.raw().len(), second.len());
}
