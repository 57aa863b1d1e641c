use quickdns_domain::ConfigError;
use quickdns_server::{Handler, LocalRecordsHandler, Protocol, RequestContext};
use quickdns_wire::{Class, Message, Opcode, Rcode, Type};

mod helpers;
use helpers::{build_query, local_config, read_reply, record, Answer};

fn ctx() -> RequestContext {
    RequestContext {
        client: "127.0.0.1:5353".parse().unwrap(),
        protocol: Protocol::Udp,
        max_response_size: 512,
    }
}

async fn ask(handler: &LocalRecordsHandler, packet: &[u8]) -> Vec<u8> {
    let mut request = Message::new();
    request.parse(packet, false).unwrap();
    let mut response = Vec::new();
    handler.handle(&ctx(), &request, &mut response).await;
    response
}

fn handler() -> LocalRecordsHandler {
    LocalRecordsHandler::from_config(&local_config()).unwrap()
}

#[tokio::test]
async fn test_a_query_for_local_name() {
    let handler = handler();
    let reply = ask(&handler, &build_query("nas.lan", Type::A, Class::IN)).await;

    let (header, answers) = read_reply(&reply);
    assert!(header.flags.qr());
    assert!(header.flags.aa());
    assert_eq!(header.flags.rcode(), Rcode::NoError);
    assert_eq!(
        answers,
        vec![Answer {
            name: "nas.lan".to_string(),
            rtype: Type::A,
            ttl: 300,
            rdata: vec![192, 168, 1, 10],
        }]
    );
}

#[tokio::test]
async fn test_aaaa_query_for_local_name() {
    let handler = handler();
    let reply = ask(&handler, &build_query("nas.lan", Type::AAAA, Class::IN)).await;

    let (_, answers) = read_reply(&reply);
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].rtype, Type::AAAA);
    assert_eq!(answers[0].rdata.len(), 16);
}

#[tokio::test]
async fn test_lookup_is_case_insensitive() {
    let handler = handler();
    let reply = ask(&handler, &build_query("NAS.Lan", Type::A, Class::IN)).await;
    let (header, answers) = read_reply(&reply);
    assert_eq!(header.flags.rcode(), Rcode::NoError);
    assert_eq!(answers.len(), 1);
}

#[tokio::test]
async fn test_custom_ttl() {
    let handler = handler();
    let reply = ask(&handler, &build_query("printer.lan", Type::A, Class::IN)).await;
    let (_, answers) = read_reply(&reply);
    assert_eq!(answers[0].ttl, 42);
}

#[tokio::test]
async fn test_unknown_name_is_nxdomain() {
    let handler = handler();
    let reply = ask(&handler, &build_query("nothing.lan", Type::A, Class::IN)).await;
    let (header, answers) = read_reply(&reply);
    assert_eq!(header.flags.rcode(), Rcode::NxDomain);
    assert!(answers.is_empty());
}

#[tokio::test]
async fn test_known_name_without_type_is_nodata() {
    let handler = handler();
    let reply = ask(&handler, &build_query("printer.lan", Type::AAAA, Class::IN)).await;
    let (header, answers) = read_reply(&reply);
    assert_eq!(header.flags.rcode(), Rcode::NoError);
    assert!(header.flags.aa());
    assert!(answers.is_empty());
}

#[tokio::test]
async fn test_cname_chain_is_followed() {
    let handler = handler();
    let reply = ask(&handler, &build_query("docs.lan", Type::A, Class::IN)).await;

    let (_, answers) = read_reply(&reply);
    let summary: Vec<(&str, Type)> = answers
        .iter()
        .map(|a| (a.name.as_str(), a.rtype))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("docs.lan", Type::CNAME),
            ("files.lan", Type::CNAME),
            ("nas.lan", Type::A),
        ]
    );
    assert_eq!(answers[2].rdata, vec![192, 168, 1, 10]);
}

#[tokio::test]
async fn test_cname_to_external_name_stops_at_cname() {
    let handler = handler();
    let reply = ask(&handler, &build_query("external.lan", Type::A, Class::IN)).await;

    let (_, answers) = read_reply(&reply);
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].rtype, Type::CNAME);
    assert_eq!(answers[0].rdata, b"\x07example\x03com\x00");
}

#[tokio::test]
async fn test_cname_query_returns_cname_only() {
    let handler = handler();
    let reply = ask(&handler, &build_query("files.lan", Type::CNAME, Class::IN)).await;

    let (_, answers) = read_reply(&reply);
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].name, "files.lan");
    assert_eq!(answers[0].rdata, b"\x03nas\x03lan\x00");
}

#[tokio::test]
async fn test_cname_loop_is_bounded() {
    let mut config = local_config();
    config.records = vec![record("ping", "pong.lan", "CNAME"), record("pong", "ping.lan", "CNAME")];
    let handler = LocalRecordsHandler::from_config(&config).unwrap();

    let reply = ask(&handler, &build_query("ping.lan", Type::A, Class::IN)).await;
    let (header, answers) = read_reply(&reply);
    assert_eq!(header.flags.rcode(), Rcode::NoError);
    assert_eq!(answers.len(), 8);
}

#[tokio::test]
async fn test_non_in_class_is_refused() {
    let handler = handler();
    let reply = ask(&handler, &build_query("nas.lan", Type::A, Class::CH)).await;
    let (header, _) = read_reply(&reply);
    assert_eq!(header.flags.rcode(), Rcode::Refused);
}

#[tokio::test]
async fn test_non_query_opcode_is_notimp() {
    let handler = handler();
    let mut packet = build_query("nas.lan", Type::A, Class::IN);
    let mut request = Message::new();
    request.parse_copied(&packet).unwrap();
    request.header.flags.set_opcode(Opcode::Notify);
    packet.clear();
    request.append_to(&mut packet).unwrap();

    let reply = ask(&handler, &packet).await;
    let (header, _) = read_reply(&reply);
    assert_eq!(header.flags.rcode(), Rcode::NotImp);
    assert_eq!(header.flags.opcode(), Opcode::Notify);
}

#[test]
fn test_from_config_rejects_invalid_records() {
    let mut config = local_config();
    config.records.push(record("broken", "300.1.1.1", "A"));
    assert!(matches!(
        LocalRecordsHandler::from_config(&config),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn test_from_config_groups_by_name() {
    let handler = handler();
    // nas, files, docs, external, printer
    assert_eq!(handler.len(), 5);
    assert!(!handler.is_empty());
    assert!(LocalRecordsHandler::default().is_empty());
}
