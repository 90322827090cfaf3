use bytes::BytesMut;

use crate::headers::standard::{CONTENT_LENGTH, CONTENT_TYPE, HOST, TRANSFER_ENCODING};
use crate::headers::{HeaderMap, HeaderName, HeaderValue};

const fn is_send_sync<T: Send + Sync>() {}
const _: () = {
    is_send_sync::<HeaderMap>();
    is_send_sync::<HeaderName>();
    is_send_sync::<HeaderValue>();
};

fn value(s: &str) -> HeaderValue {
    HeaderValue::try_copy_from_slice(s.as_bytes()).unwrap()
}

#[test]
fn append_preserves_insertion_order() {
    let mut map = HeaderMap::new();

    map.append("b-header", value("1"));
    map.append("a-header", value("2"));
    map.append("b-header", value("3"));
    map.append(CONTENT_TYPE, value("4"));

    let entries: Vec<_> = map
        .iter()
        .map(|(n, v)| (n.as_str().to_owned(), v.as_bytes().to_vec()))
        .collect();

    assert_eq!(entries, [
        ("b-header".to_owned(), b"1".to_vec()),
        ("a-header".to_owned(), b"2".to_vec()),
        ("b-header".to_owned(), b"3".to_vec()),
        ("content-type".to_owned(), b"4".to_vec()),
    ]);

    // earliest value wins for `get`
    assert_eq!(map.get("b-header").unwrap(), "1");
    let all: Vec<_> = map.get_all("b-header").map(|v| v.as_bytes()).collect();
    assert_eq!(all, [b"1", b"3"]);
}

#[test]
fn lookup_is_case_insensitive_via_lowercase_storage() {
    let mut map = HeaderMap::new();
    map.append(HeaderName::from_slice(b"X-Custom").unwrap(), value("yes"));

    assert!(map.contains_key("x-custom"));
    assert_eq!(map.get("x-custom").unwrap(), "yes");
}

#[test]
fn remove_removes_every_entry() {
    let mut map = HeaderMap::new();

    map.append("keep", value("a"));
    map.append("drop", value("b"));
    map.append("keep", value("c"));
    map.append("drop", value("d"));
    map.append("tail", value("e"));

    assert!(map.remove("drop"));
    assert!(!map.contains_key("drop"));
    assert!(map.get_all("drop").next().is_none());

    // survivors keep their relative order
    let names: Vec<_> = map.iter().map(|(n, _)| n.as_str().to_owned()).collect();
    assert_eq!(names, ["keep", "keep", "tail"]);
    assert_eq!(map.len(), 3);

    assert!(!map.remove("drop"));
}

#[test]
fn sort_is_stable_by_name() {
    let mut map = HeaderMap::new();

    map.append("zeta", value("1"));
    map.append("alpha", value("2"));
    map.append("zeta", value("3"));
    map.append("beta", value("4"));

    map.sort();

    let entries: Vec<_> = map
        .iter()
        .map(|(n, v)| (n.as_str().to_owned(), v.as_bytes().to_vec()))
        .collect();
    assert_eq!(entries, [
        ("alpha".to_owned(), b"2".to_vec()),
        ("beta".to_owned(), b"4".to_vec()),
        ("zeta".to_owned(), b"1".to_vec()),
        ("zeta".to_owned(), b"3".to_vec()),
    ]);

    // index survives the reorder
    assert_eq!(map.get("zeta").unwrap(), "1");
    assert!(map.contains_key("beta"));
}

#[test]
fn growth_keeps_every_name_reachable() {
    let mut map = HeaderMap::new();

    for i in 0..32 {
        map.append(
            HeaderName::from_slice(format!("h-{i}").as_bytes()).unwrap(),
            value(&i.to_string()),
        );
    }

    for i in 0..32 {
        let name = format!("h-{i}");
        assert_eq!(map.get(name.as_str()).unwrap(), i.to_string().as_str());
    }
    assert_eq!(map.len(), 32);
}

#[test]
fn format_emits_in_order() {
    let mut map = HeaderMap::new();
    map.append(HOST, value("example.com"));
    map.append(CONTENT_LENGTH, value("4"));

    let mut buf = BytesMut::new();
    map.format(&mut buf);
    assert_eq!(&buf[..], b"host: example.com\r\ncontent-length: 4\r\n");
}

#[test]
fn format_comma_separated_joins_values() {
    let mut map = HeaderMap::new();
    map.append(TRANSFER_ENCODING, value("deflate"));
    map.append(TRANSFER_ENCODING, value("chunked"));

    let mut buf = BytesMut::new();
    map.format_comma_separated(TRANSFER_ENCODING, &mut buf);
    assert_eq!(&buf[..], b"transfer-encoding: deflate, chunked\r\n");

    let mut buf = BytesMut::new();
    map.format_comma_separated("absent", &mut buf);
    assert!(buf.is_empty());
}

#[test]
fn clear_empties_the_map() {
    let mut map = HeaderMap::new();
    map.append("a", value("1"));
    map.append("b", value("2"));

    map.clear();
    assert!(map.is_empty());
    assert!(!map.contains_key("a"));
    assert!(!map.contains_key("b"));
}

#[test]
fn invalid_names_rejected() {
    assert!(HeaderName::from_slice(b"").is_err());
    assert!(HeaderName::from_slice(b"sp ace").is_err());
    assert!(HeaderName::from_slice(b"colon:").is_err());
    assert!(HeaderName::from_bytes_lowercase(&b"Upper"[..]).is_err());
}

#[test]
fn invalid_values_rejected() {
    assert!(HeaderValue::try_copy_from_slice(b"ok value\twith tab").is_ok());
    assert!(HeaderValue::try_copy_from_slice(b"nul\0").is_err());
    assert!(HeaderValue::try_copy_from_slice(b"newline\n").is_err());
}
