use portprobe_rs::ports::PortRange;

#[test]
fn parse_default_range() {
    let range = PortRange::parse("1-1024").expect("parse ok");
    assert_eq!(range, PortRange::default());
    assert_eq!(range.iter().next(), Some(1));
    assert_eq!(range.iter().last(), Some(1024));
}

#[test]
fn invalid_port_rejected() {
    assert!(PortRange::parse("0").is_err());
    assert!(PortRange::parse("1-65536").is_err());
    assert!(PortRange::parse("").is_err());
}

#[test]
fn error_names_offending_part() {
    let err = PortRange::parse("10-abc").unwrap_err();
    assert!(format!("{err:#}").contains("invalid end in range: abc"));
}
