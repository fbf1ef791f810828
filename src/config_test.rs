use super::*;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let owned: Vec<(String, String)> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| owned.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

#[test]
fn env_parse_missing_returns_default() {
    let val: usize = env_parse(vars(&[]), "RELAY_FRAME_BACKLOG", 42).expect("default");
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_valid() {
    let val: usize = env_parse(vars(&[("RELAY_FRAME_BACKLOG", " 99 ")]), "RELAY_FRAME_BACKLOG", 0).expect("parse");
    assert_eq!(val, 99);
}

#[test]
fn env_parse_present_invalid_is_error() {
    let err = env_parse::<u16>(vars(&[("PORT", "eighty")]), "PORT", 3000).expect_err("invalid");
    assert_eq!(err, ConfigError::Invalid { key: "PORT", value: "eighty".into() });
}

#[test]
fn empty_environment_is_default() {
    assert_eq!(RelayConfig::from_lookup(vars(&[])).expect("config"), RelayConfig::default());
}

#[test]
fn all_variables_are_read() {
    let config = RelayConfig::from_lookup(vars(&[
        ("PORT", "8080"),
        ("RELAY_FRAME_BACKLOG", "16"),
        ("RELAY_MAX_FRAME_BYTES", "65536"),
        ("RELAY_UNCLAIMED_TTL_SECS", "5"),
    ]))
    .expect("config");
    assert_eq!(
        config,
        RelayConfig { port: 8080, frame_backlog: 16, max_frame_bytes: 65536, unclaimed_ttl_secs: 5 }
    );
    assert_eq!(config.unclaimed_ttl(), Duration::from_secs(5));
}

#[test]
fn zero_backlog_is_rejected() {
    let err = RelayConfig::from_lookup(vars(&[("RELAY_FRAME_BACKLOG", "0")])).expect_err("zero");
    assert_eq!(err, ConfigError::Zero("RELAY_FRAME_BACKLOG"));
}

#[test]
fn zero_unclaimed_ttl_is_rejected() {
    let err = RelayConfig::from_lookup(vars(&[("RELAY_UNCLAIMED_TTL_SECS", "0")])).expect_err("zero");
    assert_eq!(err, ConfigError::Zero("RELAY_UNCLAIMED_TTL_SECS"));
}

#[test]
fn port_out_of_range_is_rejected() {
    assert!(RelayConfig::from_lookup(vars(&[("PORT", "70000")])).is_err());
}

#[test]
fn default_max_frame_fits_large_rgba_frame() {
    assert!(DEFAULT_MAX_FRAME_BYTES > 2048 * 2048 * 4);
}
