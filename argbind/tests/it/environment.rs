use argbind::{Parser, Record};
use expect_test::expect;

use crate::{NO_ENV, config, parse_env, parse_with};

#[derive(Record, Default, Debug)]
struct Server {
    #[arg(tag = "--port,env", default = "8080")]
    pub port: u16,

    #[arg(tag = "env:SERVER_HOST", default = "localhost")]
    pub host: String,

    #[arg(tag = "--,env,required")]
    pub token: String,

    #[arg(tag = "env")]
    pub peers: Vec<String>,

    #[arg(tag = "env")]
    pub debug: bool,
}

#[test]
fn command_line_beats_environment_beats_default() {
    let server: Server = parse_env("--port 1", &["PORT=2", "TOKEN=t"]).unwrap();
    assert_eq!(server.port, 1);

    let server: Server = parse_env("", &["PORT=2", "TOKEN=t"]).unwrap();
    assert_eq!(server.port, 2);

    let server: Server = parse_env("", &["TOKEN=t"]).unwrap();
    assert_eq!(server.port, 8080);
    assert_eq!(server.host, "localhost");
}

#[test]
fn explicit_environment_names() {
    let server: Server = parse_env("", &["SERVER_HOST=example.com", "TOKEN=t"]).unwrap();

    assert_eq!(server.host, "example.com");
    assert_eq!(server.token, "t");
}

#[test]
fn later_pairs_win() {
    let server: Server = parse_env("", &["PORT=1", "TOKEN=t", "PORT=2"]).unwrap();
    assert_eq!(server.port, 2);
}

#[test]
fn multiple_values_are_csv() {
    let server: Server = parse_env("", &["TOKEN=t", r#"PEERS=a,b,"c,d""#]).unwrap();
    assert_eq!(server.peers, ["a", "b", "c,d"]);

    let server: Server = parse_env("", &["TOKEN=t", "PEERS="]).unwrap();
    assert!(server.peers.is_empty());
}

#[test]
fn quotes_follow_csv_rules() {
    let server: Server = parse_env("", &["TOKEN=t", r#"PEERS="say ""hi""",b"#]).unwrap();
    assert_eq!(server.peers, [r#"say "hi""#, "b"]);

    let error = parse_env::<Server>("", &["TOKEN=t", r#"PEERS=a"b,c"#]).unwrap_err();
    expect![[r#"error reading a CSV string from environment variable PEERS with multiple values: bare " in non-quoted field"#]]
        .assert_eq(&error.to_string());

    let error = parse_env::<Server>("", &["TOKEN=t", r#"PEERS="a,b"#]).unwrap_err();
    expect![[r#"error reading a CSV string from environment variable PEERS with multiple values: extraneous or missing " in quoted field"#]]
        .assert_eq(&error.to_string());

    let error = parse_env::<Server>("", &["TOKEN=t", r#"PEERS="a"x,b"#]).unwrap_err();
    expect![[r#"error reading a CSV string from environment variable PEERS with multiple values: extraneous or missing " in quoted field"#]]
        .assert_eq(&error.to_string());
}

#[test]
fn flags_from_the_environment() {
    let server: Server = parse_env("", &["TOKEN=t", "DEBUG=true"]).unwrap();
    assert!(server.debug);
}

#[test]
fn environment_errors() {
    let error = parse_env::<Server>("", &["TOKEN=t", "PORT=abc"]).unwrap_err();

    expect![[r#"error processing environment variable PORT: invalid value "abc": invalid digit found in string"#]]
        .assert_eq(&error.to_string());

    let error = parse_env::<Server>("", NO_ENV).unwrap_err();
    expect![[r#"environment variable TOKEN is required"#]].assert_eq(&error.to_string());
}

#[derive(Record, Default, Debug)]
struct Key {
    #[arg(tag = "required,env")]
    pub key: String,
}

#[test]
fn required_with_environment_alternative() {
    let error = parse_env::<Key>("", NO_ENV).unwrap_err();
    expect![[r#"--key is required (or environment variable KEY)"#]].assert_eq(&error.to_string());

    let key: Key = parse_env("", &["KEY=k"]).unwrap();
    assert_eq!(key.key, "k");
}

#[test]
fn prefix_applies_to_every_name() {
    let server: Server = parse_with(
        config().env_prefix("APP_"),
        "",
        &["APP_TOKEN=t", "APP_SERVER_HOST=h", "PORT=1"],
    )
    .unwrap();

    assert_eq!(server.token, "t");
    assert_eq!(server.host, "h");
    assert_eq!(server.port, 8080);
}

#[test]
fn ignored_phases() {
    let error = parse_with::<Key>(config().ignore_env(true), "", &["KEY=k"]).unwrap_err();
    expect![[r#"--key is required (or environment variable KEY)"#]].assert_eq(&error.to_string());

    let server: Server = parse_with(config().ignore_default(true), "", &["TOKEN=t"]).unwrap();
    assert_eq!(server.port, 0);
    assert_eq!(server.host, "");
}

#[test]
fn environment_phase_does_not_overwrite() {
    let parser = Parser::<Server>::new(config()).unwrap();
    let mut server = Server::default();
    let mut resolver = parser.resolver(&mut server);

    resolver.process_environment(&["PORT=1"]).unwrap();
    resolver.process_environment(&["PORT=2"]).unwrap();
    resolver.process_defaults().unwrap();

    assert_eq!(server.port, 1);
}

#[test]
fn overwriting_environment_and_defaults() {
    let parser = Parser::<Server>::new(config()).unwrap();
    let mut server = Server::default();
    let mut resolver = parser.resolver(&mut server);

    resolver.process_command_line(&["--port", "1"]).unwrap();
    resolver.overwrite_with_environment(&["PORT=2"]).unwrap();
    resolver.process_defaults().unwrap();
    let after_environment = resolver.is_seen(parser.tree().root().arguments[0]);
    resolver.overwrite_with_defaults().unwrap();

    assert!(after_environment);
    assert_eq!(server.port, 8080);
}

#[test]
fn default_round_trip() {
    let server: Server = parse_env("", &["TOKEN=t"]).unwrap();
    assert_eq!(server.port, 8080);
    assert_eq!(server.host, "localhost");
    assert!(server.peers.is_empty());
}
