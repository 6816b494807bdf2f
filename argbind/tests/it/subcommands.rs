use argbind::{Continuation, Error, Parser, Record, is_flag};
use expect_test::expect;

use crate::{NO_ENV, check, config, parse, parse_env};

#[derive(Record, Default, Debug)]
struct Get {
    #[arg(tag = "positional,required")]
    pub key: String,
}

#[derive(Record, Default, Debug)]
struct List {
    pub limit: u32,

    #[arg(tag = "env")]
    pub format: String,

    /// Deeper commands shadow their ancestors.
    #[arg(tag = "--verbose")]
    pub loud: bool,
}

#[derive(Record, Default, Debug)]
struct Add {
    #[arg(tag = "positional,required")]
    pub url: String,

    pub name: Option<String>,
}

#[derive(Record, Default, Debug)]
struct Remote {
    #[arg(tag = "subcommand")]
    pub add: Option<Add>,
}

#[derive(Record, Default, Debug)]
#[arg(dispatch = exec_dispatch)]
struct Exec {
    pub dry_run: bool,

    #[arg(tag = "-")]
    pub command: Vec<String>,
}

/// Options before the program name belong to `exec`; the rest is passed
/// through.
fn exec_dispatch(continuation: &mut Continuation<'_, '_, '_>) -> Result<(), Error> {
    let remaining = continuation.remaining();
    let split = remaining
        .iter()
        .position(|token| !is_flag(token))
        .unwrap_or(remaining.len());
    let (options, command) = remaining.split_at(split);

    continuation.resolve(options)?;

    let exec = continuation
        .destination::<Exec>()
        .ok_or_else(|| Error::custom("wrong destination type"))?;
    exec.command = command.iter().map(|&token| token.to_owned()).collect();

    if exec.command.is_empty() {
        return Err(Error::custom("exec needs a command"));
    }

    Ok(())
}

#[derive(Record, Default, Debug)]
struct Tool {
    #[arg(tag = "-v")]
    pub verbose: bool,

    #[arg(tag = "subcommand")]
    pub get: Option<Box<Get>>,

    #[arg(tag = "subcommand")]
    pub list: Option<List>,

    #[arg(tag = "subcommand")]
    pub remote: Option<Remote>,

    #[arg(tag = "subcommand")]
    pub exec: Option<Exec>,
}

#[test]
fn entering_a_subcommand_allocates_it() {
    let tool: Tool = parse("list --limit 3").unwrap();

    assert_eq!(tool.list.map(|list| list.limit), Some(3));
    assert!(tool.get.is_none());
    assert!(tool.remote.is_none());
}

#[test]
fn no_subcommand() {
    let tool: Tool = parse("-v").unwrap();

    assert!(tool.verbose);
    assert!(tool.get.is_none());
    assert!(tool.list.is_none());
}

#[test]
fn ancestor_options_stay_in_scope() {
    let tool: Tool = parse("list -v").unwrap();
    assert!(tool.verbose);
}

#[test]
fn deeper_options_shadow_ancestors() {
    let tool: Tool = parse("list --verbose").unwrap();

    assert!(!tool.verbose);
    assert!(tool.list.is_some_and(|list| list.loud));
}

#[test]
fn subcommand_options_are_unknown_before_the_subcommand() {
    check::<Tool>("--limit 3 list", expect![[r#"unknown argument --limit"#]]);
}

#[test]
fn invalid_subcommand() {
    check::<Tool>("frobnicate", expect![[r#"invalid subcommand: frobnicate"#]]);
}

#[test]
fn subcommand_requirements_apply_once_entered() {
    check::<Tool>("get", expect![[r#"key is required"#]]);

    let tool: Tool = parse("get k").unwrap();
    assert_eq!(tool.get.map(|get| get.key).as_deref(), Some("k"));
}

#[test]
fn nested_subcommands() {
    let tool: Tool = parse("remote add --name origin https://example.com").unwrap();
    let add = tool.remote.and_then(|remote| remote.add).expect("add was entered");

    assert_eq!(add.url, "https://example.com");
    assert_eq!(add.name.as_deref(), Some("origin"));
}

#[test]
fn unreached_subcommands_ignore_the_environment() {
    let tool: Tool = parse_env("", &["FORMAT=json"]).unwrap();
    assert!(tool.list.is_none());

    let tool: Tool = parse_env("list", &["FORMAT=json"]).unwrap();
    assert_eq!(tool.list.map(|list| list.format).as_deref(), Some("json"));
}

#[test]
fn resolver_tracks_the_leaf() {
    let parser = Parser::<Tool>::new(config()).unwrap();
    let mut tool = Tool::default();
    let mut resolver = parser.resolver(&mut tool);

    resolver.process_command_line(&["remote", "add", "url"]).unwrap();

    let tree = parser.tree();
    assert_eq!(resolver.subcommand_names(), ["remote", "add"]);
    assert_eq!(tree.command(resolver.leaf()).name, "add");

    // root -v, add --name and add's positional
    assert_eq!(resolver.in_scope().len(), 3);
}

#[test]
fn custom_dispatch() {
    let tool: Tool = parse("-v exec --dry-run ls -la --color").unwrap();
    let exec = tool.exec.expect("exec was entered");

    assert!(tool.verbose);
    assert!(exec.dry_run);
    assert_eq!(exec.command, ["ls", "-la", "--color"]);
}

#[test]
fn custom_dispatch_shares_scope_and_errors() {
    let tool: Tool = parse("exec -v ls").unwrap();
    assert!(tool.verbose);

    check::<Tool>("exec --dry-run", expect![[r#"exec needs a command"#]]);
    check::<Tool>("exec --bogus ls", expect![[r#"unknown argument --bogus"#]]);
}

#[derive(Record, Default, Debug)]
struct Plain {
    pub flag: bool,
}

#[derive(Record, Default, Debug)]
#[arg(dispatch = pass_through)]
struct Hooked {
    pub flag: bool,
}

fn pass_through(continuation: &mut Continuation<'_, '_, '_>) -> Result<(), Error> {
    continuation.resolve_remaining()
}

#[derive(Record, Default, Debug)]
struct Named {
    pub name: String,

    #[arg(tag = "separate")]
    pub tags: Vec<String>,

    #[arg(tag = "subcommand")]
    pub plain: Option<Plain>,

    #[arg(tag = "subcommand")]
    pub hooked: Option<Hooked>,
}

#[test]
fn dispatch_continues_the_same_phase() {
    for subcommand in ["plain", "hooked"] {
        let named: Named =
            parse(&format!("--name a --tags x {subcommand} --name b --tags y")).unwrap();

        assert_eq!(named.name, "b", "{subcommand}");
        assert_eq!(named.tags, ["x", "y"], "{subcommand}");
    }
}

#[test]
fn parse_reuses_the_tree() {
    let parser = Parser::<Tool>::new(config()).unwrap();

    let mut first = Tool::default();
    parser.parse(&mut first, &["prog", "get", "a"], NO_ENV).unwrap();

    let mut second = Tool::default();
    parser.parse(&mut second, &["prog", "list"], NO_ENV).unwrap();

    assert!(first.get.is_some() && first.list.is_none());
    assert!(second.list.is_some() && second.get.is_none());
}
