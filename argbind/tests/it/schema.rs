use argbind::schema::{Cardinality, CommandTree};
use argbind::{Config, Parser, Record, SchemaProblem};
use expect_test::expect;

use crate::config;

#[derive(Record, Default, Debug)]
struct Names {
    pub max_count: u32,

    #[arg(tag = "-o,--out,env", placeholder = "FILE")]
    pub output: String,

    #[arg(tag = "--,env:SECRET_TOKEN")]
    pub token: String,

    #[arg(tag = "positional")]
    pub input_files: Vec<String>,
}

#[test]
fn derived_names() {
    let parser = Parser::<Names>::new(Config::new().env_prefix("APP_")).unwrap();
    let tree = parser.tree();
    let arguments: Vec<_> = tree.arguments().map(|(_, argument)| argument).collect();

    let [max_count, output, token, input_files] = arguments.as_slice() else {
        panic!("expected four arguments, got {}", arguments.len());
    };

    assert_eq!(max_count.long.as_deref(), Some("max-count"));
    assert_eq!(max_count.placeholder, "MAX-COUNT");
    assert_eq!(max_count.cardinality, Cardinality::One);
    assert_eq!(max_count.env, None);

    assert_eq!(output.long.as_deref(), Some("out"));
    assert_eq!(output.short, Some('o'));
    assert_eq!(output.placeholder, "FILE");
    assert_eq!(output.env.as_deref(), Some("APP_OUTPUT"));

    assert_eq!(token.long, None);
    assert!(token.is_env_only());
    assert_eq!(token.env.as_deref(), Some("APP_SECRET_TOKEN"));

    assert!(input_files.positional);
    assert_eq!(input_files.long, None);
    assert_eq!(input_files.cardinality, Cardinality::Multiple);
    assert_eq!(input_files.placeholder, "INPUT-FILES");
    assert_eq!(input_files.display_name(), "input_files");
}

#[test]
fn building_is_deterministic() {
    let first = Parser::<Names>::new(config()).unwrap();
    let second = Parser::<Names>::new(config()).unwrap();

    assert_eq!(format!("{:?}", first.tree()), format!("{:?}", second.tree()));
}

#[derive(Record, Default, Debug)]
struct BadTags {
    #[arg(tag = "---name")]
    pub name: String,

    #[arg(tag = "-ab")]
    pub short: String,

    #[arg(tag = "bogus,required")]
    pub bogus: String,

    #[arg(tag = "required", default = "x")]
    pub both: String,

    #[arg(default = "a")]
    pub many: Vec<String>,

    #[arg(default = "nope")]
    pub number: u32,

    #[arg(tag = "--count")]
    pub first: u32,

    #[arg(tag = "--count")]
    pub second: u32,
}

#[test]
fn problems_accumulate() {
    let error = Parser::<BadTags>::new(config()).unwrap_err();

    expect![[r#"
        BadTags.name: too many hyphens in "---name"
        BadTags.short: short names must be one character: "-ab"
        BadTags.bogus: unrecognized tag directive "bogus"
        BadTags.both: 'required' cannot be used with a default value
        BadTags.many: repeated fields cannot have a default value
        BadTags.number: invalid default value: invalid value "nope": invalid digit found in string
        BadTags: duplicate option name --count"#]]
    .assert_eq(&error.to_string());
}

#[derive(Record, Default, Debug)]
struct Child {
    #[arg(tag = "bogus")]
    pub broken: String,
}

#[derive(Record, Default, Debug)]
struct Structural {
    #[arg(tag = "positional")]
    pub file: String,

    #[arg(tag = "subcommand")]
    pub run: Option<Child>,

    #[arg(tag = "subcommand")]
    pub not_a_record: String,

    pub nested: Child,

    #[arg(embed)]
    pub embedded_leaf: String,

    pub unsupported: Vec<Vec<u8>>,
}

#[test]
fn structural_problems() {
    let error = Parser::<Structural>::new(config()).unwrap_err();
    let problems = &error.problems;

    assert_eq!(problems.len(), 6, "{error}");

    assert!(matches!(
        problems[0],
        SchemaProblem::SubcommandTarget { location, .. } if location.field == "not_a_record"
    ));
    assert!(matches!(
        problems[1],
        SchemaProblem::NestedRecord { location } if location.field == "nested"
    ));
    assert!(matches!(
        problems[2],
        SchemaProblem::EmbedTarget { location } if location.field == "embedded_leaf"
    ));
    assert!(matches!(
        problems[3],
        SchemaProblem::Unsupported { location, .. } if location.field == "unsupported"
    ));

    // Problems inside subcommands are reported too, with their own record
    assert_eq!(
        problems[4].to_string(),
        r#"Child.broken: unrecognized tag directive "bogus""#
    );
    assert_eq!(
        problems[5].to_string(),
        "Structural: cannot have both subcommands and positional arguments"
    );
}

#[derive(Record, Default, Debug)]
struct Leaf {
    pub value: u32,
}

#[derive(Record, Default, Debug)]
struct Middle {
    #[arg(tag = "subcommand:leaf")]
    pub leaf: Option<Box<Leaf>>,
}

#[derive(Record, Default, Debug)]
struct Top {
    #[arg(tag = "subcommand")]
    pub middle: Option<Middle>,

    #[arg(tag = "-")]
    pub ignored: Vec<Vec<u8>>,
}

#[test]
fn command_tree_structure() {
    let parser = Parser::<Top>::new(config()).unwrap();
    let tree = parser.tree();

    let middle = tree
        .find_subcommand(CommandTree::ROOT, "middle")
        .expect("middle is a subcommand");
    let leaf = tree
        .find_subcommand(middle, "leaf")
        .expect("leaf is a subcommand of middle");

    assert_eq!(tree.lineage(leaf), [CommandTree::ROOT, middle, leaf]);
    assert_eq!(tree.command(leaf).parent, Some(middle));
    assert_eq!(tree.command(leaf).type_name, "Leaf");
    assert_eq!(tree.root().arguments.len(), 0);

    let value = tree.argument(tree.command(leaf).arguments[0]);
    assert_eq!(value.path.to_string(), "middle.leaf.value");
}
