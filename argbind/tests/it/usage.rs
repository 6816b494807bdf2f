use argbind::schema::CommandTree;
use argbind::usage::{write_error, write_help, write_usage};
use argbind::{Config, Error, Parser, Record};
use expect_test::{Expect, expect};

/// Fetch things from places.
#[derive(Record, Default, Debug)]
struct Fetch {
    /// Where to fetch from.
    #[arg(tag = "positional,required")]
    pub source: String,

    #[arg(tag = "positional", placeholder = "DEST")]
    pub dest: Option<String>,

    #[arg(tag = "-q,--")]
    pub quiet: bool,

    /// How many attempts
    /// to make.
    #[arg(tag = "-r,--retries", default = "3", placeholder = "N")]
    pub retries: u32,

    #[arg(tag = "env:FETCH_TOKEN,help:access token")]
    pub token: Option<String>,

    #[arg(tag = "--,env,help:proxy to use, if any")]
    pub proxy: Option<String>,
}

#[derive(Record, Default, Debug)]
struct Get {
    #[arg(tag = "positional,required")]
    pub key: String,
}

/// List every item.
#[derive(Record, Default, Debug)]
struct List {
    #[arg(tag = "--limit", default = "10")]
    pub limit: u32,

    #[arg(tag = "env:SORT")]
    pub sort: Option<String>,
}

/// Manage a thing.
#[derive(Record, Default, Debug)]
struct Tool {
    /// Log more.
    #[arg(tag = "-v,--verbose")]
    pub verbose: bool,

    /// Fetch one item.
    #[arg(tag = "subcommand")]
    pub get: Option<Get>,

    #[arg(tag = "subcommand:ls")]
    pub list: Option<List>,
}

fn tool() -> Parser<Tool> {
    Parser::new(Config::new().program("tool").version("1.0")).unwrap()
}

fn render(write: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>, expect: Expect) {
    let mut out = Vec::new();
    write(&mut out).unwrap();
    expect.assert_eq(&String::from_utf8(out).unwrap());
}

#[test]
fn root_help() {
    let parser = Parser::<Fetch>::new(Config::new().program("fetch")).unwrap();

    render(
        |out| write_help(out, &parser, CommandTree::ROOT),
        expect![[r#"
            Fetch things from places.
            Usage: fetch [-q] [--retries N] [--token TOKEN] SOURCE [DEST]

            Positional arguments:
              SOURCE                 Where to fetch from.
              DEST

            Options:
              -q
              --retries N, -r N      How many attempts to make. [default: 3]
              --token TOKEN          access token [env: FETCH_TOKEN]
              --help, -h             display this help and exit

            Environment variables:
              PROXY                  proxy to use, if any [env: PROXY]
        "#]],
    );
}

#[test]
fn help_with_subcommands() {
    let parser = tool();

    render(
        |out| write_help(out, &parser, CommandTree::ROOT),
        expect![[r#"
            Manage a thing.
            Usage: tool [--verbose] <command> [<args>]

            Options:
              --verbose, -v          Log more.
              --help, -h             display this help and exit
              --version              display version and exit

            Commands:
              get                    Fetch one item.
              ls                     List every item.
        "#]],
    );
}

#[test]
fn subcommand_help_lists_global_options() {
    let parser = tool();
    let list = parser
        .tree()
        .find_subcommand(CommandTree::ROOT, "ls")
        .unwrap();

    render(
        |out| write_help(out, &parser, list),
        expect![[r#"
            List every item.
            Usage: tool ls [--verbose] [--limit LIMIT] [--sort SORT]

            Options:
              --limit LIMIT          [default: 10]
              --sort SORT            [env: SORT]
              --help, -h             display this help and exit
              --version              display version and exit

            Global options:
              --verbose, -v          Log more.
        "#]],
    );
}

#[test]
fn config_description_and_epilogue() {
    let parser = Parser::<Get>::new(
        Config::new()
            .program("get")
            .description("Look something up.")
            .epilogue("Keys are case sensitive."),
    )
    .unwrap();

    render(
        |out| write_help(out, &parser, CommandTree::ROOT),
        expect![[r#"
            Look something up.
            Usage: get KEY

            Positional arguments:
              KEY

            Options:
              --help, -h             display this help and exit

            Keys are case sensitive.
        "#]],
    );
}

#[test]
fn errors_follow_the_usage_line() {
    let parser = tool();

    render(
        |out| {
            write_error(
                out,
                &parser,
                CommandTree::ROOT,
                &Error::InvalidSubcommand("frob".to_owned()),
            )
        },
        expect![[r#"
            Usage: tool [--verbose] <command> [<args>]
            error: invalid subcommand: frob
        "#]],
    );
}

#[derive(Record, Default, Debug)]
struct Hosts {
    #[arg(tag = "-h,--host")]
    pub host: String,
}

#[test]
fn claimed_help_names_are_not_advertised() {
    let parser = Parser::<Hosts>::new(Config::new().program("hosts")).unwrap();

    render(
        |out| write_help(out, &parser, CommandTree::ROOT),
        expect![[r#"
            Usage: hosts [--host HOST]

            Options:
              --host HOST, -h HOST
              --help                 display this help and exit
        "#]],
    );
}

#[derive(Record, Default, Debug)]
struct Wide {
    pub alpha_option: Option<String>,
    pub bravo_option: Option<String>,
    pub charlie_option: Option<String>,
    pub delta_option: Option<String>,

    /// A description long enough that it has to be wrapped onto a second line
    /// of the help output.
    pub echo_option_with_a_long_name: Option<String>,
}

#[test]
fn long_lines_wrap() {
    let parser = Parser::<Wide>::new(Config::new().program("wide")).unwrap();

    render(
        |out| write_usage(out, &parser, CommandTree::ROOT),
        expect![[r#"
            Usage: wide [--alpha-option ALPHA-OPTION] [--bravo-option BRAVO-OPTION]
                        [--charlie-option CHARLIE-OPTION] [--delta-option DELTA-OPTION]
                        [--echo-option-with-a-long-name ECHO-OPTION-WITH-A-LONG-NAME]
        "#]],
    );

    render(
        |out| write_help(out, &parser, CommandTree::ROOT),
        expect![[r#"
            Usage: wide [--alpha-option ALPHA-OPTION] [--bravo-option BRAVO-OPTION]
                        [--charlie-option CHARLIE-OPTION] [--delta-option DELTA-OPTION]
                        [--echo-option-with-a-long-name ECHO-OPTION-WITH-A-LONG-NAME]

            Options:
              --alpha-option ALPHA-OPTION
              --bravo-option BRAVO-OPTION
              --charlie-option CHARLIE-OPTION
              --delta-option DELTA-OPTION
              --echo-option-with-a-long-name ECHO-OPTION-WITH-A-LONG-NAME
                                     A description long enough that it has to be wrapped
                                     onto a second line of the help output.
              --help, -h             display this help and exit
        "#]],
    );
}
