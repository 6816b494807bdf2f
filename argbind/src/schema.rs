/*!
The schema builder. Walks a record type graph once and produces an immutable
[`CommandTree`], or a [`SchemaError`] listing every problem found along the
way.
*/

use std::collections::HashSet;

use heck::{ToKebabCase as _, ToShoutySnakeCase as _};
use tracing::debug;

use crate::config::Config;
use crate::errors::{FieldLocation, SchemaError, SchemaProblem};
use crate::path::FieldPath;
use crate::reflect::{Dispatch, FieldInfo, Leaf, RecordInfo, Shape, ValueKind};
use crate::tags::{self, Directives, LongName, Naming, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArgumentId(usize);

/// How many tokens an argument consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// A boolean flag.
    Zero,
    One,
    /// A collection; each token adds an element.
    Multiple,
}

/// One bindable field.
#[derive(Debug, Clone)]
pub struct Argument {
    /// Location of the field, from the root record.
    pub path: FieldPath,
    pub field: &'static str,
    pub long: Option<String>,
    pub short: Option<char>,
    pub cardinality: Cardinality,
    pub required: bool,
    pub positional: bool,
    pub separate: bool,
    pub help: Option<String>,
    pub env: Option<String>,
    pub default: Option<&'static str>,
    pub placeholder: String,
    pub shape: Shape,
}

impl Argument {
    /// The name used for this argument in error messages: its long option,
    /// its short option, or (for positionals) its field name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.positional, &self.long, self.short) {
            (false, Some(long), _) => format!("--{long}"),
            (false, None, Some(short)) => format!("-{short}"),
            _ => self.field.to_lowercase(),
        }
    }

    /// True if this argument can be set from the command line by name.
    #[inline]
    #[must_use]
    pub fn is_option(&self) -> bool {
        !self.positional && (self.long.is_some() || self.short.is_some())
    }

    /// True if the only way to set this argument is the environment.
    #[inline]
    #[must_use]
    pub fn is_env_only(&self) -> bool {
        !self.positional && !self.is_option()
    }

    /// Does this option answer to `name`, with its leading hyphens removed?
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        if self.positional {
            return false;
        }

        let mut chars = name.chars();
        let short = match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        };

        self.long.as_deref() == Some(name) || (short.is_some() && self.short == short)
    }

    /// The scalar that one token of this argument converts into.
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> Option<Leaf> {
        self.shape.element()
    }
}

/// The root record or a subcommand.
#[derive(Debug, Clone)]
pub struct Command {
    /// The dispatch name. Empty for the root.
    pub name: String,
    pub help: Option<String>,
    pub type_name: &'static str,

    /// Location of the backing record. `None` for the root.
    pub path: Option<FieldPath>,

    pub arguments: Vec<ArgumentId>,
    pub subcommands: Vec<CommandId>,
    pub parent: Option<CommandId>,
    pub dispatch: Option<Dispatch>,
}

/// Every command and argument reachable from a root record.
#[derive(Debug, Clone)]
pub struct CommandTree {
    commands: Vec<Command>,
    arguments: Vec<Argument>,
}

impl CommandTree {
    pub const ROOT: CommandId = CommandId(0);

    pub fn build(root: RecordInfo, config: &Config) -> Result<Self, SchemaError> {
        let mut builder = Builder {
            config,
            tree: CommandTree {
                commands: Vec::new(),
                arguments: Vec::new(),
            },
            problems: Vec::new(),
        };

        builder.build_command(Pending::root(root));

        if builder.problems.is_empty() {
            debug!(
                record = root.type_name,
                commands = builder.tree.commands.len(),
                arguments = builder.tree.arguments.len(),
                "built command tree",
            );
            Ok(builder.tree)
        } else {
            debug!(
                record = root.type_name,
                problems = builder.problems.len(),
                "schema rejected",
            );
            Err(SchemaError {
                problems: builder.problems,
            })
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Command {
        self.command(Self::ROOT)
    }

    #[inline]
    #[must_use]
    pub fn command(&self, id: CommandId) -> &Command {
        &self.commands[id.0]
    }

    #[inline]
    #[must_use]
    pub fn argument(&self, id: ArgumentId) -> &Argument {
        &self.arguments[id.0]
    }

    pub fn commands(&self) -> impl Iterator<Item = (CommandId, &Command)> {
        self.commands
            .iter()
            .enumerate()
            .map(|(index, command)| (CommandId(index), command))
    }

    pub fn arguments(&self) -> impl Iterator<Item = (ArgumentId, &Argument)> {
        self.arguments
            .iter()
            .enumerate()
            .map(|(index, argument)| (ArgumentId(index), argument))
    }

    /// The chain of commands from the root down to `id`, inclusive.
    #[must_use]
    pub fn lineage(&self, id: CommandId) -> Vec<CommandId> {
        let mut chain: Vec<CommandId> =
            std::iter::successors(Some(id), |&id| self.command(id).parent).collect();
        chain.reverse();
        chain
    }

    /// Find the child of `parent` with the dispatch name `name`.
    #[must_use]
    pub fn find_subcommand(&self, parent: CommandId, name: &str) -> Option<CommandId> {
        self.command(parent)
            .subcommands
            .iter()
            .copied()
            .find(|&id| self.command(id).name == name)
    }
}

/// A command whose fields haven't been visited yet.
struct Pending {
    name: String,
    help: Option<String>,
    path: Option<FieldPath>,
    parent: Option<CommandId>,
    info: RecordInfo,
}

impl Pending {
    fn root(info: RecordInfo) -> Self {
        Self {
            name: String::new(),
            help: info.description.map(str::to_owned),
            path: None,
            parent: None,
            info,
        }
    }
}

struct Builder<'c> {
    config: &'c Config,
    tree: CommandTree,
    problems: Vec<SchemaProblem>,
}

impl Builder<'_> {
    fn build_command(&mut self, pending: Pending) -> CommandId {
        let id = CommandId(self.tree.commands.len());
        let info = pending.info;
        let prefix = pending.path.clone().unwrap_or_default();

        self.tree.commands.push(Command {
            name: pending.name,
            help: pending.help,
            type_name: info.type_name,
            path: pending.path,
            arguments: Vec::new(),
            subcommands: Vec::new(),
            parent: pending.parent,
            dispatch: info.dispatch,
        });

        let mut children = Vec::new();
        self.visit_fields(id, info, &prefix, &mut children);

        for child in children {
            let child_id = self.build_command(child);
            self.tree.commands[id.0].subcommands.push(child_id);
        }

        self.check_command(id);

        debug!(
            command = %self.describe(id),
            arguments = self.tree.command(id).arguments.len(),
            subcommands = self.tree.command(id).subcommands.len(),
            "built command",
        );

        id
    }

    fn visit_fields(
        &mut self,
        command: CommandId,
        info: RecordInfo,
        prefix: &FieldPath,
        children: &mut Vec<Pending>,
    ) {
        for (index, field) in (info.fields)().into_iter().enumerate() {
            let location = FieldLocation {
                record: info.type_name,
                field: field.name,
            };

            if !field.exported && !field.embed {
                continue;
            }

            let directives = match field.tag.map(tags::parse).transpose() {
                Ok(None) => Directives::default(),
                Ok(Some(Tag::Directives(directives))) => directives,
                Ok(Some(Tag::Ignore)) => continue,
                Err(error) => {
                    self.problems.push(SchemaProblem::Tag { location, error });
                    continue;
                }
            };

            let path = prefix.child(index, field.name);
            let shape = (field.shape)();

            if field.embed {
                match shape {
                    Shape::Record(inner) => self.visit_fields(command, inner, &path, children),
                    _ => self.problems.push(SchemaProblem::EmbedTarget { location }),
                }
                continue;
            }

            if let Some(naming) = directives.subcommand {
                match shape {
                    Shape::OptionalRecord(inner) => children.push(Pending {
                        name: match naming {
                            Naming::Explicit(name) => name.to_owned(),
                            Naming::Derived => field.name.to_kebab_case(),
                        },
                        help: directives
                            .help
                            .or(field.help)
                            .or(inner.description)
                            .map(str::to_owned),
                        path: Some(path),
                        parent: Some(command),
                        info: inner,
                    }),
                    _ => self.problems.push(SchemaProblem::SubcommandTarget {
                        location,
                        type_name: shape_name(&shape),
                    }),
                }
                continue;
            }

            if let Some(argument) = self.build_argument(&field, &directives, shape, path, location) {
                let id = ArgumentId(self.tree.arguments.len());
                self.tree.arguments.push(argument);
                self.tree.commands[command.0].arguments.push(id);
            }
        }
    }

    fn build_argument(
        &mut self,
        field: &FieldInfo,
        directives: &Directives<'_>,
        shape: Shape,
        path: FieldPath,
        location: FieldLocation,
    ) -> Option<Argument> {
        let cardinality = match shape {
            Shape::Leaf(leaf) | Shape::Optional(leaf) => match leaf.kind {
                ValueKind::Flag if !directives.positional => Cardinality::Zero,
                _ => Cardinality::One,
            },
            Shape::Sequence(_) | Shape::Map { .. } => Cardinality::Multiple,
            Shape::Record(_) | Shape::OptionalRecord(_) => {
                self.problems.push(SchemaProblem::NestedRecord { location });
                return None;
            }
            Shape::Unsupported(type_name) => {
                self.problems
                    .push(SchemaProblem::Unsupported { location, type_name });
                return None;
            }
        };

        let long = match directives.long {
            LongName::Derived => Some(field.name.to_kebab_case()),
            LongName::Disabled => None,
            LongName::Named(long) => Some(long.to_owned()),
        };

        let placeholder = match (field.placeholder, &long) {
            (Some(placeholder), _) => placeholder.to_owned(),
            (None, Some(long)) => long.to_uppercase(),
            (None, None) => field.name.to_shouty_snake_case(),
        };

        let env = directives.env.map(|naming| match naming {
            Naming::Derived => format!(
                "{}{}",
                self.config.env_prefix,
                field.name.to_shouty_snake_case()
            ),
            Naming::Explicit(name) => format!("{}{name}", self.config.env_prefix),
        });

        if let Some(default) = field.default {
            if directives.required {
                self.problems
                    .push(SchemaProblem::RequiredWithDefault { location });
            }

            if cardinality == Cardinality::Multiple {
                self.problems
                    .push(SchemaProblem::MultipleWithDefault { location });
            } else if let Some(leaf) = shape.element()
                && let Err(source) = leaf.check(default)
            {
                self.problems
                    .push(SchemaProblem::InvalidDefault { location, source });
            }
        }

        Some(Argument {
            path,
            field: field.name,
            long: if directives.positional { None } else { long },
            short: if directives.positional {
                None
            } else {
                directives.short
            },
            cardinality,
            required: directives.required,
            positional: directives.positional,
            separate: directives.separate,
            help: directives.help.or(field.help).map(str::to_owned),
            env,
            default: field.default,
            placeholder,
            shape,
        })
    }

    /// Checks that need the whole command: duplicate names, and the
    /// positional/subcommand exclusion.
    fn check_command(&mut self, id: CommandId) {
        let command = self.tree.command(id);
        let mut names = HashSet::new();
        let mut problems = Vec::new();

        for &argument in &command.arguments {
            let argument = self.tree.argument(argument);
            let forms = [
                argument.long.as_ref().map(|long| format!("--{long}")),
                argument.short.map(|short| format!("-{short}")),
            ];

            for name in forms.into_iter().flatten() {
                if !names.insert(name.clone()) {
                    problems.push(SchemaProblem::DuplicateName {
                        command: self.describe(id),
                        name,
                    });
                }
            }
        }

        let has_positionals = command
            .arguments
            .iter()
            .any(|&argument| self.tree.argument(argument).positional);

        if has_positionals && !command.subcommands.is_empty() {
            problems.push(SchemaProblem::PositionalsAndSubcommands {
                command: self.describe(id),
            });
        }

        self.problems.extend(problems);
    }

    /// `Root` for the root command, `Root.path.to.sub` for subcommands.
    fn describe(&self, id: CommandId) -> String {
        let root = self.tree.root().type_name;

        match self.tree.command(id).path {
            Some(ref path) => format!("{root}.{path}"),
            None => root.to_owned(),
        }
    }
}

fn shape_name(shape: &Shape) -> &'static str {
    match *shape {
        Shape::Leaf(leaf) | Shape::Optional(leaf) | Shape::Sequence(leaf) => leaf.type_name,
        Shape::Map { value, .. } => value.type_name,
        Shape::Record(info) => info.type_name,
        Shape::OptionalRecord(info) => info.type_name,
        Shape::Unsupported(type_name) => type_name,
    }
}
