use crate::{
    engine::{EagerLoad, FetchPlan},
    Result,
};

use trellis_core::{
    schema::{Mapping, MappingId, Relation, RELATION_PREFIX},
    stmt::{self, Expr, Returning, SelectItem},
    Schema,
};

use std::collections::HashMap;

/// Turns `exclude`/`columns` options into the select list of the root
/// records and the eager load of the relation tree below them.
#[derive(Debug)]
pub(crate) struct RelationOptions<'a> {
    schema: &'a Schema,
    mapping: &'a Mapping,
    exclude: &'a [String],
    columns: &'a [String],
}

/// A resolved fetch: root select list plus what to load under it.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    pub(crate) root: Vec<SelectItem>,
    pub(crate) fetch: FetchPlan,
}

/// A relation reachable from the root mapping.
struct Node<'a> {
    /// Dot separated relation names
    path: String,
    parent: String,
    relation: &'a Relation,
    target: &'a Mapping,
}

impl<'a> RelationOptions<'a> {
    pub(crate) fn new(schema: &'a Schema, mapping: &'a Mapping) -> RelationOptions<'a> {
        RelationOptions {
            schema,
            mapping,
            exclude: &[],
            columns: &[],
        }
    }

    pub(crate) fn exclude(mut self, exclude: &'a [String]) -> RelationOptions<'a> {
        self.exclude = exclude;
        self
    }

    pub(crate) fn columns(mut self, columns: &'a [String]) -> RelationOptions<'a> {
        self.columns = columns;
        self
    }

    pub(crate) fn build(&self) -> Result<Plan> {
        let mut nodes = vec![];
        collect(
            self.schema,
            self.mapping,
            &mut vec![],
            &mut vec![self.mapping.id],
            &mut nodes,
        );

        let rules = Rules::parse(self.exclude, self.columns, &nodes);
        nodes.retain(|node| !rules.excludes_relation(&node.path));

        let mut eager = EagerLoad::new();
        let mut sql_columns: HashMap<MappingId, Vec<String>> = HashMap::new();

        let root = self.node_columns(&rules, "", self.mapping, None, &nodes, &mut sql_columns);

        for node in &nodes {
            let items = self.node_columns(
                &rules,
                &node.path,
                node.target,
                Some(node.relation),
                &nodes,
                &mut sql_columns,
            );

            eager.push_with(&node.path, move |select: &mut stmt::Select| {
                select.returning = Returning::Items(items.clone());
            });
        }

        Ok(Plan {
            root,
            fetch: FetchPlan {
                eager,
                sql_columns: Some(sql_columns),
            },
        })
    }

    /// Select list of one node, recording its readable SQL columns.
    fn node_columns(
        &self,
        rules: &Rules,
        path: &str,
        mapping: &Mapping,
        incoming: Option<&Relation>,
        nodes: &[Node<'_>],
        sql_columns: &mut HashMap<MappingId, Vec<String>>,
    ) -> Vec<SelectItem> {
        let mut required = vec![mapping.identified_by.as_str(), mapping.physical_key()];

        if let Some(relation) = incoming {
            required.push(if relation.is_belongs_to() {
                relation.identifies.as_str()
            } else {
                relation.mapped_by.as_str()
            });
        }

        for child in nodes.iter().filter(|node| node.parent == path) {
            required.push(if child.relation.is_belongs_to() {
                child.relation.mapped_by.as_str()
            } else {
                child.relation.identifies.as_str()
            });
        }

        let items = mapping
            .regular_columns
            .iter()
            .filter(|column| required.contains(&column.as_str()) || rules.selects(path, column))
            .map(|column| SelectItem::aliased(Expr::column(mapping.qualify(column)), column))
            .collect();

        let selected = sql_columns.entry(mapping.id).or_default();
        for column in &mapping.sql_columns.readable {
            if rules.selects(path, column) && !selected.contains(column) {
                selected.push(column.clone());
            }
        }

        items
    }
}

impl Plan {
    /// A select over the mapping's table returning the root columns,
    /// restricted by its discriminator and, with history, to the latest
    /// revisions.
    pub(crate) fn select(&self, mapping: &Mapping) -> stmt::Select {
        let mut select = self.select_any_revision(mapping);

        if let Some(latest) = mapping.latest_revision_filter() {
            select.and_filter(latest);
        }

        select
    }

    /// Like [`select`](Plan::select), but every revision is visible.
    pub(crate) fn select_any_revision(&self, mapping: &Mapping) -> stmt::Select {
        let mut select = stmt::Select::new(&mapping.table);
        select.returning = Returning::Items(self.root.clone());

        if let Some(discriminator) = &mapping.discriminator {
            select.and_filter(discriminator.clone());
        }

        select
    }
}

/// Walks every relation path from `mapping`, stopping where a path would
/// revisit a mapping already on it.
fn collect<'a>(
    schema: &'a Schema,
    mapping: &'a Mapping,
    prefix: &mut Vec<&'a str>,
    visiting: &mut Vec<MappingId>,
    out: &mut Vec<Node<'a>>,
) {
    for relation in &mapping.relations {
        if visiting.contains(&relation.target) {
            continue;
        }

        let target = schema.mapping(relation.target);
        let parent = prefix.join(".");

        prefix.push(&relation.name);
        out.push(Node {
            path: prefix.join("."),
            parent,
            relation,
            target,
        });

        visiting.push(target.id);
        collect(schema, target, prefix, visiting, out);
        visiting.pop();
        prefix.pop();
    }
}

#[derive(Debug, Default)]
struct Rules {
    all_relations: bool,

    /// Relation paths excluded along with everything below them
    relations: Vec<String>,

    /// `(relation path, column)`; the root path is empty
    excluded_columns: Vec<(String, String)>,
    selected_columns: Vec<(String, String)>,
}

impl Rules {
    fn parse(exclude: &[String], columns: &[String], nodes: &[Node<'_>]) -> Rules {
        let mut rules = Rules::default();

        for rule in exclude {
            let rule = normalize(rule);

            if rule == "*" {
                rules.all_relations = true;
            } else if let Some(path) = rule.strip_suffix(".*") {
                rules.relations.push(path.to_string());
            } else if nodes.iter().any(|node| node.path == rule) {
                rules.relations.push(rule);
            } else {
                rules.excluded_columns.push(split_column(&rule));
            }
        }

        rules.selected_columns = columns
            .iter()
            .map(|column| split_column(&normalize(column)))
            .collect();
        rules
    }

    fn excludes_relation(&self, path: &str) -> bool {
        self.all_relations
            || self.relations.iter().any(|excluded| {
                path == excluded
                    || path
                        .strip_prefix(excluded.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
    }

    /// Whether `column` of the node at `path` is selected, before required
    /// columns are added back.
    fn selects(&self, path: &str, column: &str) -> bool {
        let matches = |(rule_path, rule_column): &(String, String)| {
            rule_path == path && rule_column == column
        };

        if self.excluded_columns.iter().any(matches) {
            return false;
        }

        let restricted = self
            .selected_columns
            .iter()
            .any(|(rule_path, _)| rule_path == path);

        !restricted || self.selected_columns.iter().any(matches)
    }
}

/// Strips the `relation_` prefix from every segment.
fn normalize(path: &str) -> String {
    path.split('.')
        .map(|segment| segment.strip_prefix(RELATION_PREFIX).unwrap_or(segment))
        .collect::<Vec<_>>()
        .join(".")
}

fn split_column(path: &str) -> (String, String) {
    match path.rsplit_once('.') {
        Some((path, column)) => (path.to_string(), column.to_string()),
        None => (String::new(), path.to_string()),
    }
}
