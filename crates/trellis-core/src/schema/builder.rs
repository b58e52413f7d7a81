use super::{
    Column, History, Mapping, MappingDef, MappingId, Relation, RelationDef, RelationTy, SavePolicy,
    Schema, SqlColumns, RELATION_PREFIX,
};
use crate::{Error, Result};

use heck::ToSnakeCase;
use indexmap::{IndexMap, IndexSet};

/// Collects mapping descriptors and compiles them into a [`Schema`].
#[derive(Debug, Default, Clone)]
pub struct Builder {
    defs: IndexMap<String, MappingDef>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor under a logical name.
    pub fn register(&mut self, name: impl Into<String>, def: MappingDef) -> Result<&mut Self> {
        let name = name.into();

        if self.defs.contains_key(&name) {
            return Err(Error::duplicate_mapping_registration(name));
        }

        def.validate()?;
        self.defs.insert(name, def);
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn build(&self) -> Result<Schema> {
        // Reserve every ID up front so relations can point anywhere,
        // including back at their own mapping.
        let names: IndexMap<String, MappingId> = self
            .defs
            .keys()
            .enumerate()
            .map(|(index, name)| (name.clone(), MappingId(index)))
            .collect();

        let mut mappings = self
            .defs
            .iter()
            .enumerate()
            .map(|(index, (name, def))| self.build_mapping(MappingId(index), name, def, &names))
            .collect::<Result<Vec<_>>>()?;

        let inbound = inbound_key_columns(&mappings);

        for mapping in &mut mappings {
            let inbound = inbound.get(&mapping.id).cloned().unwrap_or_default();
            derive_columns(mapping, inbound);
        }

        Ok(Schema { mappings, names })
    }

    fn build_mapping(
        &self,
        id: MappingId,
        name: &str,
        def: &MappingDef,
        names: &IndexMap<String, MappingId>,
    ) -> Result<Mapping> {
        let table = def
            .table_name
            .clone()
            .ok_or_else(|| Error::missing_required_option("tableName"))?;

        let mut columns = IndexMap::new();

        for column in &def.columns {
            let compiled = Column {
                name: column.name.clone(),
                ty: column.ty,
                get: column.get.clone(),
                set: column.set.clone(),
            };

            if columns.insert(column.name.clone(), compiled).is_some() {
                return Err(Error::invalid_mapping(
                    name,
                    format!("column `{}` is declared twice", column.name),
                ));
            }
        }

        if columns
            .get(&def.identified_by)
            .is_some_and(|column: &Column| column.is_sql())
        {
            return Err(Error::invalid_mapping(
                name,
                format!(
                    "identifying column `{}` cannot be an SQL column",
                    def.identified_by
                ),
            ));
        }

        let history = if def.keep_history {
            let history = History {
                revision_id: def.history_columns.revision_id.clone(),
                parent_id: def.history_columns.parent_id.clone(),
                change_check: def.history_change_check,
            };

            if history.revision_id == def.identified_by {
                return Err(Error::invalid_mapping(
                    name,
                    "the revision column must differ from the identifying column",
                ));
            }

            Some(history)
        } else {
            None
        };

        let mut relations: Vec<Relation> = vec![];

        for relation in &def.relations {
            if relations.iter().any(|existing| existing.name == relation.name) {
                return Err(Error::invalid_mapping(
                    name,
                    format!("relation `{}` is declared twice", relation.name),
                ));
            }

            relations.push(self.build_relation(def, relation, names)?);
        }

        Ok(Mapping {
            id,
            name: name.to_string(),
            table,
            identified_by: def.identified_by.clone(),
            columns,
            relations,
            discriminator: def.discriminator.clone(),
            on_delete: def.on_delete.clone(),
            history,
            regular_columns: vec![],
            sql_columns: SqlColumns::default(),
            qualified_regular_column_names: vec![],
        })
    }

    fn build_relation(
        &self,
        owner: &MappingDef,
        relation: &RelationDef,
        names: &IndexMap<String, MappingId>,
    ) -> Result<Relation> {
        let ty: RelationTy = relation.ty.parse()?;
        let reference = &relation.references;

        let Some(target) = names.get(&reference.mapping).copied() else {
            return Err(Error::unregistered_mapping(&reference.mapping));
        };

        let mapped_by = reference
            .mapped_by
            .clone()
            .unwrap_or_else(|| format!("{}_id", relation.name.to_snake_case()));

        let identifies = match &reference.identifies {
            Some(identifies) => identifies.clone(),
            None => match ty {
                RelationTy::BelongsTo => self.defs[target.0].identified_by.clone(),
                RelationTy::HasOne | RelationTy::HasMany => owner.identified_by.clone(),
            },
        };

        Ok(Relation {
            name: relation.name.clone(),
            key: format!("{RELATION_PREFIX}{}", relation.name),
            ty,
            target,
            type_name: reference.type_name.clone(),
            mapped_by,
            identifies,
            orphan_removal: reference.orphan_removal,
            cascade: reference.cascade,
            save_policy: if reference.save_sequential {
                SavePolicy::Sequential
            } else {
                SavePolicy::Concurrent
            },
        })
    }
}

/// Foreign key columns other mappings' `hasOne`/`hasMany` relations place on
/// each table, together with referenced columns that are not the target's
/// identifier.
fn inbound_key_columns(mappings: &[Mapping]) -> IndexMap<MappingId, Vec<String>> {
    let mut inbound: IndexMap<MappingId, Vec<String>> = IndexMap::new();

    for mapping in mappings {
        for relation in &mapping.relations {
            if relation.is_key_on_related() {
                inbound
                    .entry(relation.target)
                    .or_default()
                    .push(relation.mapped_by.clone());
            } else if relation.identifies != mappings[relation.target.0].identified_by {
                inbound
                    .entry(relation.target)
                    .or_default()
                    .push(relation.identifies.clone());
            }
        }
    }

    inbound
}

fn derive_columns(mapping: &mut Mapping, inbound: Vec<String>) {
    let mut regular = IndexSet::new();

    regular.insert(mapping.identified_by.clone());

    if let Some(history) = &mapping.history {
        regular.insert(history.revision_id.clone());
        regular.insert(history.parent_id.clone());
    }

    for column in mapping.columns.values() {
        if !column.is_sql() {
            regular.insert(column.name.clone());
        }
    }

    for relation in &mapping.relations {
        if relation.is_belongs_to() {
            regular.insert(relation.mapped_by.clone());
        } else {
            regular.insert(relation.identifies.clone());
        }
    }

    regular.extend(inbound);

    let mut sql_columns = SqlColumns::default();

    for column in mapping.columns.values() {
        if column.is_readable() {
            sql_columns.readable.push(column.name.clone());
        }

        if column.is_writable() {
            sql_columns.writable.push(column.name.clone());
        }
    }

    mapping.qualified_regular_column_names =
        regular.iter().map(|column| mapping.qualify(column)).collect();
    mapping.regular_columns = regular.into_iter().collect();
    mapping.sql_columns = sql_columns;
}
