//! `hasOne`/`hasMany` relations: cascading saves, key-only saves and
//! detaching on remove.

use tests::*;

use pretty_assertions::assert_eq;
use trellis::{
    stmt::Value, Db, FetchOptions, MappingDef, Record, Registry, RelationDef, RemoveOptions,
    SaveOptions,
};

const KENNEL: &str = "
    CREATE TABLE owners (id INTEGER PRIMARY KEY, name TEXT);
    CREATE TABLE pets (id INTEGER PRIMARY KEY, name TEXT, owner_id INTEGER);
    CREATE TABLE toys (id INTEGER PRIMARY KEY, label TEXT, owner_id INTEGER);
    CREATE TABLE licenses (id INTEGER PRIMARY KEY, code TEXT, holder_id INTEGER);
";

fn kennel(db: &Db) -> Registry {
    let registry = registry(db);
    registry
        .register(
            "Owner",
            "default",
            MappingDef::new("owners")
                .columns(["name"])
                .relation(RelationDef::has_many("pets", "Pet").mapped_by("owner_id"))
                .relation(
                    RelationDef::has_many("toys", "Toy")
                        .mapped_by("owner_id")
                        .cascade()
                        .save_sequential(),
                )
                .relation(
                    RelationDef::has_one("license", "License")
                        .mapped_by("holder_id")
                        .cascade(),
                ),
        )
        .unwrap();
    registry
        .register("Pet", "default", MappingDef::new("pets").columns(["name"]))
        .unwrap();
    registry
        .register("Toy", "default", MappingDef::new("toys").columns(["label"]))
        .unwrap();
    registry
        .register("License", "default", MappingDef::new("licenses").columns(["code"]))
        .unwrap();
    registry
}

async fn without_cascade_only_the_key_is_written(test: &mut DbTest) {
    let db = test.setup_db(KENNEL).await;
    let registry = kennel(&db);
    let owners = registry.repository("Owner").unwrap();
    let pets = registry.repository("Pet").unwrap();

    let mut rex = Record::new().with("name", "rex");
    pets.save(&mut rex, &SaveOptions::new()).await.unwrap();
    let rex_id = rex.value("id").clone();

    rex.set("name", "renamed");

    let mut owner = Record::new().with("name", "ann").with_related(
        "pets",
        vec![rex, Record::new().with("name", "pup")],
    );

    let mut log = test.log();
    log.clear();

    owners.save(&mut owner, &SaveOptions::new()).await.unwrap();
    let owner_id = owner.value("id").clone();

    assert_eq!(log.inserts_into("pets"), 0);
    assert_eq!(log.updates_of("pets"), 1);
    assert_eq!(db.query("pets").count().await.unwrap(), 1);

    // Both members point at the owner in memory
    for pet in owner.many("pets").unwrap() {
        assert_eq!(pet.value("owner_id"), &owner_id);
    }

    // The stored content is untouched, only the key moved
    let stored = pets
        .find_one(rex_id, &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value("name"), &Value::from("rex"));
    assert_eq!(stored.value("owner_id"), &owner_id);
}

async fn remove_without_cascade_detaches_members(test: &mut DbTest) {
    let db = test.setup_db(KENNEL).await;
    let registry = kennel(&db);
    let owners = registry.repository("Owner").unwrap();
    let pets = registry.repository("Pet").unwrap();

    let mut rex = Record::new().with("name", "rex");
    pets.save(&mut rex, &SaveOptions::new()).await.unwrap();

    let mut owner = Record::new()
        .with("name", "ann")
        .with_related("pets", vec![rex.clone()]);
    owners.save(&mut owner, &SaveOptions::new()).await.unwrap();

    let mut found = owners
        .find_one(owner.value("id").clone(), &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.many("pets").unwrap().len(), 1);

    owners.remove(&mut found, &RemoveOptions::new()).await.unwrap();

    assert_eq!(db.query("owners").count().await.unwrap(), 0);
    assert_eq!(db.query("pets").count().await.unwrap(), 1);
    assert_eq!(found.many("pets").unwrap()[0].value("owner_id"), &Value::Null);

    let stored = pets
        .find_one(rex.value("id").clone(), &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value("owner_id"), &Value::Null);
}

async fn cascade_saves_members_after_the_owner(test: &mut DbTest) {
    let db = test.setup_db(KENNEL).await;
    let owners = kennel(&db).repository("Owner").unwrap();

    let mut owner = Record::new()
        .with("name", "ann")
        .with_related("license", Record::new().with("code", "K-9"))
        .with_related(
            "toys",
            vec![
                Record::new().with("label", "ball"),
                Record::new().with("label", "rope"),
                Record::new().with("label", "bone"),
            ],
        );

    owners.save(&mut owner, &SaveOptions::new()).await.unwrap();
    let owner_id = owner.value("id").clone();

    assert_eq!(owner.one("license").unwrap().value("holder_id"), &owner_id);

    // Sequential saves insert in collection order
    let ids: Vec<i64> = owner
        .many("toys")
        .unwrap()
        .iter()
        .map(|toy| toy.value("id").as_i64().unwrap())
        .collect();
    assert_eq!(ids, [1, 2, 3]);

    let found = owners
        .find_one(owner_id, &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.one("license").unwrap().value("code"), &Value::from("K-9"));
    assert_eq!(found.many("toys").unwrap().len(), 3);
    assert!(found.many("pets").unwrap().is_empty());
}

tests!(
    without_cascade_only_the_key_is_written,
    remove_without_cascade_detaches_members,
    cascade_saves_members_after_the_owner,
);
