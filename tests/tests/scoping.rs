//! Discriminators restrict every statement a mapping issues; `onDelete`
//! patches turn removal into an update.

use tests::*;

use pretty_assertions::assert_eq;
use trellis::{
    patch,
    stmt::{Expr, Value},
    Db, FetchOptions, MappingDef, Record, Registry, RemoveOptions, SaveMethod, SaveOptions,
};

const FLEET: &str = "
    CREATE TABLE vehicles (
        id INTEGER PRIMARY KEY,
        kind TEXT NOT NULL,
        name TEXT,
        deleted INTEGER NOT NULL DEFAULT 0
    );
    INSERT INTO vehicles (kind, name) VALUES ('truck', 'hauler');
";

fn fleet(db: &Db) -> Registry {
    let registry = registry(db);
    registry
        .register(
            "Sedan",
            "default",
            MappingDef::new("vehicles")
                .columns(["kind", "name"])
                .discriminator_sql("kind = 'sedan' AND deleted = 0")
                .on_delete(patch!("deleted" => 1)),
        )
        .unwrap();
    registry
}

async fn discriminator_hides_other_rows(test: &mut DbTest) {
    let db = test.setup_db(FLEET).await;
    let sedans = fleet(&db).repository("Sedan").unwrap();

    let mut sedan = Record::new().with("kind", "sedan").with("name", "civic");
    sedans.save(&mut sedan, &SaveOptions::new()).await.unwrap();

    let all = sedans
        .find_where(Expr::raw("1 = 1"), &FetchOptions::new())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].value("name"), &Value::from("civic"));

    // The truck inserted by the fixture has id 1
    assert_none!(sedans.find_one(1, &FetchOptions::new()).await.unwrap());
    assert_eq!(sedans.query().count().await.unwrap(), 1);

    // Updates are scoped too, so the truck cannot be overwritten
    let mut truck = Record::new().with("id", 1).with("name", "renamed");
    let err = assert_err!(
        sedans
            .save(&mut truck, &SaveOptions::new().method(SaveMethod::Update))
            .await
    );
    assert!(err.is_record_not_found());
    assert_eq!(err.to_string(), "record not found: table=vehicles key=1");
}

async fn on_delete_patch_soft_deletes(test: &mut DbTest) {
    let db = test.setup_db(FLEET).await;
    let sedans = fleet(&db).repository("Sedan").unwrap();

    let mut sedan = Record::new().with("kind", "sedan").with("name", "civic");
    sedans.save(&mut sedan, &SaveOptions::new()).await.unwrap();
    let id = sedan.value("id").clone();

    let mut log = test.log();
    log.clear();

    sedans
        .remove(&mut sedan, &RemoveOptions::new())
        .await
        .unwrap();

    assert_eq!(log.deletes_from("vehicles"), 0);
    assert_eq!(log.updates_of("vehicles"), 1);
    assert_eq!(sedan.value("deleted"), &Value::I64(1));

    assert_none!(sedans.find_one(id.clone(), &FetchOptions::new()).await.unwrap());

    let row = db
        .query("vehicles")
        .where_eq("id", id)
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["deleted"], Value::I64(1));
    assert_eq!(db.query("vehicles").count().await.unwrap(), 2);
}

tests!(discriminator_hides_other_rows, on_delete_patch_soft_deletes);
