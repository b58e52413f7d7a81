//! Saving and removing a car together with its engine, its parts and the
//! parts' makers.

use tests::*;

use pretty_assertions::assert_eq;
use trellis::{
    stmt::Value, Db, FetchOptions, MappingDef, Record, Registry, Related, RelationDef,
    RemoveOptions, SaveMethod, SaveOptions,
};

const GARAGE: &str = "
    CREATE TABLE engines (id INTEGER PRIMARY KEY, power INTEGER);
    CREATE TABLE cars (id INTEGER PRIMARY KEY, name TEXT, engine_id INTEGER);
    CREATE TABLE makers (id INTEGER PRIMARY KEY, name TEXT);
    CREATE TABLE parts (id INTEGER PRIMARY KEY, label TEXT, maker_id INTEGER, car_id INTEGER);
";

fn garage(db: &Db) -> Registry {
    let registry = registry(db);
    registry
        .register(
            "Car",
            "default",
            MappingDef::new("cars")
                .columns(["name"])
                .relation(
                    RelationDef::has_many("parts", "Part")
                        .mapped_by("car_id")
                        .cascade()
                        .orphan_removal(),
                )
                .relation(RelationDef::belongs_to("engine", "Engine").cascade().orphan_removal()),
        )
        .unwrap();
    registry
        .register(
            "Part",
            "default",
            MappingDef::new("parts")
                .columns(["label"])
                .relation(RelationDef::belongs_to("maker", "Maker").cascade()),
        )
        .unwrap();
    registry
        .register("Maker", "default", MappingDef::new("makers").columns(["name"]))
        .unwrap();
    registry
        .register("Engine", "default", MappingDef::new("engines").columns(["power"]))
        .unwrap();
    registry
}

fn beetle() -> Record {
    Record::new()
        .with("name", "beetle")
        .with_related("engine", Record::new().with("power", 50))
        .with_related(
            "parts",
            vec![
                Record::new()
                    .with("label", "wheel")
                    .with_related("maker", Record::new().with("name", "acme")),
                Record::new().with("label", "seat"),
            ],
        )
}

fn by_label<'a>(record: &'a Record, label: &str) -> &'a Record {
    record
        .many("parts")
        .unwrap()
        .iter()
        .find(|part| part.value("label") == &Value::from(label))
        .unwrap()
}

async fn count(db: &Db, table: &str) -> u64 {
    db.query(table).count().await.unwrap()
}

async fn save_and_fetch_relation_tree(test: &mut DbTest) {
    let db = test.setup_db(GARAGE).await;
    let cars = garage(&db).repository("Car").unwrap();

    let mut car = beetle();
    cars.save(&mut car, &SaveOptions::new()).await.unwrap();

    let id = car.value("id").clone();
    assert!(!id.is_null());

    // Keys are copied in both directions
    let engine = car.one("engine").unwrap();
    assert_eq!(car.value("engine_id"), engine.value("id"));
    for part in car.many("parts").unwrap() {
        assert_eq!(part.value("car_id"), &id);
    }

    let wheel = by_label(&car, "wheel");
    assert_eq!(
        wheel.value("maker_id"),
        wheel.one("maker").unwrap().value("id")
    );

    let found = cars
        .find_one(id.clone(), &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.value("name"), &Value::from("beetle"));
    assert_eq!(found.one("engine").unwrap().value("power"), &Value::I64(50));
    assert_eq!(found.many("parts").unwrap().len(), 2);

    let wheel = by_label(&found, "wheel");
    assert_eq!(wheel.one("maker").unwrap().value("name"), &Value::from("acme"));

    // A missing singular relation is left out rather than loaded empty
    let seat = by_label(&found, "seat");
    assert_none!(seat.related("maker"));
    assert_eq!(seat.value("maker_id"), &Value::Null);
}

async fn detached_parts_are_removed_as_orphans(test: &mut DbTest) {
    let db = test.setup_db(GARAGE).await;
    let cars = garage(&db).repository("Car").unwrap();

    let mut car = beetle();
    cars.save(&mut car, &SaveOptions::new()).await.unwrap();
    let id = car.value("id").clone();

    let mut found = cars
        .find_one(id.clone(), &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();

    let seat_id = by_label(&found, "seat").value("id").clone();
    let seat = cars.detach(&mut found, "parts", &seat_id).unwrap().unwrap();
    assert_eq!(seat.value("car_id"), &Value::Null);

    cars.save(&mut found, &SaveOptions::new()).await.unwrap();

    let found = cars
        .find_one(id, &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();

    let parts = found.many("parts").unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].value("label"), &Value::from("wheel"));

    assert_eq!(count(&db, "parts").await, 1);
    assert_eq!(count(&db, "makers").await, 1);
}

async fn cleared_belongs_to_removes_the_referenced_row(test: &mut DbTest) {
    let db = test.setup_db(GARAGE).await;
    let cars = garage(&db).repository("Car").unwrap();

    let mut car = beetle();
    cars.save(&mut car, &SaveOptions::new()).await.unwrap();
    let id = car.value("id").clone();
    assert_eq!(count(&db, "engines").await, 1);

    car.set_related("engine", Related::Null);
    cars.save(&mut car, &SaveOptions::new()).await.unwrap();

    assert_eq!(car.value("engine_id"), &Value::Null);
    assert_eq!(count(&db, "engines").await, 0);

    let found = cars
        .find_one(id, &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.value("engine_id"), &Value::Null);
    assert_none!(found.related("engine"));
}

async fn remove_cascades_through_the_tree(test: &mut DbTest) {
    let db = test.setup_db(GARAGE).await;
    let cars = garage(&db).repository("Car").unwrap();

    let mut car = beetle();
    cars.save(&mut car, &SaveOptions::new()).await.unwrap();

    let mut found = cars
        .find_one(car.value("id").clone(), &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();

    let mut log = test.log();
    log.clear();

    cars.remove(&mut found, &RemoveOptions::new()).await.unwrap();

    for table in ["cars", "parts", "makers", "engines"] {
        assert_eq!(count(&db, table).await, 0, "{table} not empty");
    }

    assert_eq!(log.deletes_from("cars"), 1);
    assert_eq!(log.deletes_from("parts"), 2);
    assert_eq!(log.deletes_from("makers"), 1);
    assert_eq!(log.deletes_from("engines"), 1);

    // Parts go before the car, the engine after it
    let tables: Vec<String> = log
        .statements()
        .iter()
        .filter(|stmt| stmt.is_delete())
        .map(|stmt| stmt.table().to_string())
        .collect();
    let car_at = tables.iter().position(|table| table == "cars").unwrap();
    assert!(tables[..car_at].iter().all(|table| table != "engines"));
    assert!(tables[car_at + 1..].iter().all(|table| table != "parts"));
}

async fn plain_values_in_relation_slots_are_rejected(test: &mut DbTest) {
    let db = test.setup_db(GARAGE).await;
    let cars = garage(&db).repository("Car").unwrap();

    let mut car = Record::new()
        .with("name", "beetle")
        .with_related("engine", Value::from("v8"));

    let err = assert_err!(cars.save(&mut car, &SaveOptions::new()).await);
    assert!(err.is_unsaveable_related_value());
    assert_eq!(
        err.to_string(),
        "related value of `engine` cannot be saved; found String"
    );

    // The referenced side is handled before the car's own row
    assert_eq!(count(&db, "cars").await, 0);

    let mut car = Record::new()
        .with("id", 1)
        .with_related("parts", Value::from(3));

    let err = assert_err!(cars.remove(&mut car, &RemoveOptions::new()).await);
    assert!(err.is_unremovable_related_value());
}

async fn save_method_overrides_detection(test: &mut DbTest) {
    let db = test.setup_db(GARAGE).await;
    let cars = garage(&db).repository("Car").unwrap();

    // An explicit identifier would normally mean update
    let mut car = Record::new().with("id", 10).with("name", "beetle");
    cars.save(&mut car, &SaveOptions::new().method(SaveMethod::Insert))
        .await
        .unwrap();

    let found = cars
        .find_one(10, &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.value("name"), &Value::from("beetle"));

    let mut missing = Record::new().with("id", 11).with("name", "golf");
    let err = assert_err!(cars.save(&mut missing, &SaveOptions::new()).await);
    assert!(err.is_record_not_found());
}

async fn saving_again_updates_in_place(test: &mut DbTest) {
    let db = test.setup_db(GARAGE).await;
    let cars = garage(&db).repository("Car").unwrap();

    let mut car = beetle();
    cars.save(&mut car, &SaveOptions::new()).await.unwrap();

    car.set("name", "golf");
    car.one_mut("engine").unwrap().set("power", 90);

    let mut log = test.log();
    log.clear();

    cars.save(&mut car, &SaveOptions::new()).await.unwrap();

    assert_eq!(log.inserts_into("cars"), 0);
    assert_eq!(log.inserts_into("engines"), 0);
    assert_eq!(log.updates_of("cars"), 1);
    assert_eq!(log.updates_of("engines"), 1);

    let found = cars
        .find_one(car.value("id").clone(), &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.value("name"), &Value::from("golf"));
    assert_eq!(found.one("engine").unwrap().value("power"), &Value::I64(90));
    assert_eq!(count(&db, "cars").await, 1);
}

async fn remove_without_cascade_leaves_the_referenced_row(test: &mut DbTest) {
    let db = test.setup_db(GARAGE).await;
    let registry = registry(&db);
    registry
        .register(
            "Car",
            "default",
            MappingDef::new("cars")
                .columns(["name"])
                .relation(RelationDef::belongs_to("engine", "Engine")),
        )
        .unwrap();
    registry
        .register("Engine", "default", MappingDef::new("engines").columns(["power"]))
        .unwrap();

    let engines = registry.repository("Engine").unwrap();
    let cars = registry.repository("Car").unwrap();

    let mut engine = Record::new().with("power", 50);
    engines.save(&mut engine, &SaveOptions::new()).await.unwrap();
    let engine_id = engine.value("id").clone();

    let mut car = Record::new()
        .with("name", "beetle")
        .with("engine_id", engine_id.clone());
    cars.save(&mut car, &SaveOptions::new()).await.unwrap();

    let mut found = cars
        .find_one(car.value("id").clone(), &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.one("engine").unwrap().value("id"), &engine_id);

    let mut log = test.log();
    log.clear();

    cars.remove(&mut found, &RemoveOptions::new()).await.unwrap();

    assert_eq!(count(&db, "cars").await, 0);
    assert_eq!(log.deletes_from("engines"), 0);
    assert_eq!(log.updates_of("engines"), 0);
    assert_eq!(found.value("engine_id"), &engine_id);

    let kept = engines
        .find_one(engine_id, &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.value("power"), &Value::I64(50));
}

tests!(
    save_and_fetch_relation_tree,
    detached_parts_are_removed_as_orphans,
    cleared_belongs_to_removes_the_referenced_row,
    remove_cascades_through_the_tree,
    plain_values_in_relation_slots_are_rejected,
    save_method_overrides_detection,
    saving_again_updates_in_place,
    remove_without_cascade_leaves_the_referenced_row,
);
