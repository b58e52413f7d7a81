//! JSON columns and SQL columns with read and write expressions.

use tests::*;

use pretty_assertions::assert_eq;
use serde_json::json;
use trellis::{
    stmt::Value, ColumnDef, Db, FetchOptions, MappingDef, Record, Registry, RelationDef,
    SaveOptions,
};

const WORKSHOP: &str = "
    CREATE TABLE gadgets (id INTEGER PRIMARY KEY, name TEXT, specs TEXT, code TEXT, box_id INTEGER);
    CREATE TABLE boxes (id INTEGER PRIMARY KEY, label TEXT);
";

fn workshop(db: &Db) -> Registry {
    let registry = registry(db);
    registry
        .register(
            "Gadget",
            "default",
            MappingDef::new("gadgets")
                .columns(["name"])
                .column(ColumnDef::json("specs"))
                .column(ColumnDef::sql("shout").get("upper(name)"))
                .column(ColumnDef::sql("code").get("upper(code)").set("lower(?)")),
        )
        .unwrap();
    registry
        .register(
            "Box",
            "default",
            MappingDef::new("boxes")
                .columns(["label"])
                .column(ColumnDef::sql("loud").get("upper(label)"))
                .relation(
                    RelationDef::has_many("gadgets", "Gadget")
                        .mapped_by("box_id")
                        .cascade(),
                ),
        )
        .unwrap();
    registry
}

async fn json_columns_round_trip(test: &mut DbTest) {
    let db = test.setup_db(WORKSHOP).await;
    let gadgets = workshop(&db).repository("Gadget").unwrap();

    let specs = json!({ "volts": 5, "tags": ["small", "loud"] });
    let mut gadget = Record::new()
        .with("name", "buzzer")
        .with("specs", specs.clone());
    gadgets
        .save(&mut gadget, &SaveOptions::new())
        .await
        .unwrap();

    assert_eq!(gadget.value("specs"), &Value::Json(specs.clone()));

    // Stored as text
    let row = db
        .query("gadgets")
        .select(["specs"])
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        row["specs"],
        Value::from(r#"{"volts":5,"tags":["small","loud"]}"#)
    );

    let found = gadgets
        .find_one(gadget.value("id").clone(), &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.value("specs"), &Value::Json(specs));
}

async fn sql_columns_use_their_expressions(test: &mut DbTest) {
    let db = test.setup_db(WORKSHOP).await;
    let gadgets = workshop(&db).repository("Gadget").unwrap();

    let mut gadget = Record::new().with("name", "Buzzer").with("code", "MiXeD");
    gadgets
        .save(&mut gadget, &SaveOptions::new())
        .await
        .unwrap();

    // The record keeps what the caller set
    assert_eq!(gadget.value("code"), &Value::from("MiXeD"));

    let row = db
        .query("gadgets")
        .select(["code"])
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["code"], Value::from("mixed"));

    let found = gadgets
        .find_one(gadget.value("id").clone(), &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.value("shout"), &Value::from("BUZZER"));
    assert_eq!(found.value("code"), &Value::from("MIXED"));

    let found = gadgets
        .find_one(
            gadget.value("id").clone(),
            &FetchOptions::new().exclude(["shout"]),
        )
        .await
        .unwrap()
        .unwrap();
    assert!(!found.has("shout"));
    assert!(found.has("code"));
}

async fn sql_columns_are_populated_through_the_tree(test: &mut DbTest) {
    let db = test.setup_db(WORKSHOP).await;
    let boxes = workshop(&db).repository("Box").unwrap();

    let mut bin = Record::new().with("label", "spares").with_related(
        "gadgets",
        vec![
            Record::new().with("name", "bell"),
            Record::new().with("name", "horn"),
        ],
    );
    boxes.save(&mut bin, &SaveOptions::new()).await.unwrap();

    let found = boxes
        .find_one(bin.value("id").clone(), &FetchOptions::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.value("loud"), &Value::from("SPARES"));

    let mut shouts: Vec<&Value> = found
        .many("gadgets")
        .unwrap()
        .iter()
        .map(|gadget| gadget.value("shout"))
        .collect();
    shouts.sort_by_key(|value| value.as_str().map(str::to_string));
    assert_eq!(shouts, [&Value::from("BELL"), &Value::from("HORN")]);

    // Selecting other columns of a relation leaves its SQL columns out
    let found = boxes
        .find_one(
            bin.value("id").clone(),
            &FetchOptions::new().columns(["gadgets.name"]),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.value("loud"), &Value::from("SPARES"));
    for gadget in found.many("gadgets").unwrap() {
        assert!(!gadget.has("shout"));
    }
}

tests!(
    json_columns_round_trip,
    sql_columns_use_their_expressions,
    sql_columns_are_populated_through_the_tree,
);
