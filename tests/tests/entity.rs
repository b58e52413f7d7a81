//! Domain structs read and written through entity repositories.

use tests::*;

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use trellis::{Db, EntityOptions, MappingDef, Registry, RelationDef};

const SHELVES: &str = "
    CREATE TABLE shelves (id INTEGER PRIMARY KEY, shelf_name TEXT);
    CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT, shelf_id INTEGER);
";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Shelf {
    #[serde(default)]
    id: Option<i64>,
    shelf_name: String,
    #[serde(default)]
    books: Vec<Book>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Book {
    #[serde(default)]
    id: Option<i64>,
    title: String,
    #[serde(default)]
    shelf_id: Option<i64>,
}

/// Same table, but `books` holds something that is not a record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BadShelf {
    shelf_name: String,
    books: i64,
}

fn library(db: &Db) -> Registry {
    let registry = registry(db);
    registry
        .register(
            "Shelf",
            "default",
            MappingDef::new("shelves").columns(["shelf_name"]).relation(
                RelationDef::has_many("books", "Book")
                    .mapped_by("shelf_id")
                    .cascade()
                    .save_sequential(),
            ),
        )
        .unwrap();
    registry
        .register("Book", "default", MappingDef::new("books").columns(["title"]))
        .unwrap();
    registry
}

fn shelf(name: &str, titles: &[&str]) -> Shelf {
    Shelf {
        id: None,
        shelf_name: name.to_string(),
        books: titles
            .iter()
            .map(|title| Book {
                id: None,
                title: title.to_string(),
                shelf_id: None,
            })
            .collect(),
    }
}

async fn save_find_and_remove(test: &mut DbTest) {
    let db = test.setup_db(SHELVES).await;
    let shelves = library(&db).entity::<Shelf>("Shelf").unwrap();

    let saved = shelves
        .save(&shelf("fiction", &["dune", "emma"]), &EntityOptions::new())
        .await
        .unwrap();

    assert_eq!(saved.id, Some(1));
    assert_eq!(
        saved.books,
        [
            Book {
                id: Some(1),
                title: "dune".to_string(),
                shelf_id: Some(1),
            },
            Book {
                id: Some(2),
                title: "emma".to_string(),
                shelf_id: Some(1),
            },
        ]
    );

    let found = shelves
        .find_one(1, &EntityOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, saved);

    // Without the relation the field falls back to its default
    let found = shelves
        .find_one(1, &EntityOptions::new().exclude(["books"]))
        .await
        .unwrap()
        .unwrap();
    assert!(found.books.is_empty());
    assert_eq!(found.shelf_name, "fiction");

    shelves.remove(&saved, &EntityOptions::new()).await.unwrap();

    assert_none!(shelves.find_one(1, &EntityOptions::new()).await.unwrap());
    assert_eq!(db.query("books").count().await.unwrap(), 0);
}

async fn find_all_returns_entities(test: &mut DbTest) {
    let db = test.setup_db(SHELVES).await;
    let shelves = library(&db).entity::<Shelf>("Shelf").unwrap();

    for name in ["a", "b", "c"] {
        shelves
            .save(&shelf(name, &[]), &EntityOptions::new())
            .await
            .unwrap();
    }

    let found = shelves
        .find_all(vec![3.into(), 1.into()], &EntityOptions::new())
        .await
        .unwrap();
    let names: Vec<&str> = found.iter().map(|shelf| shelf.shelf_name.as_str()).collect();
    assert_eq!(names, ["c", "a"]);
}

async fn transactional_saves_roll_back_on_failure(test: &mut DbTest) {
    let db = test.setup_db(SHELVES).await;
    let registry = library(&db);
    let bad = registry.entity::<BadShelf>("Shelf").unwrap();

    let shelf = BadShelf {
        shelf_name: "broken".to_string(),
        books: 7,
    };

    let err = assert_err!(bad.save(&shelf, &EntityOptions::new().transactional()).await);
    assert!(err.is_unsaveable_related_value());
    assert_eq!(db.query("shelves").count().await.unwrap(), 0);

    // Without a transaction the shelf row is already written
    let err = assert_err!(bad.save(&shelf, &EntityOptions::new()).await);
    assert!(err.is_unsaveable_related_value());
    assert_eq!(db.query("shelves").count().await.unwrap(), 1);
}

async fn caller_transaction_is_reused(test: &mut DbTest) {
    let db = test.setup_db(SHELVES).await;
    let shelves = library(&db).entity::<Shelf>("Shelf").unwrap();

    let transaction = db.transaction().await.unwrap();
    let options = EntityOptions::new().transacting(&transaction).transactional();

    shelves
        .save(&shelf("draft", &["notes"]), &options)
        .await
        .unwrap();
    transaction.rollback().await.unwrap();

    assert_eq!(db.query("shelves").count().await.unwrap(), 0);
    assert_eq!(test.log().transactions().len(), 2);
}

tests!(
    save_find_and_remove,
    find_all_returns_entities,
    transactional_saves_roll_back_on_failure,
    caller_transaction_is_reused,
);
