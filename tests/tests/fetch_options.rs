//! Batched lookups, chunking and the `exclude`/`columns` fetch options.

use tests::*;

use pretty_assertions::assert_eq;
use trellis::{
    stmt::{Expr, Value},
    Collection, Db, FetchOptions, MappingDef, Record, Registry, RelationDef, Repository,
    SaveOptions,
};

const LIBRARY: &str = "
    CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT, bio TEXT);
    CREATE TABLE books (
        id INTEGER PRIMARY KEY,
        title TEXT,
        author_id INTEGER,
        publisher_id INTEGER
    );
    CREATE TABLE publishers (id INTEGER PRIMARY KEY, name TEXT);
";

fn library(db: &Db) -> Registry {
    let registry = registry(db);
    registry
        .register(
            "Author",
            "default",
            MappingDef::new("authors")
                .columns(["name", "bio"])
                .relation(
                    RelationDef::has_many("books", "Book")
                        .mapped_by("author_id")
                        .cascade(),
                ),
        )
        .unwrap();
    registry
        .register(
            "Book",
            "default",
            MappingDef::new("books")
                .columns(["title"])
                .relation(RelationDef::belongs_to("publisher", "Publisher").cascade()),
        )
        .unwrap();
    registry
        .register("Publisher", "default", MappingDef::new("publishers").columns(["name"]))
        .unwrap();
    registry
}

async fn authors(repository: &Repository, names: &[&str]) -> Vec<Value> {
    let mut records: Vec<Record> = names
        .iter()
        .map(|name| {
            Record::new()
                .with("name", *name)
                .with_related("books", vec![Record::new().with("title", format!("{name}'s book"))])
        })
        .collect();

    repository
        .save_all(&mut records, &SaveOptions::new())
        .await
        .unwrap();

    records.iter().map(|record| record.value("id").clone()).collect()
}

fn names(found: &Collection) -> Vec<&str> {
    found
        .iter()
        .map(|record| record.value("name").as_str().unwrap())
        .collect()
}

async fn find_all_keeps_requested_order(test: &mut DbTest) {
    let db = test.setup_db(LIBRARY).await;
    let repository = library(&db).repository("Author").unwrap();

    let ids = authors(&repository, &["ada", "bob", "cyd"]).await;

    let found = repository
        .find_all(
            vec![ids[2].clone(), ids[0].clone(), ids[1].clone()],
            &FetchOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(names(&found), ["cyd", "ada", "bob"]);

    // Unknown identifiers are skipped
    let found = repository
        .find_all(vec![Value::I64(99), ids[1].clone()], &FetchOptions::new())
        .await
        .unwrap();
    assert_eq!(names(&found), ["bob"]);
}

async fn find_all_with_no_ids_issues_no_query(test: &mut DbTest) {
    let db = test.setup_db(LIBRARY).await;
    let repository = library(&db).repository("Author").unwrap();

    let found = repository
        .find_all(vec![], &FetchOptions::new())
        .await
        .unwrap();

    assert!(found.is_empty());
    assert!(test.log().is_empty());
}

async fn lookups_are_chunked(test: &mut DbTest) {
    let db = test
        .setup_db_with(Db::builder().fetch_chunk_size(2), LIBRARY)
        .await;
    assert_eq!(db.fetch_chunk_size(), 2);

    let repository = library(&db).repository("Author").unwrap();
    let mut ids = authors(&repository, &["ada", "bob", "cyd", "dan", "eve"]).await;
    ids.reverse();

    let mut log = test.log();
    log.clear();

    let found = repository
        .find_all(ids, &FetchOptions::new())
        .await
        .unwrap();

    assert_eq!(names(&found), ["eve", "dan", "cyd", "bob", "ada"]);
    assert_eq!(log.selects_on("authors"), 3);
    assert_eq!(log.selects_on("books"), 3);

    // No book has a publisher, so there is nothing to look up
    assert_eq!(log.selects_on("publishers"), 0);

    for author in found.iter() {
        assert_eq!(author.many("books").unwrap().len(), 1);
    }

    // Relation keys are chunked too
    log.clear();
    let found = repository
        .find_where(
            Expr::is_not_null(Expr::column("authors.id")),
            &FetchOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(found.len(), 5);
    assert_eq!(log.selects_on("authors"), 1);
    assert_eq!(log.selects_on("books"), 3);
}

async fn exclude_and_columns_shape_the_tree(test: &mut DbTest) {
    let db = test.setup_db(LIBRARY).await;
    let repository = library(&db).repository("Author").unwrap();

    let mut author = Record::new()
        .with("name", "ada")
        .with("bio", "counts things")
        .with_related(
            "books",
            vec![Record::new()
                .with("title", "notes")
                .with_related("publisher", Record::new().with("name", "acme"))],
        );
    repository
        .save(&mut author, &SaveOptions::new())
        .await
        .unwrap();
    let id = author.value("id").clone();

    let find = |options: FetchOptions| {
        let repository = repository.clone();
        let id = id.clone();
        async move { repository.find_one(id, &options).await.unwrap().unwrap() }
    };

    let found = find(FetchOptions::new()).await;
    let book = &found.many("books").unwrap()[0];
    assert_eq!(book.one("publisher").unwrap().value("name"), &Value::from("acme"));

    let found = find(FetchOptions::new().exclude(["books"])).await;
    assert_none!(found.related("books"));
    assert_eq!(found.value("bio"), &Value::from("counts things"));

    let found = find(FetchOptions::new().exclude(["relation_books.relation_publisher"])).await;
    let book = &found.many("books").unwrap()[0];
    assert_none!(book.related("publisher"));

    let found = find(FetchOptions::new().exclude(["*"])).await;
    assert_eq!(found.relations().count(), 0);

    let found = find(FetchOptions::new().exclude(["bio", "books.title"])).await;
    assert!(!found.has("bio"));
    assert!(found.has("name"));
    let book = &found.many("books").unwrap()[0];
    assert!(!book.has("title"));
    assert!(book.has("author_id"));

    let found = find(FetchOptions::new().columns(["name", "books.title"])).await;
    assert_eq!(
        found.attributes().keys().collect::<Vec<_>>(),
        ["id", "name"]
    );

    // Identifier and join columns are always selected
    let book = &found.many("books").unwrap()[0];
    assert_eq!(
        book.attributes().keys().collect::<Vec<_>>(),
        ["id", "title", "publisher_id", "author_id"]
    );
}

tests!(
    find_all_keeps_requested_order,
    find_all_with_no_ids_issues_no_query,
    lookups_are_chunked,
    exclude_and_columns_shape_the_tree,
);
