use tests::*;

use pretty_assertions::assert_eq;
use trellis::{
    driver::operation::Transaction as TransactionOp, stmt::Value, Db, FetchOptions, MappingDef,
    Record, Registry, RemoveOptions, SaveOptions,
};

const NOTES: &str = "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);";

fn notes(db: &Db) -> Registry {
    let registry = registry(db);
    registry
        .register("Note", "default", MappingDef::new("notes").columns(["body"]))
        .unwrap();
    registry
}

async fn rollback_discards_writes(test: &mut DbTest) {
    let db = test.setup_db(NOTES).await;
    let notes = notes(&db).repository("Note").unwrap();

    let transaction = db.transaction().await.unwrap();

    let mut note = Record::new().with("body", "draft");
    notes
        .save(&mut note, &SaveOptions::new().transacting(&transaction))
        .await
        .unwrap();
    let id = note.value("id").clone();

    // Visible inside the transaction
    let found = notes
        .find_one(id.clone(), &FetchOptions::new().transacting(&transaction))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.value("body"), &Value::from("draft"));

    transaction.rollback().await.unwrap();
    assert!(transaction.is_finished().await);

    assert_none!(notes.find_one(id, &FetchOptions::new()).await.unwrap());
    assert_eq!(
        test.log().transactions(),
        [TransactionOp::Start, TransactionOp::Rollback]
    );
}

async fn commit_keeps_writes(test: &mut DbTest) {
    let db = test.setup_db(NOTES).await;
    let notes = notes(&db).repository("Note").unwrap();

    let transaction = db.transaction().await.unwrap();

    let mut records = vec![
        Record::new().with("body", "kept"),
        Record::new().with("body", "dropped"),
    ];
    notes
        .save_all(&mut records, &SaveOptions::new().transacting(&transaction))
        .await
        .unwrap();
    notes
        .remove(&mut records[1], &RemoveOptions::new().transacting(&transaction))
        .await
        .unwrap();

    transaction.commit().await.unwrap();

    let bodies: Vec<Value> = db
        .query("notes")
        .all()
        .await
        .unwrap()
        .into_iter()
        .map(|row| row["body"].clone())
        .collect();
    assert_eq!(bodies, [Value::from("kept")]);

    // A finished transaction cannot be used again
    let err = assert_err!(transaction.commit().await);
    assert!(err.is_transaction_finished());

    let err = assert_err!(
        notes
            .save(
                &mut Record::new().with("body", "late"),
                &SaveOptions::new().transacting(&transaction),
            )
            .await
    );
    assert!(err.is_transaction_finished());
}

async fn dropped_transaction_rolls_back(test: &mut DbTest) {
    let db = test.setup_db(NOTES).await;
    let notes = notes(&db).repository("Note").unwrap();

    {
        let transaction = db.transaction().await.unwrap();
        let mut note = Record::new().with("body", "lost");
        notes
            .save(&mut note, &SaveOptions::new().transacting(&transaction))
            .await
            .unwrap();
    }

    // The connection is back in the pool once the rollback ran
    assert_eq!(db.query("notes").count().await.unwrap(), 0);
}

tests!(
    rollback_discards_writes,
    commit_keeps_writes,
    dropped_transaction_rolls_back,
);
