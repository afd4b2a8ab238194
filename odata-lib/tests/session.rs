//! Schema loading, memoization and cancellation through a session.

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use odata_lib::Session;
use odata_lib::command::FluentCommand;
use odata_lib::error::Error;
use odata_lib::error::MetadataError;
use odata_lib::error::UsageError;
use odata_lib::metadata::FileSchemaSource;
use odata_lib::metadata::JsonSchemaSource;
use odata_lib::metadata::Schema;
use odata_lib::metadata::SchemaSource;
use odata_lib::query::Filter;
use tokio_util::sync::CancellationToken;

use common::SERVICE_URL;
use common::northwind;

struct CountingSource {
    loads: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl SchemaSource for CountingSource {
    async fn load(&self) -> Result<Schema, Error> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(northwind())
    }
}

fn lazy_session(loads: Arc<AtomicUsize>, delay: Duration) -> Session {
    Session::builder()
        .url(SERVICE_URL)
        .schema_source(CountingSource { loads, delay })
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_sync_text_requires_loaded_schema() {
    let session = lazy_session(Arc::default(), Duration::ZERO);
    let command = session.for_collection("Products").key(1);

    let err = command.command_text().unwrap_err();
    assert!(matches!(err, Error::Metadata(MetadataError::NotLoaded)));

    let cancel = CancellationToken::new();
    assert_eq!(command.command_text_async(&cancel).await.unwrap(), "Products(1)");
    assert_eq!(command.command_text().unwrap(), "Products(1)");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_commands_share_one_load() {
    let loads = Arc::new(AtomicUsize::new(0));
    let session = lazy_session(loads.clone(), Duration::from_millis(20));
    let cancel = CancellationToken::new();

    let tasks = (1..=16).map(|id| {
        let session = session.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            session
                .for_collection("Products")
                .filter_expr(Filter::eq("ProductID", id))
                .command_text_async(&cancel)
                .await
        })
    });
    let results = join_all(tasks).await;

    for (id, result) in (1..=16).zip(results) {
        assert_eq!(result.unwrap().unwrap(), format!("Products({})", id));
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_one_command_shared_across_tasks() {
    let session = lazy_session(Arc::default(), Duration::ZERO);
    let command = session.for_collection("Employees").expand(["Orders/Customer"]);
    let cancel = CancellationToken::new();

    let texts = join_all((0..8).map(|_| command.command_text_async(&cancel))).await;
    for text in texts {
        assert_eq!(text.unwrap(), "Employees?$expand=Orders($expand=Customer)");
    }
}

#[tokio::test]
async fn test_cancel_during_load() {
    let loads = Arc::new(AtomicUsize::new(0));
    let session = lazy_session(loads.clone(), Duration::from_secs(30));
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let result = session.for_collection("Products").command_text_async(&cancel).await;
    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(session.loaded_metadata().is_none());
}

#[tokio::test]
async fn test_json_source() {
    let json = serde_json::to_string(&northwind()).unwrap();
    let session = Session::builder()
        .url(SERVICE_URL)
        .schema_source(JsonSchemaSource::new(json))
        .build()
        .unwrap();
    let cancel = CancellationToken::new();
    let text = session
        .for_collection("OrderDetails")
        .key_values([10248, 11])
        .command_text_async(&cancel)
        .await
        .unwrap();
    assert_eq!(text, "Order_Details(OrderID=10248,ProductID=11)");
}

#[tokio::test]
async fn test_file_source() {
    let path = std::env::temp_dir().join(format!("odata-lib-northwind-{}.json", std::process::id()));
    tokio::fs::write(&path, serde_json::to_vec(&northwind()).unwrap()).await.unwrap();

    let session = Session::builder()
        .url(SERVICE_URL)
        .schema_source(FileSchemaSource::new(&path))
        .build()
        .unwrap();
    let schema = session.metadata(&CancellationToken::new()).await.unwrap();
    assert_eq!(schema.namespace, "NorthwindModel");

    tokio::fs::remove_file(&path).await.unwrap();
}

#[tokio::test]
async fn test_missing_file_is_metadata_error() {
    let session = Session::builder()
        .url(SERVICE_URL)
        .schema_source(FileSchemaSource::new("/nonexistent/northwind.json"))
        .build()
        .unwrap();
    let err = session.metadata(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Metadata(MetadataError::Io(_))));
}

#[test]
fn test_detached_command_ignores_calls() {
    let command = FluentCommand::detached()
        .for_collection("Products")
        .key(1)
        .select(["ProductName"]);
    assert!(command.is_detached());
    assert!(!command.state().has_key());
    assert!(command.state().entry().is_empty());

    let err = command.command_text().unwrap_err();
    assert!(matches!(err, Error::Usage(UsageError::Detached)));
}
