use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use tenebra::alloc::LeaseService;
use tenebra::codec;
use tenebra::compiler::{Direction, Op, OperationBatch};
use tenebra::model::props;
use tenebra::schema::{SchemaSnapshot, StaticProvider};
use tenebra::types::QueueIndex;
use tenebra::writer::IngestionGateway;
use tenebra::{
    Config, DataType, EdgeKey, GraphWriter, PropertyMap, PropertyValue, Result, SnapshotVersion,
    VertexKey, WriteError, WriteRequest,
};

/// Hands out adjacent id blocks, standing in for the remote lease authority.
struct LocalLease {
    next: AtomicU64,
}

impl LeaseService for LocalLease {
    fn allocate(&self, size: u32) -> Result<u64> {
        Ok(self.next.fetch_add(u64::from(size), Ordering::Relaxed))
    }
}

/// Records every submitted batch and assigns increasing versions.
#[derive(Default)]
struct RecordingGateway {
    batches: Mutex<Vec<(QueueIndex, OperationBatch)>>,
    next_version: AtomicU64,
}

impl RecordingGateway {
    fn batches(&self) -> Vec<(QueueIndex, OperationBatch)> {
        self.batches.lock().clone()
    }
}

impl IngestionGateway for RecordingGateway {
    fn submit(&self, queue: QueueIndex, batch: OperationBatch) -> Result<SnapshotVersion> {
        let version = SnapshotVersion(self.next_version.fetch_add(1, Ordering::Relaxed) + 1);
        self.batches.lock().push((queue, batch));
        Ok(version)
    }
}

struct RejectingGateway;

impl IngestionGateway for RejectingGateway {
    fn submit(&self, _queue: QueueIndex, _batch: OperationBatch) -> Result<SnapshotVersion> {
        Err(WriteError::Submission("ingestion backend down".into()))
    }
}

fn sample_schema() -> SchemaSnapshot {
    let mut builder = SchemaSnapshot::builder(SnapshotVersion(1));
    builder
        .vertex_label("person")
        .primary_key("id", DataType::Int)
        .property("name", DataType::Text);
    builder.edge_label("knows").property("since", DataType::Int);
    builder.finish()
}

fn writer_with(gateway: Arc<dyn IngestionGateway>) -> GraphWriter {
    GraphWriter::new(
        Config::default(),
        Arc::new(StaticProvider::new(sample_schema())),
        Arc::new(LocalLease {
            next: AtomicU64::new(1),
        }),
        gateway,
    )
    .expect("writer construction")
}

fn person(id: i64) -> VertexKey {
    VertexKey::new("person").with("id", id)
}

#[test]
fn vertex_overwrite_lands_with_derived_identity() -> Result<()> {
    let gateway = Arc::new(RecordingGateway::default());
    let writer = writer_with(gateway.clone());
    let session = writer.open_session();

    let version = writer.write(
        &session,
        &[WriteRequest::overwrite_vertex(
            person(1),
            props([("name", "alice")]),
        )],
    )?;
    assert_eq!(version, SnapshotVersion(1));

    let batches = gateway.batches();
    assert_eq!(batches.len(), 1);
    let (queue, batch) = &batches[0];
    assert!(queue.0 >= 1, "queue 0 is reserved for schema traffic");
    assert_eq!(batch.len(), 1);

    let Op::Vertex(op) = &batch.ops()[0] else {
        panic!("expected vertex op");
    };
    let schema = sample_schema();
    let label = schema.vertex_label("person")?;
    assert_eq!(op.id, codec::vertex_id(label, &props([("id", 1i64)]))?);
    assert_eq!(op.properties["id"], PropertyValue::Int(1));
    assert_eq!(op.properties["name"], PropertyValue::Text("alice".into()));
    Ok(())
}

#[test]
fn edge_overwrite_lands_as_a_mirrored_pair() -> Result<()> {
    let gateway = Arc::new(RecordingGateway::default());
    let writer = writer_with(gateway.clone());
    let session = writer.open_session();

    writer.write(
        &session,
        &[WriteRequest::overwrite_edge(
            EdgeKey::new("knows", person(1), person(2)),
            PropertyMap::new(),
        )],
    )?;

    let batches = gateway.batches();
    let batch = &batches[0].1;
    assert_eq!(batch.len(), 2);
    let (Op::Edge(forward), Op::Edge(backward)) = (&batch.ops()[0], &batch.ops()[1]) else {
        panic!("expected edge ops");
    };
    assert_eq!(forward.direction, Direction::Forward);
    assert_eq!(backward.direction, Direction::Backward);
    assert_eq!(forward.id, backward.id);
    assert_eq!(forward.edge_kind, backward.edge_kind);

    let schema = sample_schema();
    let label = schema.vertex_label("person")?;
    assert_eq!(forward.id.src, codec::vertex_id(label, &props([("id", 1i64)]))?);
    assert_eq!(forward.id.dst, codec::vertex_id(label, &props([("id", 2i64)]))?);
    Ok(())
}

#[test]
fn one_session_sticks_to_one_queue() -> Result<()> {
    let gateway = Arc::new(RecordingGateway::default());
    let writer = writer_with(gateway.clone());
    let session = writer.open_session();

    for id in 0..5 {
        writer.write(
            &session,
            &[WriteRequest::overwrite_vertex(person(id), PropertyMap::new())],
        )?;
    }

    let batches = gateway.batches();
    let first = batches[0].0;
    assert!(batches.iter().all(|(queue, _)| *queue == first));
    Ok(())
}

#[test]
fn independent_sessions_spread_over_queues() -> Result<()> {
    let gateway = Arc::new(RecordingGateway::default());
    let writer = writer_with(gateway.clone());

    // Plenty of sessions against 3 data queues; expect more than one queue
    // to see traffic.
    for _ in 0..16 {
        let session = writer.open_session();
        writer.write(
            &session,
            &[WriteRequest::overwrite_vertex(person(1), PropertyMap::new())],
        )?;
    }
    let queues: std::collections::HashSet<_> =
        gateway.batches().iter().map(|(queue, _)| *queue).collect();
    assert!(queues.len() > 1);
    Ok(())
}

#[test]
fn compile_failure_never_reaches_the_gateway() {
    let gateway = Arc::new(RecordingGateway::default());
    let writer = writer_with(gateway.clone());
    let session = writer.open_session();

    let err = writer
        .write(
            &session,
            &[WriteRequest::overwrite_vertex(
                person(1),
                props([("age", 30i64)]),
            )],
        )
        .unwrap_err();
    assert!(matches!(err, WriteError::PropertyNotFound(_)));
    assert!(gateway.batches().is_empty(), "no partial submission");
    assert!(!err.is_retryable());
}

#[test]
fn submission_failure_propagates_as_retryable() {
    let writer = writer_with(Arc::new(RejectingGateway));
    let session = writer.open_session();
    let err = writer
        .write(
            &session,
            &[WriteRequest::overwrite_vertex(person(1), PropertyMap::new())],
        )
        .unwrap_err();
    assert!(matches!(err, WriteError::Submission(_)));
    assert!(err.is_retryable());
}

#[test]
fn empty_batches_are_rejected() {
    let writer = writer_with(Arc::new(RecordingGateway::default()));
    let session = writer.open_session();
    assert!(matches!(
        writer.write(&session, &[]),
        Err(WriteError::InvalidArgument(_))
    ));
}

#[test]
fn flush_follows_the_confirmation_channel() -> Result<()> {
    let writer = Arc::new(writer_with(Arc::new(RecordingGateway::default())));
    let session = writer.open_session();

    let version = writer.write(
        &session,
        &[WriteRequest::overwrite_vertex(person(1), PropertyMap::new())],
    )?;

    // Accepted but not yet applied.
    assert!(!writer.flush(version, Duration::from_millis(20)));
    assert!(!writer.flush_latest(Duration::from_millis(20)));

    let confirmer = {
        let writer = writer.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            writer.confirm_applied(version);
        })
    };
    assert!(writer.flush(version, Duration::from_secs(5)));
    assert!(writer.flush_latest(Duration::ZERO));
    confirmer.join().unwrap();

    assert_eq!(writer.tracker().applied(), version);
    assert_eq!(writer.last_version(), version);
    Ok(())
}

#[test]
fn flush_latest_is_trivial_before_any_write() {
    let writer = writer_with(Arc::new(RecordingGateway::default()));
    assert!(writer.flush_latest(Duration::ZERO));
}

#[test]
fn fresh_discriminators_across_batches() -> Result<()> {
    let gateway = Arc::new(RecordingGateway::default());
    let writer = writer_with(gateway.clone());
    let session = writer.open_session();

    let request = WriteRequest::overwrite_edge(
        EdgeKey::new("knows", person(1), person(2)),
        PropertyMap::new(),
    );
    writer.write(&session, &[request.clone()])?;
    writer.write(&session, &[request])?;

    let batches = gateway.batches();
    let inner = |batch: &OperationBatch| match &batch.ops()[0] {
        Op::Edge(op) => op.id.inner,
        _ => panic!("expected edge op"),
    };
    assert_ne!(inner(&batches[0].1), inner(&batches[1].1));
    Ok(())
}
