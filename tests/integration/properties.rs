//! Property tests over the pure pieces of the write path: identity
//! derivation and routing.

use proptest::prelude::*;

use tenebra::codec;
use tenebra::model::{props, DataType, PropertyValue};
use tenebra::router::{self, SessionId};
use tenebra::schema::SchemaSnapshot;
use tenebra::types::VertexId;
use tenebra::SnapshotVersion;

fn pair_schema() -> SchemaSnapshot {
    let mut builder = SchemaSnapshot::builder(SnapshotVersion(1));
    builder
        .vertex_label("left")
        .primary_key("k", DataType::Bytes);
    builder
        .vertex_label("right")
        .primary_key("k", DataType::Bytes);
    builder.finish()
}

proptest! {
    #[test]
    fn vertex_id_is_deterministic(key in proptest::collection::vec(any::<u8>(), 0..64)) {
        let schema = pair_schema();
        let label = schema.vertex_label("left").unwrap();
        let map = props([("k", PropertyValue::Bytes(key))]);
        prop_assert_eq!(
            codec::vertex_id(label, &map).unwrap(),
            codec::vertex_id(label, &map).unwrap()
        );
    }

    #[test]
    fn labels_never_alias(key in proptest::collection::vec(any::<u8>(), 0..64)) {
        let schema = pair_schema();
        let map = props([("k", PropertyValue::Bytes(key))]);
        let left = codec::vertex_id(schema.vertex_label("left").unwrap(), &map).unwrap();
        let right = codec::vertex_id(schema.vertex_label("right").unwrap(), &map).unwrap();
        prop_assert_ne!(left, right);
    }

    #[test]
    fn distinct_keys_get_distinct_ids(a in any::<u64>(), b in any::<u64>()) {
        prop_assume!(a != b);
        let schema = pair_schema();
        let label = schema.vertex_label("left").unwrap();
        let id_a = codec::vertex_id(label, &props([("k", a.to_be_bytes().to_vec())])).unwrap();
        let id_b = codec::vertex_id(label, &props([("k", b.to_be_bytes().to_vec())])).unwrap();
        prop_assert_ne!(id_a, id_b);
    }

    #[test]
    fn session_routing_stays_in_data_range(seq in any::<u64>(), queue_count in 2u16..512) {
        let session = SessionId::new("client", seq);
        let queue = router::route_for_session(&session, queue_count).unwrap();
        prop_assert!(queue.0 >= 1);
        prop_assert!(queue.0 < queue_count);
        prop_assert_eq!(queue, router::route_for_session(&session, queue_count).unwrap());
    }

    #[test]
    fn partitioning_is_stable(id in any::<u64>(), partitions in 1u32..4096) {
        let first = router::partition_for_key(VertexId(id), partitions).unwrap();
        let second = router::partition_for_key(VertexId(id), partitions).unwrap();
        prop_assert_eq!(first, second);
        prop_assert!(first.0 < partitions);
    }

    #[test]
    fn session_id_wire_form_round_trips(name in "[a-z][a-z0-9_-]{0,16}", seq in any::<u64>()) {
        let session = SessionId::new(name, seq);
        let parsed = SessionId::parse(&session.to_string()).unwrap();
        prop_assert_eq!(parsed, session);
    }
}
