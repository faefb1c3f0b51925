// SPDX-License-Identifier: MIT

use super::*;
use crate::framing::{decode, encode};

#[test]
fn reservation_with_null_id_round_trips() {
    let resp = TabletServerResponse::Reservation { external_compaction_id: None, job: None };
    let bytes = encode(&resp).unwrap();
    let back: TabletServerResponse = decode(&bytes).unwrap();
    assert_eq!(resp, back);
}

#[test]
fn queue_info_round_trips_with_multiple_entries() {
    let resp = TabletServerResponse::QueueInfo {
        queues: vec![
            QueueSummary { queue: "Q".to_string(), priority: 10 },
            QueueSummary { queue: "Q".to_string(), priority: 20 },
        ],
    };
    let bytes = encode(&resp).unwrap();
    let back: TabletServerResponse = decode(&bytes).unwrap();
    assert_eq!(resp, back);
}

#[test]
fn compactor_cancel_request_round_trips() {
    let req = CompactorRequest::Cancel { id: ExternalCompactionId::new() };
    let bytes = encode(&req).unwrap();
    let back: CompactorRequest = decode(&bytes).unwrap();
    assert_eq!(req, back);
}
