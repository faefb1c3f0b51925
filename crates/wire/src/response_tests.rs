// SPDX-License-Identifier: MIT

use super::*;
use crate::framing::{decode, encode};
use cc_core::JobIndex;

#[test]
fn empty_job_sentinel_round_trips() {
    let resp = CoordinatorResponse::Job { assignment: None };
    let bytes = encode(&resp).unwrap();
    let back: CoordinatorResponse = decode(&bytes).unwrap();
    assert_eq!(resp, back);
}

#[test]
fn job_assignment_round_trips_with_its_descriptor() {
    let queue = JobIndex::new().intern("Q");
    let resp = CoordinatorResponse::Job {
        assignment: Some(JobAssignment {
            external_compaction_id: ExternalCompactionId::new(),
            job: JobDescriptor {
                tablet_extent: "t1;r1".to_string(),
                files: vec!["f.rf".to_string()],
                queue,
                priority: 10,
            },
        }),
    };
    let bytes = encode(&resp).unwrap();
    let back: CoordinatorResponse = decode(&bytes).unwrap();
    assert_eq!(resp, back);
}

#[test]
fn unknown_compaction_id_tags_distinctly_from_error() {
    let resp = CoordinatorResponse::UnknownCompactionId { id: ExternalCompactionId::new() };
    let bytes = encode(&resp).unwrap();
    let json = std::str::from_utf8(&bytes).unwrap();
    assert!(json.contains("\"type\":\"UnknownCompactionId\""), "{json}");
}
