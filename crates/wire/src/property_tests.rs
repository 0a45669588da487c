// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for body encoding in both directions.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use nrpc_core::test_support::strategies::{arb_body, arb_event, arb_text_body};
use proptest::prelude::*;

use crate::{decode_frame, EventEncoder, Frame, JsonEncoder, Payload};

fn single_body(line: &[u8]) -> Vec<u8> {
    match decode_frame(line) {
        Ok(Frame::Result(Ok(batch))) => match batch.results.into_iter().next() {
            Some(result) => result.outcome.unwrap().body,
            None => panic!("empty batch"),
        },
        other => panic!("unexpected frame: {other:?}"),
    }
}

proptest! {
    #[test]
    fn base64_result_body_decodes_to_original(body in arb_body()) {
        let line = serde_json::json!({
            "status_code": 200,
            "body": STANDARD.encode(&body),
            "body_encoding": "base64",
        });
        let frame = format!("r{line}\n");
        prop_assert_eq!(single_body(frame.as_bytes()), body);
    }

    #[test]
    fn text_result_body_decodes_to_original(body in arb_text_body()) {
        let line = serde_json::json!({
            "status_code": 200,
            "body": body,
            "body_encoding": "text",
        });
        let frame = format!("r{line}\n");
        prop_assert_eq!(single_body(frame.as_bytes()), body.into_bytes());
    }

    #[test]
    fn encoded_event_body_is_base64_of_raw_bytes(event in arb_event()) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let buf = rt.block_on(async {
            let mut enc = JsonEncoder::new(Vec::new());
            enc.encode(Payload::Single(&event)).await.unwrap();
            enc.into_inner()
        });
        let out: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let body = STANDARD.decode(out["body"].as_str().unwrap()).unwrap();
        prop_assert_eq!(body, event.body.clone());
        prop_assert_eq!(out["size"].as_u64().unwrap() as usize, event.body.len());
        prop_assert_eq!(out["id"].as_str().unwrap(), event.id.as_str());
    }
}
