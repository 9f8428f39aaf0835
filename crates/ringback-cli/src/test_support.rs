use ringback_core::{CallRecord, CallStatus, CallerId, Direction};
use time::PrimitiveDateTime;

pub fn call(row: usize, caller: &str, start: PrimitiveDateTime, served: bool) -> CallRecord {
    CallRecord {
        row,
        caller_id: CallerId::new(caller),
        direction: Direction::Inbound,
        start_time: start,
        answer_time: served.then_some(start),
        end_time: None,
        status: if served {
            CallStatus::Served
        } else {
            CallStatus::NotServed
        },
        conversation_secs: 0,
        waiting_secs: 0,
        destination: None,
        operator: None,
    }
}
