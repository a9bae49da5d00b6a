//! The wire codec: prepare/restore events to/from an ordered sequence of
//! primitives (§4.1).
//!
//! `prepare` and `restore` are the only place that knows both "what an
//! event is" and "what a [`Value`] tree looks like" — everything below
//! this module deals in [`Event`], everything in `skipjack-wire` deals in
//! [`Value`]. Field order here is the wire contract (§3) and must not be
//! reordered.

use skipjack_types::event::*;
use skipjack_types::{AccessMode, NeighbourDigest, NodeStatus, Payload, PayloadValue};
use skipjack_wire::value::{uuid_to_value, value_to_uuid};
use skipjack_wire::Value;

use crate::error::{CoreError, Result};

fn int(n: impl Into<i128>) -> Value {
    Value::Integer(n.into().try_into().expect("fits in cbor integer"))
}

fn as_u64(v: &Value) -> Result<u64> {
    v.as_integer()
        .and_then(|i| i.try_into().ok())
        .ok_or(CoreError::MalformedEvent)
}

fn as_u32(v: &Value) -> Result<u32> {
    as_u64(v).and_then(|n| u32::try_from(n).map_err(|_| CoreError::MalformedEvent))
}

fn as_u16(v: &Value) -> Result<u16> {
    as_u64(v).and_then(|n| u16::try_from(n).map_err(|_| CoreError::MalformedEvent))
}

fn as_u8(v: &Value) -> Result<u8> {
    as_u64(v).and_then(|n| u8::try_from(n).map_err(|_| CoreError::MalformedEvent))
}

fn as_str(v: &Value) -> Result<String> {
    v.as_text().map(str::to_string).ok_or(CoreError::MalformedEvent)
}

fn as_uuid(v: &Value) -> Result<uuid::Uuid> {
    value_to_uuid(v).map_err(|_| CoreError::MalformedEvent)
}

/// Encode a node's self-reported payload map (§3 `Node.payload`).
pub fn payload_to_value(payload: &Payload) -> Value {
    Value::Map(
        payload
            .iter()
            .map(|(k, v)| (Value::Text(k.clone()), payload_value_to_value(v)))
            .collect(),
    )
}

fn payload_value_to_value(v: &PayloadValue) -> Value {
    match v {
        PayloadValue::Int(i) => int(*i as i128),
        PayloadValue::Bool(b) => Value::Bool(*b),
        PayloadValue::Str(s) => Value::Text(s.clone()),
        PayloadValue::Bytes(b) => Value::Bytes(b.clone()),
    }
}

fn value_to_payload(v: &Value) -> Result<Payload> {
    let map = v.as_map().ok_or(CoreError::MalformedEvent)?;
    let mut payload = Payload::new();
    for (k, val) in map {
        let key = as_str(k)?;
        let value = value_to_payload_value(val)?;
        payload.insert(key, value);
    }
    Ok(payload)
}

fn value_to_payload_value(v: &Value) -> Result<PayloadValue> {
    if let Some(i) = v.as_integer() {
        return Ok(PayloadValue::Int(
            i.try_into().map_err(|_| CoreError::MalformedEvent)?,
        ));
    }
    if let Some(b) = v.as_bool() {
        return Ok(PayloadValue::Bool(b));
    }
    if let Some(s) = v.as_text() {
        return Ok(PayloadValue::Str(s.to_string()));
    }
    if let Some(b) = v.as_bytes() {
        return Ok(PayloadValue::Bytes(b.clone()));
    }
    Err(CoreError::MalformedEvent)
}

/// Encode the compact neighbour tuple used by anti-entropy digests (§3,
/// §8): `[id, host, port, status-code, access-code, restart-counter, tx,
/// payload]`.
pub fn digest_to_value(d: &NeighbourDigest) -> Value {
    Value::Array(vec![
        uuid_to_value(d.id),
        Value::Text(d.host.clone()),
        int(d.port as i128),
        int(d.status.code() as i128),
        int(d.access.code() as i128),
        int(d.restart_counter as i128),
        int(d.tx as i128),
        payload_to_value(&d.payload),
    ])
}

pub fn value_to_digest(v: &Value) -> Result<NeighbourDigest> {
    let arr = v.as_array().ok_or(CoreError::MalformedEvent)?;
    if arr.len() != 8 {
        return Err(CoreError::MalformedEvent);
    }
    Ok(NeighbourDigest {
        id: as_uuid(&arr[0])?,
        host: as_str(&arr[1])?,
        port: as_u16(&arr[2])?,
        status: NodeStatus::from_code(as_u8(&arr[3])?).ok_or(CoreError::MalformedEvent)?,
        access: AccessMode::from_code(as_u8(&arr[4])?).ok_or(CoreError::MalformedEvent)?,
        restart_counter: as_u64(&arr[5])?,
        tx: as_u64(&arr[6])?,
        payload: value_to_payload(&arr[7])?,
    })
}

fn sender_prefix(s: &Sender) -> [Value; 3] {
    [uuid_to_value(s.id), int(s.restart_counter as i128), int(s.tx as i128)]
}

fn restore_sender(arr: &[Value]) -> Result<Sender> {
    Ok(Sender {
        id: as_uuid(&arr[1])?,
        restart_counter: as_u64(&arr[2])?,
        tx: as_u64(&arr[3])?,
    })
}

/// Prepare an event to its wire form: an array whose first element is
/// `cmd-type`, followed by the sender envelope, followed by the
/// variant's own fields in the order listed in §3.
pub fn prepare(event: &Event) -> Value {
    let tag = int(event.cmd_type() as i128);
    let [sid, srst, stx] = sender_prefix(event.sender());

    let fields: Vec<Value> = match event {
        Event::Ping(e) => vec![
            Value::Text(e.host.clone()),
            int(e.port as i128),
            uuid_to_value(e.neighbour_id),
            int(e.attempt_number as i128),
        ],
        Event::Ack(e) => vec![uuid_to_value(e.neighbour_id), int(e.neighbour_tx as i128)],
        Event::Join(e) => vec![Value::Text(e.host.clone()), int(e.port as i128)],
        Event::Alive(e) => vec![
            uuid_to_value(e.neighbour_id),
            int(e.neighbour_restart_counter as i128),
            int(e.neighbour_tx as i128),
        ],
        Event::Suspect(e) => vec![
            uuid_to_value(e.neighbour_id),
            int(e.neighbour_restart_counter as i128),
            int(e.neighbour_tx as i128),
        ],
        Event::Left(_) => vec![],
        Event::Dead(e) => vec![
            uuid_to_value(e.neighbour_id),
            int(e.neighbour_restart_counter as i128),
            int(e.neighbour_tx as i128),
        ],
        Event::Payload(e) => vec![payload_to_value(&e.payload)],
        Event::AntiEntropy(e) => vec![Value::Array(
            e.anti_entropy_data.iter().map(digest_to_value).collect(),
        )],
        Event::Probe(e) => vec![
            Value::Text(e.host.clone()),
            int(e.port as i128),
            Value::Text(e.neighbour_host.clone()),
            int(e.neighbour_port as i128),
            uuid_to_value(e.probe_key),
        ],
        Event::ProbeAck(e) => vec![
            Value::Text(e.host.clone()),
            int(e.port as i128),
            int(e.status.code() as i128),
            uuid_to_value(e.neighbour_id),
            int(e.neighbour_tx as i128),
            uuid_to_value(e.probe_key),
        ],
        Event::NewClusterSize(e) => {
            vec![int(e.old_cluster_size as i128), int(e.new_cluster_size as i128)]
        }
        Event::IndirectPing(e) => vec![
            Value::Text(e.host.clone()),
            int(e.port as i128),
            uuid_to_value(e.intermediate_id),
            Value::Text(e.intermediate_host.clone()),
            int(e.intermediate_port as i128),
            uuid_to_value(e.neighbour_id),
            Value::Text(e.neighbour_host.clone()),
            int(e.neighbour_port as i128),
            int(e.attempt_number as i128),
        ],
        Event::IndirectAck(e) => vec![
            Value::Text(e.host.clone()),
            int(e.port as i128),
            uuid_to_value(e.intermediate_id),
            Value::Text(e.intermediate_host.clone()),
            int(e.intermediate_port as i128),
            uuid_to_value(e.neighbour_id),
            Value::Text(e.neighbour_host.clone()),
            int(e.neighbour_port as i128),
            int(e.status.code() as i128),
        ],
    };

    let mut out = Vec::with_capacity(4 + fields.len());
    out.push(tag);
    out.push(sid);
    out.push(srst);
    out.push(stx);
    out.extend(fields);
    Value::Array(out)
}

/// Restore a wire array into an [`Event`]. Rejects sequences whose
/// length doesn't match the field count for the leading `cmd-type`, or
/// whose `cmd-type` is unknown/reserved (§4.1 `malformed-event`).
pub fn restore(value: &Value) -> Result<Event> {
    let arr = value.as_array().ok_or(CoreError::MalformedEvent)?;
    let tag = arr.first().and_then(|v| v.as_integer()).ok_or(CoreError::MalformedEvent)?;
    let tag: u8 = tag.try_into().map_err(|_| CoreError::MalformedEvent)?;

    let expect_len = |n: usize| -> Result<()> {
        if arr.len() == n {
            Ok(())
        } else {
            Err(CoreError::MalformedEvent)
        }
    };

    Ok(match tag {
        CMD_PING => {
            expect_len(8)?;
            Event::Ping(Ping {
                sender: restore_sender(arr)?,
                host: as_str(&arr[4])?,
                port: as_u16(&arr[5])?,
                neighbour_id: as_uuid(&arr[6])?,
                attempt_number: as_u32(&arr[7])?,
            })
        }
        CMD_ACK => {
            expect_len(6)?;
            Event::Ack(Ack {
                sender: restore_sender(arr)?,
                neighbour_id: as_uuid(&arr[4])?,
                neighbour_tx: as_u64(&arr[5])?,
            })
        }
        CMD_JOIN => {
            expect_len(6)?;
            Event::Join(Join {
                sender: restore_sender(arr)?,
                host: as_str(&arr[4])?,
                port: as_u16(&arr[5])?,
            })
        }
        CMD_ALIVE => {
            expect_len(7)?;
            Event::Alive(Alive {
                sender: restore_sender(arr)?,
                neighbour_id: as_uuid(&arr[4])?,
                neighbour_restart_counter: as_u64(&arr[5])?,
                neighbour_tx: as_u64(&arr[6])?,
            })
        }
        CMD_SUSPECT => {
            expect_len(7)?;
            Event::Suspect(Suspect {
                sender: restore_sender(arr)?,
                neighbour_id: as_uuid(&arr[4])?,
                neighbour_restart_counter: as_u64(&arr[5])?,
                neighbour_tx: as_u64(&arr[6])?,
            })
        }
        CMD_LEFT => {
            expect_len(4)?;
            Event::Left(Left {
                sender: restore_sender(arr)?,
            })
        }
        CMD_DEAD => {
            expect_len(7)?;
            Event::Dead(Dead {
                sender: restore_sender(arr)?,
                neighbour_id: as_uuid(&arr[4])?,
                neighbour_restart_counter: as_u64(&arr[5])?,
                neighbour_tx: as_u64(&arr[6])?,
            })
        }
        CMD_PAYLOAD => {
            expect_len(5)?;
            Event::Payload(PayloadEvent {
                sender: restore_sender(arr)?,
                payload: value_to_payload(&arr[4])?,
            })
        }
        CMD_ANTI_ENTROPY => {
            expect_len(5)?;
            let items = arr[4].as_array().ok_or(CoreError::MalformedEvent)?;
            let mut anti_entropy_data = Vec::with_capacity(items.len());
            for item in items {
                anti_entropy_data.push(value_to_digest(item)?);
            }
            Event::AntiEntropy(AntiEntropy {
                sender: restore_sender(arr)?,
                anti_entropy_data,
            })
        }
        CMD_PROBE => {
            expect_len(9)?;
            Event::Probe(Probe {
                sender: restore_sender(arr)?,
                host: as_str(&arr[4])?,
                port: as_u16(&arr[5])?,
                neighbour_host: as_str(&arr[6])?,
                neighbour_port: as_u16(&arr[7])?,
                probe_key: as_uuid(&arr[8])?,
            })
        }
        CMD_PROBE_ACK => {
            expect_len(10)?;
            Event::ProbeAck(ProbeAck {
                sender: restore_sender(arr)?,
                host: as_str(&arr[4])?,
                port: as_u16(&arr[5])?,
                status: NodeStatus::from_code(as_u8(&arr[6])?).ok_or(CoreError::MalformedEvent)?,
                neighbour_id: as_uuid(&arr[7])?,
                neighbour_tx: as_u64(&arr[8])?,
                probe_key: as_uuid(&arr[9])?,
            })
        }
        CMD_NEW_CLUSTER_SIZE => {
            expect_len(6)?;
            Event::NewClusterSize(NewClusterSize {
                sender: restore_sender(arr)?,
                old_cluster_size: as_u64(&arr[4])?,
                new_cluster_size: as_u64(&arr[5])?,
            })
        }
        CMD_INDIRECT_PING => {
            expect_len(13)?;
            Event::IndirectPing(IndirectPing {
                sender: restore_sender(arr)?,
                host: as_str(&arr[4])?,
                port: as_u16(&arr[5])?,
                intermediate_id: as_uuid(&arr[6])?,
                intermediate_host: as_str(&arr[7])?,
                intermediate_port: as_u16(&arr[8])?,
                neighbour_id: as_uuid(&arr[9])?,
                neighbour_host: as_str(&arr[10])?,
                neighbour_port: as_u16(&arr[11])?,
                attempt_number: as_u32(&arr[12])?,
            })
        }
        CMD_INDIRECT_ACK => {
            expect_len(13)?;
            Event::IndirectAck(IndirectAck {
                sender: restore_sender(arr)?,
                host: as_str(&arr[4])?,
                port: as_u16(&arr[5])?,
                intermediate_id: as_uuid(&arr[6])?,
                intermediate_host: as_str(&arr[7])?,
                intermediate_port: as_u16(&arr[8])?,
                neighbour_id: as_uuid(&arr[9])?,
                neighbour_host: as_str(&arr[10])?,
                neighbour_port: as_u16(&arr[11])?,
                status: NodeStatus::from_code(as_u8(&arr[12])?).ok_or(CoreError::MalformedEvent)?,
            })
        }
        _ => return Err(CoreError::MalformedEvent),
    })
}
