//! Request fixtures.

use async_snmp_receiver::message::{BerCodec, Codec, Message};
use async_snmp_receiver::pdu::Pdu;
use async_snmp_receiver::{Oid, VarBind, Version, oid};
use bytes::Bytes;

/// sysDescr.0
pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}

/// sysName.0
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}

/// Encoded GetRequest for `oids`.
pub fn get_request(version: Version, community: &str, request_id: i32, oids: &[Oid]) -> Bytes {
    let message = Message::new(version, community.to_string(), Pdu::get_request(request_id, oids));
    BerCodec.encode(&message).unwrap()
}

/// Encoded SetRequest carrying `varbinds`.
pub fn set_request(community: &str, request_id: i32, varbinds: Vec<VarBind>) -> Bytes {
    let message = Message::new(
        Version::V2c,
        community.to_string(),
        Pdu::set_request(request_id, varbinds),
    );
    BerCodec.encode(&message).unwrap()
}
