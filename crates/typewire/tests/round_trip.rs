// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end codec tests: construct, encode, decode over registered types.

use typewire::{
    BinaryStream, DecodeError, EnumDescriptor, EnumMember, Error, FieldSchema, IdTable, NodeId,
    ObjectInstance, SchemaError, SchemaRegistry, StructuredTypeSchema, TypeRegistry, Value,
    ValueMap, RUNTIME_ID_BASE,
};

fn options(entries: &[(&str, Value)]) -> ValueMap {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn round_trip(registry: &TypeRegistry, instance: &ObjectInstance) -> ObjectInstance {
    let mut stream = BinaryStream::new();
    registry.encode(instance, &mut stream).expect("encode");
    registry
        .decode(instance.type_name(), &mut stream)
        .expect("decode")
}

#[test]
fn integer_id_zero_and_one_survive_round_trip() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("ChannelRequest")
                .with_id(391)
                .field(FieldSchema::basic("requestHandle", "IntegerId")),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let zero = registry
        .construct("ChannelRequest", options(&[("requestHandle", Value::UInt32(0))]))
        .unwrap();
    assert_eq!(zero.get_as::<u32>("requestHandle"), Some(0));
    assert_eq!(round_trip(&registry, &zero).get_as::<u32>("requestHandle"), Some(0));

    let one = registry
        .construct("ChannelRequest", options(&[("requestHandle", Value::UInt32(1))]))
        .unwrap();
    assert_eq!(round_trip(&registry, &one).get_as::<u32>("requestHandle"), Some(1));
}

#[test]
fn hello_message_survives_external_framing() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("HelloMessage")
                .with_id(1000)
                .field(FieldSchema::basic("protocolVersion", "UInt32"))
                .field(FieldSchema::basic("receiveBufferSize", "UInt32"))
                .field(FieldSchema::basic("sendBufferSize", "UInt32"))
                .field(FieldSchema::basic("maxMessageSize", "UInt32"))
                .field(FieldSchema::basic("endpointUrl", "String")),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let hello = registry
        .construct(
            "HelloMessage",
            options(&[
                ("protocolVersion", Value::UInt32(0)),
                ("receiveBufferSize", Value::UInt32(8192)),
                ("sendBufferSize", Value::UInt32(8192)),
                ("maxMessageSize", Value::UInt32(0)),
                ("endpointUrl", Value::from("opc.tcp://localhost:4840")),
            ]),
        )
        .unwrap();

    let mut stream = BinaryStream::new();
    registry.encode(&hello, &mut stream).unwrap();
    let body = stream.into_bytes();

    // Frame as a transport would: magic + length header, then unwrap.
    let mut framed = Vec::from(*b"MSGF");
    framed.extend_from_slice(&(body.len() as u32).to_le_bytes());
    framed.extend_from_slice(&body);
    assert_eq!(&framed[..4], b"MSGF");
    let payload = framed[8..].to_vec();

    let decoded = registry
        .decode("HelloMessage", &mut BinaryStream::from_bytes(payload))
        .unwrap();
    assert_eq!(decoded, hello);
    assert_eq!(decoded.get_as::<u32>("protocolVersion"), Some(0));
    assert_eq!(decoded.get_as::<u32>("receiveBufferSize"), Some(8192));
    assert_eq!(decoded.get_as::<u32>("maxMessageSize"), Some(0));
    assert_eq!(
        decoded.get_as::<String>("endpointUrl").as_deref(),
        Some("opc.tcp://localhost:4840")
    );
}

fn header_registry() -> TypeRegistry {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("RequestHeader")
                .with_id(389)
                .field(FieldSchema::basic("authenticationToken", "NodeId"))
                .field(FieldSchema::basic("requestHandle", "IntegerId")),
        )
        .unwrap();
    schemas
        .register_schema(
            StructuredTypeSchema::new("CloseSessionRequest")
                .with_id(471)
                .base("RequestHeader")
                .field(FieldSchema::basic("deleteSubscriptions", "Boolean")),
        )
        .unwrap();
    TypeRegistry::new(schemas, IdTable::new())
}

#[test]
fn derived_possible_fields_flatten_base_then_own() {
    let registry = header_registry();
    assert_eq!(
        registry.possible_fields("CloseSessionRequest").unwrap(),
        vec!["authenticationToken", "requestHandle", "deleteSubscriptions"]
    );
    assert_eq!(
        registry.possible_fields("RequestHeader").unwrap(),
        vec!["authenticationToken", "requestHandle"]
    );
}

#[test]
fn derived_encoding_starts_with_base_encoding() {
    let registry = header_registry();
    let shared = [
        ("authenticationToken", Value::NodeId(NodeId::new(0, 42))),
        ("requestHandle", Value::UInt32(7)),
    ];
    let base = registry.construct("RequestHeader", options(&shared)).unwrap();
    let mut derived_options = options(&shared);
    derived_options.insert("deleteSubscriptions".into(), Value::Boolean(true));
    let derived = registry
        .construct("CloseSessionRequest", derived_options)
        .unwrap();

    let mut base_stream = BinaryStream::new();
    registry.encode(&base, &mut base_stream).unwrap();
    let mut derived_stream = BinaryStream::new();
    registry.encode(&derived, &mut derived_stream).unwrap();

    assert!(derived_stream.as_bytes().starts_with(base_stream.as_bytes()));
    assert_eq!(
        derived_stream.as_bytes().len(),
        base_stream.as_bytes().len() + 1
    );

    let decoded = round_trip(&registry, &derived);
    assert_eq!(decoded, derived);
}

#[test]
fn absent_and_empty_arrays_are_distinct_on_the_wire() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("TransferResult")
                .with_id(836)
                .field(FieldSchema::basic("availableSequenceNumbers", "Counter").array()),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let absent = registry
        .construct(
            "TransferResult",
            options(&[("availableSequenceNumbers", Value::Null)]),
        )
        .unwrap();
    let mut stream = BinaryStream::new();
    registry.encode(&absent, &mut stream).unwrap();
    assert_eq!(stream.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFF]);
    let decoded = registry.decode("TransferResult", &mut stream).unwrap();
    assert_eq!(decoded.get("availableSequenceNumbers"), Some(&Value::Null));

    let empty = registry
        .construct(
            "TransferResult",
            options(&[("availableSequenceNumbers", Value::Array(Vec::new()))]),
        )
        .unwrap();
    let mut stream = BinaryStream::new();
    registry.encode(&empty, &mut stream).unwrap();
    assert_eq!(stream.as_bytes(), &[0, 0, 0, 0]);
    let decoded = registry.decode("TransferResult", &mut stream).unwrap();
    assert_eq!(
        decoded.get("availableSequenceNumbers"),
        Some(&Value::Array(Vec::new()))
    );

    let filled = registry
        .construct(
            "TransferResult",
            options(&[(
                "availableSequenceNumbers",
                Value::from(vec![5u32, 6, 7]),
            )]),
        )
        .unwrap();
    let decoded = round_trip(&registry, &filled);
    assert_eq!(decoded, filled);
}

#[test]
fn enum_representations_encode_identically() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_enumeration(EnumDescriptor::new(
            "MessageSecurityMode",
            vec![
                EnumMember::new("Invalid", 0),
                EnumMember::new("None", 1),
                EnumMember::new("Sign", 2),
                EnumMember::new("SignAndEncrypt", 3),
            ],
        ))
        .unwrap();
    schemas
        .register_schema(
            StructuredTypeSchema::new("EndpointDescription")
                .with_id(312)
                .field(FieldSchema::enumeration("securityMode", "MessageSecurityMode")),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let mut encodings = Vec::new();
    for supplied in [
        Value::String("Sign".into()),
        Value::Int32(2),
        Value::Enum(2, "Sign".into()),
    ] {
        let instance = registry
            .construct("EndpointDescription", options(&[("securityMode", supplied)]))
            .unwrap();
        assert_eq!(instance.get("securityMode"), Some(&Value::Enum(2, "Sign".into())));
        let mut stream = BinaryStream::new();
        registry.encode(&instance, &mut stream).unwrap();
        encodings.push(stream.into_bytes());
    }
    assert!(encodings.windows(2).all(|pair| pair[0] == pair[1]));

    assert!(matches!(
        registry.construct(
            "EndpointDescription",
            options(&[("securityMode", Value::String("Plaintext".into()))]),
        ),
        Err(Error::Coercion(_))
    ));
}

#[test]
fn field_order_determines_wire_bytes() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("SizeFirst")
                .with_id(21)
                .field(FieldSchema::basic("size", "UInt16"))
                .field(FieldSchema::basic("offset", "UInt32")),
        )
        .unwrap();
    schemas
        .register_schema(
            StructuredTypeSchema::new("OffsetFirst")
                .with_id(22)
                .field(FieldSchema::basic("offset", "UInt32"))
                .field(FieldSchema::basic("size", "UInt16")),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let values = [
        ("size", Value::UInt16(0x0102)),
        ("offset", Value::UInt32(0x0304_0506)),
    ];
    let mut first = BinaryStream::new();
    registry
        .encode(&registry.construct("SizeFirst", options(&values)).unwrap(), &mut first)
        .unwrap();
    let mut second = BinaryStream::new();
    registry
        .encode(&registry.construct("OffsetFirst", options(&values)).unwrap(), &mut second)
        .unwrap();
    assert_ne!(first.as_bytes(), second.as_bytes());
}

#[test]
fn golden_wire_layout() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("OpenChannel")
                .with_id(444)
                .field(FieldSchema::basic("isFinal", "Boolean"))
                .field(FieldSchema::basic("requestId", "UInt32"))
                .field(FieldSchema::basic("clientNonce", "ByteString")),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let instance = registry
        .construct(
            "OpenChannel",
            options(&[
                ("isFinal", Value::Boolean(true)),
                ("requestId", Value::UInt32(0x0102_0304)),
                ("clientNonce", Value::ByteString(vec![0xAA, 0xBB])),
            ]),
        )
        .unwrap();
    let mut stream = BinaryStream::new();
    registry.encode(&instance, &mut stream).unwrap();
    assert_eq!(
        stream.as_bytes(),
        &[1, 0x04, 0x03, 0x02, 0x01, 2, 0, 0, 0, 0xAA, 0xBB]
    );
}

#[test]
fn nested_complex_arrays_round_trip() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("WriteValue")
                .with_id(668)
                .field(FieldSchema::basic("nodeId", "NodeId"))
                .field(FieldSchema::basic("attributeId", "IntegerId")),
        )
        .unwrap();
    schemas
        .register_schema(
            StructuredTypeSchema::new("WriteRequest")
                .with_id(671)
                .field(FieldSchema::complex("nodesToWrite", "WriteValue").array()),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let request = registry
        .construct(
            "WriteRequest",
            options(&[(
                "nodesToWrite",
                Value::Array(vec![
                    Value::Map(options(&[
                        ("nodeId", Value::NodeId(NodeId::new(2, 300))),
                        ("attributeId", Value::UInt32(13)),
                    ])),
                    Value::Map(options(&[
                        ("nodeId", Value::NodeId(NodeId::new(0, 5))),
                        ("attributeId", Value::UInt32(1)),
                    ])),
                ]),
            )]),
        )
        .unwrap();

    let decoded = round_trip(&registry, &request);
    assert_eq!(decoded, request);
    let nodes = decoded.get("nodesToWrite").and_then(Value::as_array).unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(
        nodes[0].as_object().and_then(|o| o.get_as::<u32>("attributeId")),
        Some(13)
    );
}

#[test]
fn self_referential_type_round_trips() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("FolderNode")
                .with_id(99)
                .field(FieldSchema::basic("displayName", "String"))
                .field(FieldSchema::complex("children", "FolderNode").array()),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let tree = registry
        .construct(
            "FolderNode",
            options(&[
                ("displayName", Value::from("root")),
                (
                    "children",
                    Value::Array(vec![
                        Value::Map(options(&[("displayName", Value::from("left"))])),
                        Value::Map(options(&[
                            ("displayName", Value::from("right")),
                            (
                                "children",
                                Value::Array(vec![Value::Map(options(&[(
                                    "displayName",
                                    Value::from("leaf"),
                                )]))]),
                            ),
                        ])),
                    ]),
                ),
            ]),
        )
        .unwrap();

    let decoded = round_trip(&registry, &tree);
    assert_eq!(decoded, tree);
}

#[test]
fn decode_hook_without_debug_hook_is_rejected() {
    let schemas = SchemaRegistry::new();
    let result = schemas.register_schema(
        StructuredTypeSchema::new("Opaque")
            .with_id(17)
            .decode_hook(|_, _| Ok(())),
    );
    assert!(matches!(
        result,
        Err(SchemaError::DecodeWithoutDecodeDebug { .. })
    ));
}

#[test]
fn custom_codec_hooks_round_trip() {
    let schemas = SchemaRegistry::new();
    // Variable-length encoding handled entirely by the schema's own hooks.
    schemas
        .register_schema(
            StructuredTypeSchema::new("PackedCounter")
                .with_id(55)
                .field(FieldSchema::basic("count", "UInt32"))
                .encode_hook(|instance, stream| {
                    let count = instance.get_as::<u32>("count").unwrap_or(0);
                    stream.write_u8(count.min(255) as u8);
                    Ok(())
                })
                .decode_hook(|instance, stream| {
                    let count = u32::from(stream.read_u8()?);
                    instance.insert("count", count);
                    Ok(())
                })
                .decode_debug_hook(|instance, stream| {
                    let count = u32::from(stream.read_u8()?);
                    instance.insert("count", count);
                    Ok(())
                }),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let instance = registry
        .construct("PackedCounter", options(&[("count", Value::UInt32(9))]))
        .unwrap();
    let mut stream = BinaryStream::new();
    registry.encode(&instance, &mut stream).unwrap();
    assert_eq!(stream.as_bytes(), &[9]);
    let decoded = registry.decode("PackedCounter", &mut stream).unwrap();
    assert_eq!(decoded.get_as::<u32>("count"), Some(9));
}

#[test]
fn custom_field_decode_overrides_primitive_decode() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("LegacyStatus")
                .with_id(66)
                .field(
                    // On the wire the status is a single byte from an older
                    // revision; widen it while decoding.
                    FieldSchema::basic("status", "UInt32").with_decode(|stream| {
                        Ok(Value::UInt32(u32::from(stream.read_u8()?)))
                    }),
                )
                .encode_hook(|instance, stream| {
                    stream.write_u8(instance.get_as::<u32>("status").unwrap_or(0) as u8);
                    Ok(())
                }),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let instance = registry
        .construct("LegacyStatus", options(&[("status", Value::UInt32(3))]))
        .unwrap();
    let mut stream = BinaryStream::new();
    registry.encode(&instance, &mut stream).unwrap();
    assert_eq!(stream.as_bytes(), &[3]);
    let decoded = registry.decode("LegacyStatus", &mut stream).unwrap();
    assert_eq!(decoded.get_as::<u32>("status"), Some(3));
}

#[test]
fn decode_debug_matches_decode() {
    let registry = header_registry();
    let instance = registry
        .construct(
            "CloseSessionRequest",
            options(&[
                ("authenticationToken", Value::NodeId(NodeId::new(1, 900))),
                ("requestHandle", Value::UInt32(31)),
                ("deleteSubscriptions", Value::Boolean(false)),
            ]),
        )
        .unwrap();
    let mut stream = BinaryStream::new();
    registry.encode(&instance, &mut stream).unwrap();
    let bytes = stream.into_bytes();

    let plain = registry
        .decode("CloseSessionRequest", &mut BinaryStream::from_bytes(bytes.clone()))
        .unwrap();
    let debug = registry
        .decode_debug("CloseSessionRequest", &mut BinaryStream::from_bytes(bytes))
        .unwrap();
    assert_eq!(plain, debug);
}

#[test]
fn truncated_stream_fails_without_partial_instance() {
    let registry = header_registry();
    let instance = registry
        .construct(
            "CloseSessionRequest",
            options(&[
                ("authenticationToken", Value::NodeId(NodeId::new(1, 900))),
                ("requestHandle", Value::UInt32(31)),
                ("deleteSubscriptions", Value::Boolean(true)),
            ]),
        )
        .unwrap();
    let mut stream = BinaryStream::new();
    registry.encode(&instance, &mut stream).unwrap();
    let mut bytes = stream.into_bytes();
    bytes.truncate(bytes.len() - 2);

    let result = registry.decode("CloseSessionRequest", &mut BinaryStream::from_bytes(bytes));
    assert!(matches!(
        result,
        Err(Error::Decode(DecodeError::Truncated { .. }))
    ));
}

#[test]
fn runtime_allocated_ids_are_stable_and_dispatchable() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("DiagnosticBlob")
                .runtime_id()
                .field(FieldSchema::basic("payload", "ByteString")),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let def = registry.get_or_compile("DiagnosticBlob").unwrap();
    assert!(def.binary_id >= RUNTIME_ID_BASE);
    // Stable for the life of the registry.
    assert_eq!(registry.get_or_compile("DiagnosticBlob").unwrap().binary_id, def.binary_id);

    let instance = registry
        .construct(
            "DiagnosticBlob",
            options(&[("payload", Value::ByteString(vec![1, 2]))]),
        )
        .unwrap();
    let mut stream = BinaryStream::new();
    registry.encode(&instance, &mut stream).unwrap();
    let decoded = registry.decode_by_id(def.binary_id, &mut stream).unwrap();
    assert_eq!(decoded, instance);
}

#[test]
fn id_table_lookup_feeds_decode_by_id() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("ServiceFault")
                .field(FieldSchema::basic("resultCode", "UInt32")),
        )
        .unwrap();
    let mut table = IdTable::new();
    table.insert("ServiceFault_Encoding_DefaultBinary", 397);
    table.insert("ServiceFault_Encoding_DefaultXml", 396);
    let registry = TypeRegistry::new(schemas, table);

    let def = registry.get_or_compile("ServiceFault").unwrap();
    assert_eq!(def.binary_id, 397);
    assert_eq!(def.xml_id, Some(396));

    let mut stream = BinaryStream::new();
    stream.write_u32(0x8001_0000);
    let decoded = registry.decode_by_id(397, &mut stream).unwrap();
    assert_eq!(decoded.get_as::<u32>("resultCode"), Some(0x8001_0000));
}

#[test]
fn generated_defaults_run_per_construction() {
    let schemas = SchemaRegistry::new();
    schemas
        .register_schema(
            StructuredTypeSchema::new("Stamped")
                .with_id(81)
                .field(
                    FieldSchema::basic("token", "Guid")
                        .with_default_fn(|| Value::Guid(uuid::Uuid::new_v4())),
                ),
        )
        .unwrap();
    let registry = TypeRegistry::new(schemas, IdTable::new());

    let first = registry.construct("Stamped", ValueMap::new()).unwrap();
    let second = registry.construct("Stamped", ValueMap::new()).unwrap();
    assert_ne!(first.get("token"), second.get("token"));
}
